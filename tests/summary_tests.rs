mod common;

use std::collections::BTreeMap;

use common::{at, service_over, setup_json_store};
use site_ledger::{
    core::services::{Aggregate, AggregateKind, StageFilter, SummaryService},
    domain::{Category, EntryDraft, Stage},
    errors::LedgerError,
    storage::{Cell, Table},
};

fn ledger() -> Table {
    let store = setup_json_store();
    let mut service = service_over(store).with_stage_tracking(true);
    let rows = [
        ("Zapatas", Category::Materials, "1,000", at(10, 3, 2024), Stage::Foundation),
        ("Albañil", Category::Labor, "400", at(11, 3, 2024), Stage::Structure),
        ("Pintura", Category::Materials, "250", at(13, 3, 2024), Stage::Finishes),
        ("Permiso", Category::Permits, "75", at(15, 3, 2022), Stage::Foundation),
    ];
    for (concept, category, amount, date, stage) in rows {
        let draft = EntryDraft::new(concept, category, amount, date).with_stage(stage);
        assert!(service.append(&draft).unwrap().is_appended());
    }
    service.refresh().clone()
}

fn amount(kind: AggregateKind, table: &Table) -> f64 {
    SummaryService::aggregate(kind, table, at(13, 3, 2024))
        .unwrap()
        .amount()
        .expect("single amount")
}

#[test]
fn every_view_over_a_persisted_ledger() {
    let table = ledger();

    assert_eq!(amount(AggregateKind::Total, &table), 1725.0);
    // Monday 11/03 through Wednesday 13/03; Sunday 10/03 is last week.
    assert_eq!(amount(AggregateKind::Week, &table), 650.0);
    // March of any year.
    assert_eq!(amount(AggregateKind::Month, &table), 1725.0);
    assert_eq!(
        amount(AggregateKind::ByStage(StageFilter::Only(Stage::Foundation)), &table),
        1075.0
    );
    assert_eq!(amount(AggregateKind::ByStage(StageFilter::All), &table), 1725.0);

    let breakdown = SummaryService::aggregate(AggregateKind::ByCategory, &table, at(13, 3, 2024))
        .unwrap();
    assert_eq!(
        breakdown,
        Aggregate::Breakdown(BTreeMap::from([
            ("LABOR".to_string(), 400.0),
            ("MATERIALS".to_string(), 1250.0),
            ("PERMITS".to_string(), 75.0),
        ]))
    );
}

#[test]
fn one_bad_date_fails_the_whole_summary() {
    let mut table = ledger();
    table.push_record([
        ("CONCEPTO", Cell::text("Importado")),
        ("MONTO", Cell::Number(5.0)),
        ("FECHA_GASTO", Cell::text("2024-03-12")),
    ]);

    let err = SummaryService::aggregate(AggregateKind::Total, &table, at(13, 3, 2024)).unwrap_err();
    assert!(matches!(err, LedgerError::DateParse { row: 4, .. }));
}

#[test]
fn empty_ledger_sums_to_zero() {
    let table = Table::empty();
    assert_eq!(amount(AggregateKind::Week, &table), 0.0);
    assert_eq!(
        SummaryService::aggregate(AggregateKind::ByCategory, &table, at(13, 3, 2024)).unwrap(),
        Aggregate::Breakdown(BTreeMap::new())
    );
}
