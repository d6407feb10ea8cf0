//! Shell command handlers.

use chrono::NaiveDate;

use crate::cli::core::{closest, CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::cli::{io as cli_io, output, render};
use crate::core::services::{AggregateKind, AppendOutcome, StageFilter, SummaryService};
use crate::currency::format_currency;
use crate::domain::record::{amount_of, COL_AMOUNT, COL_CONCEPT, EXPENSE_DATE_FORMAT};
use crate::domain::{Category, Stage};
use crate::utils::build_info;

const EMPTY_LEDGER: &str = "No expenses recorded yet.";

pub fn register_all(registry: &mut CommandRegistry) {
    let entries = [
        CommandEntry::new(
            "add",
            "Record an expense",
            "add <concept> <category> [amount] [--date DD/MM/YYYY] [--label TEXT] [--stage STAGE]",
            cmd_add,
        ),
        CommandEntry::new("form", "Fill in an expense interactively", "form", cmd_form),
        CommandEntry::new("list", "Show the expense history, newest first", "list", cmd_list)
            .with_aliases(&["ls", "history"]),
        CommandEntry::new(
            "summary",
            "Show totals",
            "summary [total|week|month|category|stage [STAGE|all]]",
            cmd_summary,
        ),
        CommandEntry::new("delete", "Ask to delete a row by index", "delete <index>", cmd_delete)
            .with_aliases(&["rm"]),
        CommandEntry::new("undo", "Ask to delete the newest row", "undo", cmd_undo),
        CommandEntry::new("confirm", "Carry out the pending delete", "confirm", cmd_confirm)
            .holding_snapshot(),
        CommandEntry::new("cancel", "Drop the pending delete", "cancel", cmd_cancel)
            .holding_snapshot(),
        CommandEntry::new("refresh", "Reload the ledger from the store", "refresh", cmd_refresh),
        CommandEntry::new("help", "List commands", "help [command]", cmd_help),
        CommandEntry::new("version", "Show build information", "version", cmd_version),
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    ];
    for entry in entries {
        registry.register(entry);
    }
}

#[derive(Debug, Default, PartialEq)]
struct AddArgs {
    positionals: Vec<String>,
    date: Option<NaiveDate>,
    label: Option<String>,
    stage: Option<Stage>,
}

fn parse_add_args(args: &[&str]) -> Result<AddArgs, CommandError> {
    let mut parsed = AddArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            parsed.positionals.push(arg.to_string());
            continue;
        };
        let value = iter.next().ok_or_else(|| {
            CommandError::InvalidArguments(format!("`--{flag}` needs a value"))
        })?;
        match flag {
            "date" => parsed.date = Some(parse_date(value)?),
            "label" => parsed.label = Some(value.to_string()),
            "stage" => parsed.stage = Some(parse_stage(value)?),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{other}`"
                )))
            }
        }
    }
    if !(2..=3).contains(&parsed.positionals.len()) {
        return Err(CommandError::InvalidArguments(
            concat!(
                "usage: add <concept> <category> [amount] ",
                "[--date DD/MM/YYYY] [--label TEXT] [--stage STAGE]"
            )
            .into(),
        ));
    }
    Ok(parsed)
}

fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), EXPENSE_DATE_FORMAT).map_err(|_| {
        CommandError::InvalidArguments(format!("`{value}` is not a DD/MM/YYYY date"))
    })
}

fn parse_category(value: &str) -> Result<Category, CommandError> {
    Category::parse_choice(value).ok_or_else(|| {
        let mut message = format!("unknown category `{value}`");
        if let Some(best) = closest(value, Category::CHOICES.iter().map(Category::label)) {
            message.push_str(&format!(" (did you mean `{best}`?)"));
        }
        CommandError::InvalidArguments(message)
    })
}

fn parse_stage(value: &str) -> Result<Stage, CommandError> {
    Stage::parse(value).ok_or_else(|| {
        let mut message = format!("unknown stage `{value}`");
        if let Some(best) = closest(value, Stage::ALL.iter().map(|stage| stage.label())) {
            message.push_str(&format!(" (did you mean `{best}`?)"));
        }
        CommandError::InvalidArguments(message)
    })
}

fn cmd_add(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_add_args(args)?;
    let category = parse_category(&parsed.positionals[1])?;
    let today = ctx.service.clock().today();

    let form = &mut ctx.session.form;
    form.set_concept(parsed.positionals[0].clone());
    form.select_category(category);
    if let Some(amount) = parsed.positionals.get(2) {
        form.set_amount_text(amount.clone());
    }
    form.set_custom_label(parsed.label.unwrap_or_default());
    form.select_stage(parsed.stage);
    form.set_expense_date(parsed.date.unwrap_or(today));

    submit_form(ctx)
}

fn submit_form(ctx: &mut ShellContext) -> CommandResult {
    let concept = ctx.session.form.concept().to_string();
    match ctx.session.submit(&mut ctx.service)? {
        AppendOutcome::Appended(table) => {
            let amount = table
                .len()
                .checked_sub(1)
                .and_then(|last| table.cell(last, COL_AMOUNT))
                .map(amount_of)
                .unwrap_or_default();
            output::success(format!(
                "Saved `{concept}` ({}).",
                format_currency(amount, &ctx.config.currency_symbol)
            ));
        }
        // Invalid entries are dropped without a message.
        AppendOutcome::Rejected(_) => {}
    }
    Ok(())
}

fn cmd_form(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if ctx.mode == CliMode::Script {
        return Err(CommandError::Message(
            "`form` is interactive; use `add` in scripts.".into(),
        ));
    }
    let theme = &ctx.theme;
    let form = &mut ctx.session.form;

    let concept = cli_io::prompt_text(theme, "Concept", form.concept())?;
    form.set_concept(concept);

    let choices: Vec<String> = Category::CHOICES.iter().map(|c| c.label().to_string()).collect();
    let current = Category::CHOICES
        .iter()
        .position(|choice| choice == form.category())
        .unwrap_or(0);
    let picked = cli_io::prompt_select(theme, "Category", &choices, current)?;
    let category = Category::CHOICES[picked].clone();
    let is_other = category == Category::Other;
    form.select_category(category);
    if is_other {
        let label = cli_io::prompt_text(theme, "Custom category (blank for OTHER)", "")?;
        form.set_custom_label(label);
    } else {
        form.set_custom_label("");
    }

    if ctx.config.track_stages {
        let stages: Vec<String> = Stage::ALL.iter().map(|s| s.label().to_string()).collect();
        let current = form
            .stage()
            .and_then(|stage| Stage::ALL.iter().position(|s| *s == stage))
            .unwrap_or(0);
        let picked = cli_io::prompt_select(theme, "Stage", &stages, current)?;
        form.select_stage(Some(Stage::ALL[picked]));
    }

    let amount = cli_io::prompt_text(theme, "Amount", form.amount_text())?;
    form.set_amount_text(amount);

    let initial = form.expense_date().format(EXPENSE_DATE_FORMAT).to_string();
    let date = cli_io::prompt_text(theme, "Expense date (DD/MM/YYYY)", &initial)?;
    form.set_expense_date(parse_date(&date)?);

    submit_form(ctx)
}

/// Prints the empty-ledger notice, or a warning when the store could not be
/// read at all. Returns true when there is nothing to show.
fn nothing_to_show(rows: usize, degraded: bool) -> bool {
    if degraded {
        output::warning("Ledger store unreachable; try `refresh` later.");
    } else if rows == 0 {
        output::info(EMPTY_LEDGER);
    }
    degraded || rows == 0
}

fn cmd_list(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let track_stages = ctx.service.tracks_stages();
    let (table, degraded) = ctx.service.snapshot_status();
    if nothing_to_show(table.len(), degraded) {
        return Ok(());
    }
    output::section("History");
    output::lines(&render::history_lines(
        table,
        track_stages,
        &ctx.config.currency_symbol,
    ));
    Ok(())
}

fn parse_view(args: &[&str], current: AggregateKind) -> Result<AggregateKind, CommandError> {
    let Some(first) = args.first() else {
        return Ok(current);
    };
    let kind = match first.to_ascii_lowercase().as_str() {
        "total" => AggregateKind::Total,
        "week" => AggregateKind::Week,
        "month" => AggregateKind::Month,
        "category" => AggregateKind::ByCategory,
        "stage" => {
            let filter = match args.get(1) {
                None => StageFilter::All,
                Some(value) => StageFilter::parse(value).ok_or_else(|| {
                    CommandError::InvalidArguments(format!("unknown stage `{value}`"))
                })?,
            };
            AggregateKind::ByStage(filter)
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown summary `{other}`; expected total, week, month, category or stage"
            )))
        }
    };
    Ok(kind)
}

fn cmd_summary(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_view(args, ctx.session.view)?;
    ctx.session.view = kind;

    let today = ctx.service.clock().today();
    let (table, degraded) = ctx.service.snapshot_status();
    if nothing_to_show(table.len(), degraded) {
        return Ok(());
    }
    let aggregate = SummaryService::aggregate(kind, table, today)?;
    output::section("Summary");
    output::lines(&render::aggregate_lines(
        kind,
        &aggregate,
        today,
        &ctx.config.currency_symbol,
    ));
    Ok(())
}

fn cmd_delete(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [raw] = args else {
        return Err(CommandError::InvalidArguments("usage: delete <index>".into()));
    };
    let index: usize = raw
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a row index")))?;
    let table = ctx.service.snapshot();
    if index >= table.len() {
        return Err(CommandError::InvalidArguments(format!(
            "no row {index}; the ledger has {} rows",
            table.len()
        )));
    }
    let description = describe_row(ctx, index);
    ctx.session.delete_flow.request_delete(index);
    ask_confirmation(ctx, &description)
}

fn cmd_undo(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let len = ctx.service.snapshot().len();
    if len == 0 {
        output::info(EMPTY_LEDGER);
        return Ok(());
    }
    // Pin the row that was just described.
    let index = len - 1;
    let description = describe_row(ctx, index);
    ctx.session.delete_flow.request_delete(index);
    ask_confirmation(ctx, &description)
}

fn describe_row(ctx: &mut ShellContext, index: usize) -> String {
    let symbol = ctx.config.currency_symbol.clone();
    let table = ctx.service.snapshot();
    let concept = table
        .cell(index, COL_CONCEPT)
        .map(|cell| cell.to_text())
        .unwrap_or_default();
    let amount = table.cell(index, COL_AMOUNT).map(amount_of).unwrap_or_default();
    format!("row {index} `{concept}` ({})", format_currency(amount, &symbol))
}

fn ask_confirmation(ctx: &mut ShellContext, description: &str) -> CommandResult {
    if ctx.mode == CliMode::Script {
        output::warning(format!(
            "Delete {description}? Type `confirm` (or `y`) to delete, `cancel` (or `n`) to keep it."
        ));
        return Ok(());
    }
    let prompt = format!("Delete {description}?");
    if cli_io::confirm_action(&ctx.theme, &prompt, false)? {
        cmd_confirm(ctx, &[])
    } else {
        cmd_cancel(ctx, &[])
    }
}

fn cmd_confirm(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let index = ctx.session.delete_flow.pending();
    match (index, ctx.session.delete_flow.confirm(&mut ctx.service)?) {
        (Some(index), Some(table)) => output::success(format!(
            "Deleted row {index}; {} rows remain.",
            table.len()
        )),
        _ => output::info("Nothing to confirm."),
    }
    Ok(())
}

fn cmd_cancel(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match ctx.session.delete_flow.cancel() {
        Some(_) => output::info("Delete cancelled."),
        None => output::info("Nothing to cancel."),
    }
    Ok(())
}

fn cmd_refresh(ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let rows = ctx.service.refresh().len();
    output::info(format!("Reloaded {rows} rows."));
    Ok(())
}

fn cmd_help(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = ctx.registry.resolve(&name.to_ascii_lowercase()).ok_or_else(|| {
            CommandError::InvalidArguments(format!("no command named `{name}`"))
        })?;
        output::info(format!("{} - {}", entry.usage, entry.description));
        return Ok(());
    }
    output::section("Commands");
    let entries = ctx.registry.list();
    let width = entries.iter().map(|entry| entry.name.len()).max().unwrap_or(0);
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut line = format!("  {:width$}  {}", entry.name, entry.description);
            if !entry.aliases.is_empty() {
                line.push_str(&format!(" (also `{}`)", entry.aliases.join("`, `")));
            }
            line
        })
        .collect();
    output::lines(&lines);
    Ok(())
}

fn cmd_version(_ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_exit(_ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::cli::core::LoopControl;
    use crate::config::Config;
    use crate::core::{DeleteState, FixedClock};
    use crate::domain::record::{ExpenseRecord, COL_CATEGORY};
    use crate::storage::{MemoryTableStore, RemoteTableStore};

    fn context_with(config: Config) -> (ShellContext, Arc<MemoryTableStore>) {
        let store = Arc::new(MemoryTableStore::default());
        let now = NaiveDate::from_ymd_opt(2024, 3, 13)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        let ctx = ShellContext::with_parts(
            CliMode::Script,
            config,
            Box::new(store.clone()),
            Box::new(FixedClock(now)),
        );
        (ctx, store)
    }

    fn context() -> (ShellContext, Arc<MemoryTableStore>) {
        context_with(Config {
            read_backoff_ms: 0,
            ..Config::default()
        })
    }

    fn run(ctx: &mut ShellContext, line: &str) {
        if let Err(err) = ctx.execute_line(line) {
            panic!("`{line}` failed: {err}");
        }
    }

    #[test]
    fn add_writes_a_row_with_today_as_default_date() {
        let (mut ctx, store) = context();
        run(&mut ctx, r#"add "Bolsas de cemento" materials 1,250"#);

        let table = store.contents();
        let record = ExpenseRecord::from_row(&table, 0).unwrap();
        assert_eq!(record.concept, "Bolsas de cemento");
        assert_eq!(record.category, Category::Materials);
        assert_eq!(record.amount, 1250.0);
        assert_eq!(record.expense_date, NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
    }

    #[test]
    fn add_labor_without_amount_uses_the_default() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Albañil labor --date 11/03/2024");
        assert_eq!(store.contents().cell(0, COL_AMOUNT).map(amount_of), Some(400.0));
    }

    #[test]
    fn add_other_with_label_stores_the_label() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Grúa other 900 --label Maquinaria");
        assert_eq!(
            store.contents().cell(0, COL_CATEGORY).map(|c| c.to_text()),
            Some("Maquinaria".to_string())
        );
    }

    #[test]
    fn invalid_entries_are_dropped_silently() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Arena materials");
        run(&mut ctx, "add Arena materials 0");
        run(&mut ctx, r#"add "" materials 50"#);
        assert_eq!(store.replace_count(), 0);
    }

    #[test]
    fn bad_arguments_are_reported() {
        let (mut ctx, _store) = context();
        for line in [
            "add Arena",
            "add Arena gravel 10",
            "add Arena materials 10 --date 2024-03-01",
            "add Arena materials 10 --stage roof",
            "delete x",
            "delete 0",
            "summary yearly",
        ] {
            assert!(
                matches!(ctx.execute_line(line), Err(CommandError::InvalidArguments(_))),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "add Varilla materials 20");

        run(&mut ctx, "delete 0");
        assert_eq!(
            ctx.session().delete_flow.state(),
            DeleteState::PendingConfirmation { index: 0 }
        );
        assert_eq!(store.contents().len(), 2);

        run(&mut ctx, "cancel");
        assert_eq!(store.contents().len(), 2);

        run(&mut ctx, "delete 0");
        run(&mut ctx, "confirm");
        let table = store.contents();
        assert_eq!(table.len(), 1);
        assert_eq!(ExpenseRecord::from_row(&table, 0).unwrap().concept, "Varilla");
    }

    #[test]
    fn undo_removes_the_newest_row_after_confirm() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "add Varilla materials 20");
        run(&mut ctx, "undo");
        run(&mut ctx, "confirm");

        let table = store.contents();
        assert_eq!(table.len(), 1);
        assert_eq!(ExpenseRecord::from_row(&table, 0).unwrap().concept, "Block");
    }

    #[test]
    fn summary_selection_is_remembered() {
        let (mut ctx, _store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "summary stage finishes");
        assert_eq!(
            ctx.session().view,
            AggregateKind::ByStage(StageFilter::Only(Stage::Finishes))
        );
        run(&mut ctx, "summary");
        assert_eq!(
            ctx.session().view,
            AggregateKind::ByStage(StageFilter::Only(Stage::Finishes))
        );
        run(&mut ctx, "summary category");
        assert_eq!(ctx.session().view, AggregateKind::ByCategory);
    }

    #[test]
    fn stage_is_written_when_tracking() {
        let (mut ctx, store) = context_with(Config {
            track_stages: true,
            read_backoff_ms: 0,
            ..Config::default()
        });
        run(&mut ctx, "add Zapatas materials 500 --stage foundation");
        let record = ExpenseRecord::from_row(&store.contents(), 0).unwrap();
        assert_eq!(record.stage, Some(Stage::Foundation));
    }

    #[test]
    fn form_is_refused_in_script_mode() {
        let (mut ctx, _store) = context();
        assert!(matches!(ctx.execute_line("form"), Err(CommandError::Message(_))));
    }

    #[test]
    fn exit_stops_the_loop() {
        let (mut ctx, _store) = context();
        assert!(matches!(ctx.execute_line("exit"), Ok(LoopControl::Exit)));
        assert!(matches!(ctx.execute_line("lst"), Ok(LoopControl::Continue)));
        assert!(!ctx.running);
    }

    fn concepts(store: &MemoryTableStore) -> Vec<String> {
        ExpenseRecord::from_table(&store.contents())
            .unwrap()
            .into_iter()
            .map(|record| record.concept)
            .collect()
    }

    #[test]
    fn undo_keeps_the_described_row_when_a_row_is_added_before_confirm() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "add Varilla materials 20");

        run(&mut ctx, "undo");
        run(&mut ctx, "add Cal materials 30");
        run(&mut ctx, "confirm");

        assert_eq!(concepts(&store), ["Block", "Cal"]);
    }

    #[test]
    fn yes_and_no_answer_a_pending_delete() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "add Varilla materials 20");

        run(&mut ctx, "rm 0");
        assert_eq!(ctx.prompt(), "ledger (delete row 0? y/n)> ");
        run(&mut ctx, "n");
        assert!(!ctx.session().delete_flow.is_pending());
        assert_eq!(store.contents().len(), 2);

        run(&mut ctx, "rm 0");
        run(&mut ctx, "Y");
        assert_eq!(concepts(&store), ["Varilla"]);

        // Without a pending delete a bare answer is just an unknown word.
        run(&mut ctx, "y");
        assert_eq!(concepts(&store), ["Varilla"]);
    }

    #[test]
    fn a_failed_read_does_not_outlive_its_command() {
        let (mut ctx, store) = context();
        for concept in ["Block", "Varilla", "Cal"] {
            run(&mut ctx, &format!("add {concept} materials 10"));
        }

        store.fail_next_reads(3);
        run(&mut ctx, "list");
        run(&mut ctx, "add Arena materials 40");

        assert_eq!(concepts(&store), ["Block", "Varilla", "Cal", "Arena"]);
    }

    #[test]
    fn each_command_sees_rows_written_elsewhere() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "list");

        let mut outside = store.contents();
        outside.push_record(
            ExpenseRecord {
                registered_at: None,
                concept: "Grava".into(),
                category: Category::Materials,
                stage: None,
                amount: 15.0,
                expense_date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            }
            .to_cells(false),
        );
        store.replace(&outside).unwrap();

        run(&mut ctx, "add Cal materials 30");
        assert_eq!(concepts(&store), ["Block", "Grava", "Cal"]);
    }

    #[test]
    fn confirm_acts_on_the_snapshot_the_index_came_from() {
        let (mut ctx, store) = context();
        run(&mut ctx, "add Block materials 10");
        run(&mut ctx, "add Varilla materials 20");
        run(&mut ctx, "delete 1");
        let reads = store.read_count();

        run(&mut ctx, "confirm");
        assert_eq!(store.read_count(), reads);
        assert_eq!(concepts(&store), ["Block"]);
    }
}
