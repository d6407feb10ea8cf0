//! Draft entries and the validation gate in front of `append`.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::record::{Category, ExpenseRecord, Stage};

/// Parses a free-text amount. Thousands separators are ignored and anything
/// unparsable yields `0.0`, which the positivity gate then rejects.
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Resolves the stored category for a form choice.
pub fn resolve_category(choice: &Category, custom_label: Option<&str>) -> Category {
    match (choice, custom_label.map(str::trim)) {
        (Category::Other, Some(label)) if !label.is_empty() => Category::Custom(label.to_string()),
        (choice, _) => choice.clone(),
    }
}

/// Amount the form pre-fills when `category` is picked.
pub fn default_amount_for(category: &Category, labor_default: f64) -> Option<f64> {
    match category {
        Category::Labor => Some(labor_default),
        _ => None,
    }
}

/// Why a draft was refused. Never shown to the user; the save just does not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("concept is empty")]
    EmptyConcept,
    #[error("amount is not a positive number")]
    NonPositiveAmount,
}

/// Raw form values as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub concept: String,
    pub category: Category,
    pub custom_label: Option<String>,
    pub stage: Option<Stage>,
    pub amount_text: String,
    pub expense_date: NaiveDate,
}

impl EntryDraft {
    pub fn new(
        concept: impl Into<String>,
        category: Category,
        amount_text: impl Into<String>,
        expense_date: NaiveDate,
    ) -> Self {
        Self {
            concept: concept.into(),
            category,
            custom_label: None,
            stage: None,
            amount_text: amount_text.into(),
            expense_date,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.custom_label = Some(label.into());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn validate(&self) -> Result<ValidEntry, Rejection> {
        if self.concept.trim().is_empty() {
            return Err(Rejection::EmptyConcept);
        }
        let amount = parse_amount(&self.amount_text);
        if amount <= 0.0 {
            return Err(Rejection::NonPositiveAmount);
        }
        Ok(ValidEntry {
            concept: self.concept.clone(),
            category: resolve_category(&self.category, self.custom_label.as_deref()),
            stage: self.stage,
            amount,
            expense_date: self.expense_date,
        })
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    concept: String,
    category: Category,
    stage: Option<Stage>,
    amount: f64,
    expense_date: NaiveDate,
}

impl ValidEntry {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn into_record(self, registered_at: NaiveDateTime) -> ExpenseRecord {
        ExpenseRecord {
            registered_at: Some(registered_at),
            concept: self.concept,
            category: self.category,
            stage: self.stage,
            amount: self.amount,
            expense_date: self.expense_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[test]
    fn parse_amount_strips_thousands_separators() {
        assert_eq!(parse_amount("1,250"), 1250.0);
        assert_eq!(parse_amount(" 12,345.67 "), 12345.67);
    }

    #[test]
    fn parse_amount_fails_closed_to_zero() {
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn other_with_label_uses_the_label() {
        assert_eq!(
            resolve_category(&Category::Other, Some(" Herrería ")),
            Category::Custom("Herrería".into())
        );
        assert_eq!(resolve_category(&Category::Other, Some("  ")), Category::Other);
        assert_eq!(resolve_category(&Category::Other, None).label(), "OTHER");
    }

    #[test]
    fn label_is_ignored_outside_other() {
        assert_eq!(
            resolve_category(&Category::Freight, Some("Grúa")),
            Category::Freight
        );
    }

    #[test]
    fn only_labor_has_a_default_amount() {
        assert_eq!(default_amount_for(&Category::Labor, 400.0), Some(400.0));
        assert_eq!(default_amount_for(&Category::Materials, 400.0), None);
    }

    #[test]
    fn validate_rejects_empty_concept_and_non_positive_amounts() {
        let blank = EntryDraft::new("   ", Category::Materials, "100", date());
        assert_eq!(blank.validate(), Err(Rejection::EmptyConcept));

        for amount in ["0", "-5", "abc", ""] {
            let draft = EntryDraft::new("Arena", Category::Materials, amount, date());
            assert_eq!(draft.validate(), Err(Rejection::NonPositiveAmount), "{amount}");
        }
    }

    #[test]
    fn validate_resolves_category_and_amount() {
        let draft = EntryDraft::new("Grúa", Category::Other, "2,000", date())
            .with_label("Maquinaria")
            .with_stage(Stage::Structure);
        let entry = draft.validate().expect("valid");
        assert_eq!(entry.amount(), 2000.0);
        assert_eq!(entry.category(), &Category::Custom("Maquinaria".into()));

        let at = date().and_hms_opt(8, 0, 0).unwrap();
        let record = entry.into_record(at);
        assert_eq!(record.registered_at, Some(at));
        assert_eq!(record.stage, Some(Stage::Structure));
    }
}
