//! Per-session UI state: the entry form, the pending delete, and the selected
//! summary view.

use chrono::NaiveDate;

use crate::core::confirmation::DeleteConfirmationFlow;
use crate::core::services::{AggregateKind, AppendOutcome, LedgerService};
use crate::domain::{default_amount_for, Category, EntryDraft, Stage};
use crate::errors::LedgerError;

/// Sidebar form values between saves.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    concept: String,
    category: Category,
    custom_label: String,
    stage: Option<Stage>,
    amount_text: String,
    expense_date: NaiveDate,
    labor_default: f64,
}

impl EntryForm {
    /// A blank form with LABOR preselected, so the amount starts pre-seeded.
    pub fn new(today: NaiveDate, labor_default: f64) -> Self {
        let mut form = Self {
            concept: String::new(),
            category: Category::Labor,
            custom_label: String::new(),
            stage: None,
            amount_text: String::new(),
            expense_date: today,
            labor_default,
        };
        form.select_category(Category::Labor);
        form
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn expense_date(&self) -> NaiveDate {
        self.expense_date
    }

    pub fn set_concept(&mut self, concept: impl Into<String>) {
        self.concept = concept.into();
    }

    /// Switches category and re-seeds the amount: the LABOR default, or blank.
    pub fn select_category(&mut self, category: Category) {
        self.amount_text = default_amount_for(&category, self.labor_default)
            .map(|amount| amount.to_string())
            .unwrap_or_default();
        self.category = category;
    }

    pub fn set_custom_label(&mut self, label: impl Into<String>) {
        self.custom_label = label.into();
    }

    pub fn select_stage(&mut self, stage: Option<Stage>) {
        self.stage = stage;
    }

    pub fn set_amount_text(&mut self, amount: impl Into<String>) {
        self.amount_text = amount.into();
    }

    pub fn set_expense_date(&mut self, date: NaiveDate) {
        self.expense_date = date;
    }

    pub fn draft(&self) -> EntryDraft {
        let mut draft = EntryDraft::new(
            self.concept.clone(),
            self.category.clone(),
            self.amount_text.clone(),
            self.expense_date,
        );
        if !self.custom_label.trim().is_empty() {
            draft = draft.with_label(self.custom_label.clone());
        }
        draft.stage = self.stage;
        draft
    }

    /// Clears the form for the next entry.
    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::new(today, self.labor_default);
    }
}

/// Everything one operator session holds between interactions.
#[derive(Debug, Clone)]
pub struct Session {
    pub form: EntryForm,
    pub delete_flow: DeleteConfirmationFlow,
    pub view: AggregateKind,
}

impl Session {
    pub fn new(today: NaiveDate, labor_default: f64) -> Self {
        Self {
            form: EntryForm::new(today, labor_default),
            delete_flow: DeleteConfirmationFlow::new(),
            view: AggregateKind::default(),
        }
    }

    /// Saves the form through `service`; the form is cleared only when a row
    /// was actually written.
    pub fn submit(&mut self, service: &mut LedgerService) -> Result<AppendOutcome, LedgerError> {
        let outcome = service.append(&self.form.draft())?;
        if outcome.is_appended() {
            let today = service.clock().today();
            self.form.reset(today);
        }
        Ok(outcome)
    }
}
