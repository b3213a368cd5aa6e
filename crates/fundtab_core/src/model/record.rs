//! Financial record domain model.
//!
//! # Responsibility
//! - Define the canonical ledger record shared by storage and replication.
//! - Validate caller-supplied drafts before any durable write.
//!
//! # Invariants
//! - `id` is assigned exactly once at creation time and never reassigned.
//! - `amount` is finite and >= 0 for every persisted record.
//! - `kind` and `state` are closed enumerations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one ledger record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = Uuid;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// Direction of a ledger record relative to the shared fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Money paid into the fund.
    Credit,
    /// Money paid out of the fund.
    Debit,
}

/// Settlement state of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Amount has been collected or paid.
    Settled,
    /// Recorded but not yet collected or paid.
    Pending,
}

/// Canonical persisted ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable global ID used for replication and deletion.
    pub id: RecordId,
    pub kind: RecordKind,
    /// Currency-agnostic non-negative amount.
    pub amount: f64,
    /// Free-form category label.
    pub category: String,
    /// Free-form note, may be empty.
    pub note: String,
    /// Name of the identity this record is attributed to.
    pub counterpart: String,
    /// Calendar date in `YYYY-MM-DD` form.
    pub occurred_on: String,
    pub state: RecordState,
}

/// Record input before an ID has been assigned.
///
/// The ledger service turns a validated draft into a [`Record`] by assigning
/// a fresh [`RecordId`]; drafts are never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub kind: RecordKind,
    pub amount: f64,
    pub category: String,
    pub note: String,
    pub counterpart: String,
    pub occurred_on: String,
    pub state: RecordState,
}

/// Validation failure for caller-supplied record input.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    /// Amount is negative, NaN or infinite.
    InvalidAmount(f64),
    /// `occurred_on` is not a `YYYY-MM-DD` date.
    InvalidDate(String),
    /// `category` is empty or whitespace-only.
    EmptyCategory,
    /// `counterpart` is empty or whitespace-only.
    EmptyCounterpart,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount(value) => {
                write!(f, "amount must be finite and >= 0, got {value}")
            }
            Self::InvalidDate(value) => {
                write!(f, "occurred_on must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::EmptyCategory => write!(f, "category must not be empty"),
            Self::EmptyCounterpart => write!(f, "counterpart must not be empty"),
        }
    }
}

impl Error for RecordValidationError {}

impl RecordDraft {
    /// Checks draft invariants before ID assignment and persistence.
    ///
    /// # Contract
    /// - `amount` must be finite and >= 0.
    /// - `occurred_on` must match `YYYY-MM-DD`.
    /// - `category` and `counterpart` must contain non-whitespace text.
    /// - `note` may be empty.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(RecordValidationError::InvalidAmount(self.amount));
        }
        if !ISO_DATE.is_match(self.occurred_on.as_str()) {
            return Err(RecordValidationError::InvalidDate(self.occurred_on.clone()));
        }
        if self.category.trim().is_empty() {
            return Err(RecordValidationError::EmptyCategory);
        }
        if self.counterpart.trim().is_empty() {
            return Err(RecordValidationError::EmptyCounterpart);
        }
        Ok(())
    }

    /// Consumes the draft into a record with a freshly assigned ID.
    ///
    /// Callers must run [`RecordDraft::validate`] first; this constructor
    /// performs no checks of its own.
    pub fn into_record(self) -> Record {
        Record {
            id: Uuid::new_v4(),
            kind: self.kind,
            amount: self.amount,
            category: self.category,
            note: self.note,
            counterpart: self.counterpart,
            occurred_on: self.occurred_on,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordDraft, RecordKind, RecordState, RecordValidationError};

    fn draft() -> RecordDraft {
        RecordDraft {
            kind: RecordKind::Credit,
            amount: 25.0,
            category: "Late arrival".to_string(),
            note: String::new(),
            counterpart: "alice".to_string(),
            occurred_on: "2024-06-01".to_string(),
            state: RecordState::Settled,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(draft().validate(), Ok(()));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut input = draft();
        input.amount = -1.0;
        assert_eq!(
            input.validate(),
            Err(RecordValidationError::InvalidAmount(-1.0))
        );
    }

    #[test]
    fn non_finite_amount_is_rejected() {
        let mut input = draft();
        input.amount = f64::NAN;
        assert!(matches!(
            input.validate(),
            Err(RecordValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut input = draft();
        input.occurred_on = "01/06/2024".to_string();
        assert!(matches!(
            input.validate(),
            Err(RecordValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn blank_category_is_rejected() {
        let mut input = draft();
        input.category = "  ".to_string();
        assert_eq!(input.validate(), Err(RecordValidationError::EmptyCategory));
    }

    #[test]
    fn into_record_assigns_unique_ids() {
        let first = draft().into_record();
        let second = draft().into_record();
        assert_ne!(first.id, second.id);
        assert_eq!(first.amount, second.amount);
    }
}
