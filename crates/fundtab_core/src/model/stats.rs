//! Aggregate fund statistics derived from the ledger.

use crate::model::record::{Record, RecordKind};

/// Dashboard totals computed over a ledger snapshot.
///
/// Pending records are included: the fund balance tracks what has been
/// recorded, not only what has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedgerStats {
    /// Sum of all credit amounts.
    pub total_credit: f64,
    /// Sum of all debit amounts.
    pub total_debit: f64,
    /// `total_credit - total_debit`.
    pub net_balance: f64,
    pub record_count: usize,
}

impl LedgerStats {
    /// Computes totals over the given records in one pass.
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = Self {
            record_count: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.kind {
                RecordKind::Credit => stats.total_credit += record.amount,
                RecordKind::Debit => stats.total_debit += record.amount,
            }
        }
        stats.net_balance = stats.total_credit - stats.total_debit;
        stats
    }
}
