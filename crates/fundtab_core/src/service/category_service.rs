//! Category label management.
//!
//! # Responsibility
//! - Serve the merged category list: fixed built-ins first, then
//!   user-defined labels.
//! - Persist user-defined labels, deduplicated against the built-ins.

use crate::repo::ledger_repo::{LedgerRepository, RepoResult};

/// Fixed category labels every installation starts with.
pub const BUILTIN_CATEGORIES: &[&str] = &[
    "Late arrival",
    "Missed check-in",
    "Rule violation",
    "Team party",
    "Office supplies",
    "Repairs",
    "Bonus pool",
    "Other",
];

/// Use-case service for category labels.
pub struct CategoryService<R: LedgerRepository> {
    repo: R,
}

impl<R: LedgerRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns built-in labels followed by user-defined ones, deduplicated
    /// in first-seen order.
    pub fn list(&self) -> RepoResult<Vec<String>> {
        let mut labels: Vec<String> = BUILTIN_CATEGORIES
            .iter()
            .map(|label| (*label).to_string())
            .collect();
        for label in self.repo.load_user_categories()? {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        Ok(labels)
    }

    /// Persists one user-defined label.
    ///
    /// Blank input and duplicates (of built-ins or earlier user labels) are
    /// ignored. Returns whether the label was stored.
    pub fn add(&self, label: &str) -> RepoResult<bool> {
        let label = label.trim();
        if label.is_empty() || BUILTIN_CATEGORIES.contains(&label) {
            return Ok(false);
        }

        let mut stored = self.repo.load_user_categories()?;
        if stored.iter().any(|existing| existing == label) {
            return Ok(false);
        }
        stored.push(label.to_string());
        self.repo.save_user_categories(&stored)?;
        Ok(true)
    }
}
