//! Ledger summarization via an external text-analysis collaborator.
//!
//! # Responsibility
//! - Build a read-only snapshot of the ledger for the collaborator.
//! - Issue one blocking HTTP call per request; no retry, no caching.
//!
//! # Invariants
//! - The snapshot never includes record ids or settlement state; the
//!   collaborator sees only `{date, kind, amount, category, note}` rows.
//! - A missing credential fails fast with `SummaryError::NotConfigured`
//!   before any network traffic.

use crate::model::record::{Record, RecordKind};
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// One row of the read-only snapshot handed to the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub date: String,
    pub kind: RecordKind,
    pub amount: f64,
    pub category: String,
    pub note: String,
}

/// Projects the ledger into collaborator-facing snapshot rows.
pub fn ledger_snapshot(records: &[Record]) -> Vec<SnapshotRow> {
    records
        .iter()
        .map(|record| SnapshotRow {
            date: record.occurred_on.clone(),
            kind: record.kind,
            amount: record.amount,
            category: record.category.clone(),
            note: record.note.clone(),
        })
        .collect()
}

/// Failure modes of the summarization call. All of them mean "service
/// unavailable" to the caller; none are retried here.
#[derive(Debug)]
pub enum SummaryError {
    /// No access credential configured; the call was not attempted.
    NotConfigured,
    /// Collaborator answered with a non-success HTTP status.
    Http { status: u16 },
    /// Network-level failure reaching the collaborator.
    Transport(String),
    /// Collaborator answered, but not with a usable text block.
    InvalidResponse(String),
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "summarization credential is not configured"),
            Self::Http { status } => write!(f, "summarization service returned status {status}"),
            Self::Transport(message) => write!(f, "summarization transport failure: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "unusable summarization response: {message}")
            }
        }
    }
}

impl Error for SummaryError {}

/// External collaborator turning a ledger snapshot into one opaque text
/// block.
pub trait LedgerAnalyst {
    fn summarize(&self, rows: &[SnapshotRow]) -> Result<String, SummaryError>;
}

/// Connection settings for the HTTP analyst.
#[derive(Debug, Clone)]
pub struct AnalystConfig {
    /// Full URL of the generation endpoint.
    pub endpoint: String,
    /// Bearer credential; `None` or empty means not configured.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl AnalystConfig {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP implementation of [`LedgerAnalyst`].
pub struct HttpAnalyst {
    config: AnalystConfig,
    agent: ureq::Agent,
}

impl HttpAnalyst {
    pub fn new(config: AnalystConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.timeout)
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .build();
        Self { config, agent }
    }
}

impl LedgerAnalyst for HttpAnalyst {
    fn summarize(&self, rows: &[SnapshotRow]) -> Result<String, SummaryError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(SummaryError::NotConfigured)?;

        let payload = json!({ "contents": build_prompt(rows) });
        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {api_key}"))
            .set("Accept", "application/json")
            .send_json(payload)
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => SummaryError::Http { status },
                ureq::Error::Transport(transport) => {
                    SummaryError::Transport(transport.to_string())
                }
            })?;

        let body: Value = serde_json::from_reader(response.into_reader())
            .map_err(|err| SummaryError::InvalidResponse(err.to_string()))?;
        extract_text(&body)
            .ok_or_else(|| SummaryError::InvalidResponse("no text block in response".to_string()))
    }
}

fn build_prompt(rows: &[SnapshotRow]) -> String {
    let data = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are a finance expert. Analyze the following team fund ledger \
         and produce a short report.\n\nLedger rows (JSON):\n{data}\n\n\
         Cover: 1. overall fund health (credits vs debits), \
         2. notable spending or collection trends, \
         3. one or two suggestions for managing the fund. \
         Answer in Markdown with bullet points, professional but friendly."
    )
}

/// Accepts either a flat `{"text": ...}` answer or the nested
/// candidates/content/parts shape some generation APIs use.
fn extract_text(body: &Value) -> Option<String> {
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let text = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?;
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        extract_text, ledger_snapshot, AnalystConfig, HttpAnalyst, LedgerAnalyst, SummaryError,
    };
    use crate::model::record::{RecordDraft, RecordKind, RecordState};
    use serde_json::json;

    #[test]
    fn snapshot_projects_public_fields_only() {
        let record = RecordDraft {
            kind: RecordKind::Debit,
            amount: 42.5,
            category: "Team party".to_string(),
            note: "pizza".to_string(),
            counterpart: "dave".to_string(),
            occurred_on: "2024-04-01".to_string(),
            state: RecordState::Settled,
        }
        .into_record();

        let rows = ledger_snapshot(&[record]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-04-01");
        assert_eq!(rows[0].amount, 42.5);
        let encoded = serde_json::to_string(&rows).unwrap();
        assert!(!encoded.contains("dave"));
        assert!(!encoded.contains("settled"));
    }

    #[test]
    fn missing_credential_fails_without_network() {
        let analyst = HttpAnalyst::new(AnalystConfig::new("http://127.0.0.1:1/v1", None));
        match analyst.summarize(&[]) {
            Err(SummaryError::NotConfigured) => {}
            other => panic!("expected NotConfigured, got {other:?}"),
        }
    }

    #[test]
    fn extract_text_reads_both_shapes() {
        assert_eq!(
            extract_text(&json!({ "text": "flat" })).as_deref(),
            Some("flat")
        );
        let nested = json!({
            "candidates": [{ "content": { "parts": [{ "text": "nested" }] } }]
        });
        assert_eq!(extract_text(&nested).as_deref(), Some("nested"));
        assert_eq!(extract_text(&json!({ "other": 1 })), None);
    }
}
