//! Append-only record of every mutating rule-engine call.
//!
//! One [`LogEntry`] per mutation: which operation ran, a snapshot of its
//! arguments, what it returned, and the time step it ran in. Decision requests
//! are not logged here; only the state changes they lead to.
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ChargePlayer,
    ReceiveCash,
    UpdateAssetOwner,
    ResetOptionToBuy,
    Auction,
    ReturnImprovements,
    DeclareBankruptcy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub operation: Operation,
    pub params: Value,
    #[serde(rename = "return")]
    pub returned: Value,
    pub time_step: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, operation: Operation, params: Value, returned: Value, time_step: u64) {
        self.entries.push(LogEntry {
            operation,
            params,
            returned,
            time_step,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.entries.iter().map(|e| e.operation).collect()
    }

    /// Entries appended at or after `mark` (a previous [`EventLog::len`]).
    pub fn since(&self, mark: usize) -> &[LogEntry] {
        &self.entries[mark.min(self.entries.len())..]
    }

    /// One JSON object per line, oldest first.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}
