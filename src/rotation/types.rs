use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// One recorded dish duty assignment. Field names match the stored JSON
/// (`presentBrothers` etc.), so old data files stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub brother: String,
    pub group: String,
    pub date: String, // ISO-8601 (RFC 3339)
    #[serde(rename = "presentBrothers")]
    pub present_brothers: Vec<String>,
}

/// Output of one selection run: the chosen brother, a human-readable reason,
/// and the full count/last-date maps so callers can show the stats screen.
/// Not persisted; on confirmation the caller writes a new HistoryEntry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub chosen: String,
    pub reason: String,
    pub group: String,
    #[serde(rename = "presentBrothers")]
    pub present_brothers: Vec<String>,
    // BTreeMap keeps iteration and JSON key order stable across calls
    pub counts: BTreeMap<String, u32>,
    #[serde(rename = "lastDates")]
    pub last_dates: BTreeMap<String, Option<String>>,
}
