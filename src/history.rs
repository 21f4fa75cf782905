use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::rotation::HistoryEntry;

/// On-disk document shape: `{ "history": [...], "lastUpdated": "..." }`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Returns the history file path for an environment ("production" or "test").
pub fn store_path(data_dir: &Path, environment: &str) -> PathBuf {
    data_dir.join(format!("dish_history_{}.json", environment))
}

/// Append-mostly log of dish duty assignments, backed by one JSON file per
/// environment. Entries stay in insertion order; nothing here assumes they
/// are sorted by date.
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Opens the store at `path`. A missing or unreadable file is treated as
    /// empty history so selection is never blocked by storage trouble.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HistoryFile>(&raw) {
                Ok(file) => file.history,
                Err(e) => {
                    eprintln!("Warning: could not parse {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        HistoryStore { path, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Appends a confirmed assignment and saves. Concurrent confirmations may
    /// produce duplicate entries; that records an extra turn rather than
    /// corrupting the log.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), Box<dyn std::error::Error>> {
        self.entries.push(entry);
        self.save()
    }

    /// Replaces the entry at `index` (admin edit).
    pub fn update_entry(
        &mut self,
        index: usize,
        entry: HistoryEntry,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if index >= self.entries.len() {
            return Err(format!("No history entry at index {}", index).into());
        }
        self.entries[index] = entry;
        self.save()
    }

    /// Removes the entry at `index` (admin delete) and returns it.
    pub fn delete_entry(&mut self, index: usize) -> Result<HistoryEntry, Box<dyn std::error::Error>> {
        if index >= self.entries.len() {
            return Err(format!("No history entry at index {}", index).into());
        }
        let removed = self.entries.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// Rewrites one group's entries so each brother's turn count matches the
    /// admin-set target. Growing a count pads with entries dated `now`;
    /// shrinking keeps the most recently inserted ones. Other groups are
    /// untouched. The whole log is re-sorted by date afterwards.
    pub fn rebuild_group_counts(
        &mut self,
        group: &str,
        targets: &BTreeMap<String, u32>,
        now: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let group_members: Vec<String> = group.split(',').map(|s| s.to_string()).collect();
        let mut rebuilt: Vec<HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.group != group)
            .cloned()
            .collect();

        for (brother, &target) in targets {
            let current: Vec<&HistoryEntry> = self
                .entries
                .iter()
                .filter(|e| e.group == group && e.brother == *brother)
                .collect();
            let target = target as usize;

            if target >= current.len() {
                rebuilt.extend(current.iter().map(|e| (*e).clone()));
                for _ in current.len()..target {
                    rebuilt.push(HistoryEntry {
                        brother: brother.clone(),
                        group: group.to_string(),
                        date: now.to_string(),
                        present_brothers: group_members.clone(),
                    });
                }
            } else {
                // Keep only the most recently inserted entries.
                rebuilt.extend(current[current.len() - target..].iter().map(|e| (*e).clone()));
            }
        }

        rebuilt.sort_by_key(|e| DateTime::parse_from_rfc3339(&e.date).ok());
        self.entries = rebuilt;
        self.save()
    }

    /// Distinct group keys present in the log, in first-seen order.
    pub fn groups(&self) -> Vec<String> {
        let mut groups = Vec::new();
        for entry in &self.entries {
            if !groups.contains(&entry.group) {
                groups.push(entry.group.clone());
            }
        }
        groups
    }

    fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = HistoryFile {
            history: self.entries.clone(),
            last_updated: Some(Utc::now().to_rfc3339()),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
