//! Local outbox of committed change sets
//!
//! Every commit drops one JSON document into `.garage/outbox/`. A remote
//! transport would drain this directory; until then it doubles as the
//! commit history.

use crate::lifecycle::ChangeSink;
use anyhow::{Context, Result};
use garage_core::{atomic_write, Snapshot, StateLayout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use ulid::Ulid;

/// One committed change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: Ulid,
    pub message: String,
    pub committed_at_ms: u64,
    pub root: String,
    /// Path to descriptor: `create`, `delete` or the new modification time
    pub changes: BTreeMap<String, String>,
}

pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    pub fn new(layout: &StateLayout) -> Self {
        Self {
            dir: layout.outbox_dir(),
        }
    }

    /// Write one entry
    pub fn push(&self, entry: &OutboxEntry) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.json", entry.id));
        let json = serde_json::to_vec_pretty(entry).context("Failed to encode outbox entry")?;
        atomic_write(&path, &json)?;
        Ok(path)
    }

    /// All entries, oldest first
    pub fn list(&self) -> Result<Vec<OutboxEntry>> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.dir.display()))
            }
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes =
                std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            let entry: OutboxEntry = serde_json::from_slice(&bytes)
                .with_context(|| format!("Malformed outbox entry {}", path.display()))?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }
}

impl ChangeSink for Outbox {
    fn transmit(&mut self, message: &str, snapshot: &Snapshot) -> Result<String> {
        let entry = OutboxEntry {
            id: Ulid::new(),
            message: message.to_string(),
            committed_at_ms: garage_core::current_timestamp_ms(),
            root: snapshot.root().to_string(),
            changes: snapshot
                .pending_changes()
                .iter()
                .map(|(path, change)| (path.clone(), change.to_string()))
                .collect(),
        };

        let path = self.push(&entry)?;
        info!(id = %entry.id, changes = entry.changes.len(), path = %path.display(), "Change set committed");
        Ok(entry.id.to_string())
    }
}
