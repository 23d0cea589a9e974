//! Append-only audit ledger
//!
//! `audit/audit.jsonl` holds one JSON object per line:
//!
//! ```text
//! {"event":"dry_run","plan_id":"...","ts":"2026-01-01T12:00:00Z","actions":1}
//! {"event":"apply_start","plan_id":"...","ts":"...","actions":1}
//! {"event":"action_committed","plan_id":"...","ts":"...","action_id":"A-001",...}
//! {"event":"apply_done","plan_id":"...","ts":"...","committed":1}
//! ```
//!
//! Records are never rewritten. Every append opens, writes one whole line,
//! syncs and closes, so nothing is buffered between calls.
//!
//! Reads are strict: a line that does not parse fails the whole read. Gate
//! checks built on [`AuditLedger::has_event`] therefore answer "not proven"
//! for a damaged ledger.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tidy_fs::MetaLayout;

/// Kinds of ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DryRun,
    ApplyStart,
    ActionCommitted,
    ApplyDone,
    ApplyFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::ApplyStart => "apply_start",
            Self::ActionCommitted => "action_committed",
            Self::ApplyDone => "apply_done",
            Self::ApplyFailed => "apply_failed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event: EventKind,
    pub plan_id: String,
    /// Filled with the current time on append when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
    /// Event-specific fields, flattened into the record
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl AuditEvent {
    pub fn new(event: EventKind, plan_id: impl Into<String>) -> Self {
        Self {
            event,
            plan_id: plan_id.into(),
            ts: None,
            payload: Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// A string payload field.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// The ledger file of one managed root.
#[derive(Debug, Clone)]
pub struct AuditLedger {
    path: PathBuf,
}

impl AuditLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_layout(layout: &MetaLayout) -> Self {
        Self::new(layout.audit_log_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and sync it to disk.
    ///
    /// If an earlier write was torn (file not ending in a newline), a newline
    /// is written first so the new record starts on its own line.
    pub fn append(&self, mut event: AuditEvent) -> Result<AuditEvent> {
        if event.ts.is_none() {
            event.ts = Some(Utc::now());
        }
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| tidy_fs::Error::io(parent, e))?;
        }
        if ends_mid_line(&self.path)? {
            tracing::warn!(path = %self.path.display(), "Audit ledger ends with a torn record");
            line.insert(0, '\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| tidy_fs::Error::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| tidy_fs::Error::io(&self.path, e))?;
        file.sync_data()
            .map_err(|e| tidy_fs::Error::io(&self.path, e))?;

        tracing::debug!(event = %event.event, plan_id = %event.plan_id, "Audit event appended");
        Ok(event)
    }

    /// Every record, in file order. A missing ledger is empty.
    ///
    /// # Errors
    ///
    /// [`Error::LedgerCorrupt`] for the first line that does not parse.
    pub fn events(&self) -> Result<Vec<AuditEvent>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(tidy_fs::Error::io(&self.path, e).into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| Error::LedgerCorrupt {
                    path: self.path.clone(),
                    line: idx + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Records for `plan_id`, in file order.
    pub fn events_for(&self, plan_id: &str) -> Result<Vec<AuditEvent>> {
        Ok(self
            .events()?
            .into_iter()
            .filter(|e| e.plan_id == plan_id)
            .collect())
    }

    /// Records of one kind for `plan_id`.
    pub fn query(&self, plan_id: &str, kind: EventKind) -> Result<Vec<AuditEvent>> {
        Ok(self
            .events_for(plan_id)?
            .into_iter()
            .filter(|e| e.event == kind)
            .collect())
    }

    /// Gate check: is there at least one `kind` record for `plan_id`?
    ///
    /// Fails closed: an unreadable or corrupt ledger answers `false`.
    pub fn has_event(&self, plan_id: &str, kind: EventKind) -> bool {
        match self.query(plan_id, kind) {
            Ok(events) => !events.is_empty(),
            Err(e) => {
                tracing::warn!("Cannot prove {} for plan {}: {}", kind, plan_id, e);
                false
            }
        }
    }
}

/// Whether a non-empty file lacks a trailing newline.
fn ends_mid_line(path: &Path) -> Result<bool> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(tidy_fs::Error::io(path, e).into()),
    };
    let len = file
        .metadata()
        .map_err(|e| tidy_fs::Error::io(path, e))?
        .len();
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| tidy_fs::Error::io(path, e))?;
    Ok(last[0] != b'\n')
}
