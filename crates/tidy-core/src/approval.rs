//! Approval tokens
//!
//! Approval is a file, `approvals/APPROVED__<plan_id>.token`, containing the
//! plan id. Its existence is the approval; deleting it revokes. There is no
//! expiry and no signature: anyone who can write the approvals directory can
//! approve, which matches the trusted-local-operator model.
//!
//! Tokens are only ever created by the explicit `approve` command.

use crate::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tidy_fs::{MetaLayout, NormalizedPath, io};

/// A durable approval for one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalToken {
    pub plan_id: String,
    /// Last write time of the token file
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

/// Reads and writes approval tokens under a metadata root.
#[derive(Debug, Clone)]
pub struct ApprovalStore {
    layout: MetaLayout,
}

impl ApprovalStore {
    pub fn new(layout: MetaLayout) -> Self {
        Self { layout }
    }

    /// Path of the token for `plan_id`, whether or not it exists.
    pub fn token_path(&self, plan_id: &str) -> PathBuf {
        self.layout.approval_token_path(plan_id)
    }

    /// Approve `plan_id`. Re-approving overwrites the existing token.
    pub fn create(&self, plan_id: &str) -> Result<ApprovalToken> {
        let path = self.token_path(plan_id);
        io::write_text(&NormalizedPath::new(&path), plan_id)?;
        tracing::info!(plan_id, path = %path.display(), "Approval token written");
        Ok(ApprovalToken {
            plan_id: plan_id.to_string(),
            created_at: Utc::now(),
            path,
        })
    }

    /// Whether `plan_id` is approved.
    pub fn exists(&self, plan_id: &str) -> bool {
        self.token_path(plan_id).is_file()
    }

    /// The token for `plan_id`, if present.
    pub fn get(&self, plan_id: &str) -> Result<Option<ApprovalToken>> {
        let path = self.token_path(plan_id);
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(tidy_fs::Error::io(&path, e).into()),
        };
        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| tidy_fs::Error::io(&path, e))?;
        Ok(Some(ApprovalToken {
            plan_id: plan_id.to_string(),
            created_at,
            path,
        }))
    }

    /// Delete the token. Returns whether one existed.
    pub fn revoke(&self, plan_id: &str) -> Result<bool> {
        let path = self.token_path(plan_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(plan_id, "Approval revoked");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(tidy_fs::Error::io(&path, e).into()),
        }
    }
}
