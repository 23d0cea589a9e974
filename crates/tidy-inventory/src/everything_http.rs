//! Indexed enumeration through the Everything HTTP server
//!
//! Requires the HTTP server enabled in Everything's options. Keep it bound
//! to localhost with file download disabled; this provider only issues
//! search queries.

use crate::provider::records_under;
use crate::{Error, FileRecord, InventoryProvider, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the `c` (count) query parameter.
const MAX_RESULTS: usize = 100_000;

/// Queries a local Everything HTTP server with JSON output.
#[derive(Debug, Clone)]
pub struct EverythingHttpProvider {
    base_url: String,
    hash_files: bool,
    max_results: usize,
    availability_timeout: Duration,
    query_timeout: Duration,
}

impl Default for EverythingHttpProvider {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            hash_files: false,
            max_results: MAX_RESULTS,
            availability_timeout: AVAILABILITY_TIMEOUT,
            query_timeout: QUERY_TIMEOUT,
        }
    }
}

impl EverythingHttpProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server address, e.g. `http://127.0.0.1:8080`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_hashing(mut self, hash_files: bool) -> Self {
        self.hash_files = hash_files;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.min(MAX_RESULTS);
        self
    }

    /// Deadlines for the availability check and for a query.
    pub fn with_timeouts(mut self, availability: Duration, query: Duration) -> Self {
        self.availability_timeout = availability;
        self.query_timeout = query;
        self
    }

    fn failed(&self, message: impl Into<String>) -> Error {
        Error::ProviderFailed {
            provider: self.name().to_string(),
            message: message.into(),
        }
    }

    fn client(&self, timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| self.failed(format!("cannot build HTTP client: {e}")))
    }
}

impl InventoryProvider for EverythingHttpProvider {
    fn name(&self) -> &str {
        "everything_http"
    }

    fn is_available(&self) -> bool {
        let Ok(client) = self.client(self.availability_timeout) else {
            return false;
        };
        match client.get(format!("{}/", self.base_url)).send() {
            Ok(resp) => matches!(resp.status().as_u16(), 200 | 204),
            Err(e) => {
                tracing::debug!("Everything HTTP server not reachable: {}", e);
                false
            }
        }
    }

    fn enumerate(&self, root: &Path) -> Result<Vec<FileRecord>> {
        let search = format!("{}{}", root.display(), MAIN_SEPARATOR);
        let count = self.max_results.to_string();

        let resp = self
            .client(self.query_timeout)?
            .get(format!("{}/", self.base_url))
            .query(&[
                ("s", search.as_str()),
                ("p", "1"),
                ("c", count.as_str()),
                ("j", "1"),
                ("path_column", "1"),
                ("size_column", "1"),
                ("date_modified_column", "1"),
                ("sort", "path"),
                ("ascending", "1"),
            ])
            .send()
            .map_err(|e| self.failed(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.failed(format!("HTTP {status}")));
        }
        let body: Value = resp
            .json()
            .map_err(|e| self.failed(format!("invalid JSON: {e}")))?;

        let records = records_under(root, result_paths(&body), self.hash_files);
        tracing::debug!(root = %root.display(), count = records.len(), "Everything HTTP query complete");
        Ok(records)
    }
}

/// File paths from a JSON response.
///
/// Accepts a bare array or an object with `results` (or `items`). Rows are
/// either path strings or objects carrying `full_path_and_name`,
/// `path_and_name`, or `path` plus an optional `name`.
fn result_paths(body: &Value) -> Vec<PathBuf> {
    let rows = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => map
            .get("results")
            .or_else(|| map.get("items"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };
    rows.iter().filter_map(row_path).collect()
}

fn row_path(row: &Value) -> Option<PathBuf> {
    let row = match row {
        Value::String(path) => return Some(PathBuf::from(path)),
        Value::Object(row) => row,
        _ => return None,
    };
    let field = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    if let Some(full) = field("full_path_and_name").or_else(|| field("path_and_name")) {
        return Some(PathBuf::from(full));
    }
    let path = PathBuf::from(field("path")?);
    match field("name") {
        // `path` is the containing folder unless it already ends in `name`
        Some(name) if path.file_name().is_none_or(|f| f != name) => Some(path.join(name)),
        _ => Some(path),
    }
}
