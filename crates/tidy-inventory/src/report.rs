//! Read-only extension report

use crate::{FileRecord, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use tidy_fs::{NormalizedPath, io};

/// Placeholder for files without an extension.
pub const NO_EXTENSION: &str = "<noext>";

/// Number of extensions listed in the rendered report.
pub const TOP_EXTENSIONS: usize = 30;

/// File count and extension histogram of one inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionReport {
    pub title: String,
    pub backend: String,
    pub files: usize,
    /// `(".ext", count)` sorted by count descending, then extension
    pub extensions: Vec<(String, usize)>,
}

impl ExtensionReport {
    pub fn from_records(title: impl Into<String>, backend: impl Into<String>, records: &[FileRecord]) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in records {
            let key = record
                .extension()
                .map(|e| format!(".{e}"))
                .unwrap_or_else(|| NO_EXTENSION.to_string());
            *counts.entry(key).or_default() += 1;
        }

        let mut extensions: Vec<(String, usize)> = counts.into_iter().collect();
        extensions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            title: title.into(),
            backend: backend.into(),
            files: records.len(),
            extensions,
        }
    }

    /// Render as Markdown, listing at most [`TOP_EXTENSIONS`] rows.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Report {}", self.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "- files: {}", self.files);
        let _ = writeln!(out, "- backend: {}", self.backend);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Top extensions");
        let _ = writeln!(out);
        let _ = writeln!(out, "| ext | count |");
        let _ = writeln!(out, "|---|---:|");
        for (ext, count) in self.extensions.iter().take(TOP_EXTENSIONS) {
            let _ = writeln!(out, "| {ext} | {count} |");
        }
        out
    }
}

/// Write `report` as Markdown to `path`.
pub fn write_report(report: &ExtensionReport, path: &Path) -> Result<()> {
    io::write_text(&NormalizedPath::new(path), &report.to_markdown())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(path: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            size_bytes: 0,
            mtime_ns: 0,
            content_hash: None,
        }
    }

    #[test]
    fn counts_are_case_insensitive_and_sorted() {
        let records = vec![
            record("/r/a.TMP"),
            record("/r/b.tmp"),
            record("/r/c.txt"),
            record("/r/Makefile"),
        ];

        let report = ExtensionReport::from_records("t", "local", &records);

        assert_eq!(report.files, 4);
        assert_eq!(
            report.extensions,
            vec![
                (".tmp".to_string(), 2),
                (".txt".to_string(), 1),
                ("<noext>".to_string(), 1),
            ]
        );
    }

    #[test]
    fn markdown_caps_rows() {
        let records: Vec<_> = (0..40).map(|i| record(&format!("/r/f.e{i}"))).collect();
        let md = ExtensionReport::from_records("t", "local", &records).to_markdown();
        let rows = md.lines().filter(|l| l.starts_with("| .")).count();
        assert_eq!(rows, TOP_EXTENSIONS);
        assert!(md.contains("- files: 40"));
    }
}
