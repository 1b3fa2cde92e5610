use std::path::{Path, PathBuf};

use harvest_logging::harvest_info;
use reply_harvester_core::{HarvestResult, OutputRow};

use crate::persist::{write_file, PersistError};

pub const CSV_HEADER: [&str; 3] = ["author", "comment", "title"];
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Prefix the file with a UTF-8 byte order mark so spreadsheet tools pick
    /// the right encoding.
    pub byte_order_mark: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            byte_order_mark: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows, header excluded.
    pub rows: usize,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders the header and one line per row. Every field is quoted and lines end in CRLF.
pub fn render_csv(rows: &[OutputRow], options: &CsvOptions) -> String {
    let mut out = String::new();
    if options.byte_order_mark {
        out.push_str(UTF8_BOM);
    }
    push_record(&mut out, &CSV_HEADER);
    for row in rows {
        push_record(
            &mut out,
            &[row.author.as_str(), row.comment.as_str(), row.title.as_str()],
        );
    }
    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push_str("\r\n");
}

pub fn write_csv(
    path: &Path,
    rows: &[OutputRow],
    options: &CsvOptions,
) -> Result<ExportSummary, ExportError> {
    let content = render_csv(rows, options);
    let written = write_file(path, &content)?;
    harvest_info!("Wrote {} rows to {}", rows.len(), written.display());
    Ok(ExportSummary {
        rows: rows.len(),
        path: written,
        bytes: content.len(),
    })
}

/// Full records as pretty JSON: `{ "root": .., "replies": [..], "root_found": .. }`.
pub fn write_records_json(path: &Path, result: &HarvestResult) -> Result<PathBuf, ExportError> {
    let mut content = serde_json::to_string_pretty(result)?;
    content.push('\n');
    let written = write_file(path, content)?;
    harvest_info!(
        "Wrote {} records to {}",
        result.post_count(),
        written.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{render_csv, CsvOptions};
    use reply_harvester_core::OutputRow;

    fn row(author: &str, comment: &str, title: &str) -> OutputRow {
        OutputRow {
            author: author.to_string(),
            comment: comment.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn quotes_are_doubled_and_every_field_is_quoted() {
        let csv = render_csv(
            &[row("bob", r#"he said "hi", then left"#, "t")],
            &CsvOptions {
                byte_order_mark: false,
            },
        );
        assert_eq!(
            csv,
            "\"author\",\"comment\",\"title\"\r\n\"bob\",\"he said \"\"hi\"\", then left\",\"t\"\r\n"
        );
    }

    #[test]
    fn bom_is_prepended_by_default() {
        let csv = render_csv(&[], &CsvOptions::default());
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.ends_with("\"title\"\r\n"));
    }
}
