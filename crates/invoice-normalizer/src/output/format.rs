//! Output formats and file naming.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::NormalizerError;

/// Spreadsheet format of the standardized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Office Open XML workbook.
    #[default]
    Xlsx,
    /// Comma-separated text.
    Csv,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }

    /// MIME type for downloads.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            OutputFormat::Csv => "text/csv",
        }
    }

    /// Format implied by a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = NormalizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(NormalizerError::UnsupportedFormat(format!(
                "output format '{}' (expected xlsx or csv)",
                other
            ))),
        }
    }
}

/// Name for a processed upload: `processed_<YYYYmmdd_HHMMSS>_<stem>.<ext>`.
///
/// Directory components of `original` are dropped and anything outside
/// `[A-Za-z0-9._-]` in the stem becomes `_`.
pub fn output_file_name(original: &str, timestamp: NaiveDateTime, format: OutputFormat) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.trim_matches('.').is_empty() {
        "invoice".to_string()
    } else {
        stem
    };

    format!(
        "processed_{}_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        stem,
        format.extension()
    )
}
