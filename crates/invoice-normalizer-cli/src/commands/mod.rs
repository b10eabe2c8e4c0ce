//! CLI command implementations.

pub mod match_cmd;
pub mod process;
pub mod schema;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use invoice_normalizer::{
    LlmConfig, MappingAdvisor, MatcherConfig, MockAdvisor, OpenAiAdvisor, Parser, RawTable,
    SourceMetadata, TargetSchema, read_workbook,
};

use crate::cli::LlmProviderChoice;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Load a schema file, or fall back to the built-in invoice schema.
pub fn load_schema(path: Option<&Path>) -> invoice_normalizer::Result<TargetSchema> {
    match path {
        Some(p) => TargetSchema::from_json_file(p),
        None => Ok(TargetSchema::invoice_default()),
    }
}

/// Read a workbook by extension, anything else as delimited text.
pub fn read_table(path: &Path) -> invoice_normalizer::Result<(RawTable, SourceMetadata)> {
    let is_workbook = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
        .unwrap_or(false);

    if !is_workbook {
        return Parser::new().parse_file(path);
    }

    let bytes = std::fs::read(path).map_err(|e| invoice_normalizer::NormalizerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_workbook(&bytes, &name)
}

/// Matcher configuration for an optional `--threshold`.
pub fn matcher_config(threshold: Option<f64>) -> Result<MatcherConfig, String> {
    let mut config = MatcherConfig::default();
    if let Some(t) = threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(format!("Threshold must be between 0.0 and 1.0, got {}", t));
        }
        config.acceptance_threshold = t;
    }
    Ok(config)
}

/// Build the advisor selected on the command line.
pub fn build_advisor(
    choice: LlmProviderChoice,
    model: Option<String>,
) -> invoice_normalizer::Result<Option<Arc<dyn MappingAdvisor>>> {
    let advisor: Arc<dyn MappingAdvisor> = match choice {
        LlmProviderChoice::None => return Ok(None),
        LlmProviderChoice::Mock => Arc::new(MockAdvisor::new()),
        LlmProviderChoice::OpenAI => {
            let mut config = LlmConfig::default();
            if let Some(m) = model {
                config.model = m;
            }
            Arc::new(OpenAiAdvisor::from_env_with_config(config)?)
        }
    };
    Ok(Some(advisor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_config_rejects_out_of_range() {
        assert!(matcher_config(Some(1.5)).is_err());
        assert!(matcher_config(Some(-0.1)).is_err());
        assert_eq!(matcher_config(Some(0.8)).unwrap().acceptance_threshold, 0.8);
        assert_eq!(
            matcher_config(None).unwrap().acceptance_threshold,
            MatcherConfig::default().acceptance_threshold
        );
    }

    #[test]
    fn test_read_table_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.csv");
        std::fs::write(&path, "Style,Qty\nA,1\nB,2\n").unwrap();

        let (table, source) = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Style", "Qty"]);
        assert_eq!(source.format, "csv");
        assert_eq!(source.row_count, 2);
    }

    #[test]
    fn test_build_advisor() {
        assert!(build_advisor(LlmProviderChoice::None, None).unwrap().is_none());
        let mock = build_advisor(LlmProviderChoice::Mock, None).unwrap().unwrap();
        assert_eq!(mock.name(), "mock");
    }
}
