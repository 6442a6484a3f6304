// src/config.rs

//! Defines the configuration structures for the converter.
//!
//! Settings can be loaded from a JSON file (`--config`) and are then
//! overridden by command-line flags. Every section carries `#[serde(default)]`
//! so a config file only needs the keys it wants to change.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration for a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)] // Apply default values for the entire struct if a field is missing.
pub struct Config {
    /// Where and what to write.
    pub output: OutputConfig,
    /// How input files are gathered and scheduled.
    pub batch: BatchConfig,
    /// Console logging.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads a JSON config file. Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// --- Output Configuration ---

/// Defines what gets written for each converted file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for all outputs. If `None`, outputs go next to each input file.
    pub directory: Option<PathBuf>,
    /// Write one PNG per glyph into `<stem>/` for fonts.
    pub extract_glyphs: bool,
    /// Write `<stem>.json` with the font's layout fields and tables.
    pub write_metadata: bool,
    /// Write the inflated payload of compressed packs to `<stem>.decompressed.rtpack`.
    pub dump_decompressed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: None,
            extract_glyphs: true,
            write_metadata: false,
            dump_decompressed: false,
        }
    }
}

// --- Batch Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads. `1` converts files one after another.
    pub jobs: usize,
    /// File extensions (without the dot) picked up when scanning a directory.
    pub extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            jobs: 1,
            extensions: vec!["rttex".to_string(), "rtfont".to_string()],
        }
    }
}

// --- Logging Configuration ---

/// How much the converter prints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// One line per converted file plus the summary.
    Normal,
    /// Header fields and decoding steps as well.
    Verbose,
}

impl Verbosity {
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "warn,rtpack_converter=info",
            Verbosity::Verbose => "warn,rtpack_converter=debug",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fixed verbosity. If `None`, a single input is converted verbosely and
    /// batches only report per-file results.
    pub verbosity: Option<Verbosity>,
}

impl LoggingConfig {
    /// Resolves the effective verbosity for a run over `input_count` files.
    pub fn effective_verbosity(&self, input_count: usize) -> Verbosity {
        self.verbosity.unwrap_or(if input_count > 1 {
            Verbosity::Normal
        } else {
            Verbosity::Verbose
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn empty_json_is_the_default_config() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.output.extract_glyphs);
        assert_eq!(config.batch.jobs, 1);
        assert_eq!(config.batch.extensions, vec!["rttex", "rtfont"]);
    }

    #[test_log::test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_json(
            r#"{ "output": { "write_metadata": true }, "logging": { "verbosity": "quiet" } }"#,
        )
        .unwrap();
        assert!(config.output.write_metadata);
        assert!(config.output.extract_glyphs, "untouched key keeps its default");
        assert_eq!(config.logging.verbosity, Some(Verbosity::Quiet));
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test_log::test]
    fn invalid_json_is_an_error() {
        assert!(Config::from_json("{ \"batch\": { \"jobs\": \"many\" } }").is_err());
    }

    #[test_log::test]
    fn batches_default_to_normal_verbosity() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.effective_verbosity(1), Verbosity::Verbose);
        assert_eq!(logging.effective_verbosity(5), Verbosity::Normal);

        let pinned = LoggingConfig {
            verbosity: Some(Verbosity::Quiet),
        };
        assert_eq!(pinned.effective_verbosity(1), Verbosity::Quiet);
    }

    #[test_log::test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/rtpack-converter.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
