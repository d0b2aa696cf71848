//! Optional YAML configuration for a cleaning run

use crate::process::{Abbreviations, Pipeline};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    /// Guess the format from a file extension; `None` for anything unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Some(Self::Parquet),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

/// Run configuration. Every field is optional; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    /// Where to write the JSON run report.
    pub report: Option<PathBuf>,
    /// Extra or overriding street abbreviations, e.g. `HG: HOUGANG`.
    pub abbreviations: BTreeMap<String, String>,
}

impl CleanConfig {
    /// Load configuration from a `.yaml` / `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if !matches!(extension, "yaml" | "yml") {
            anyhow::bail!(
                "Unsupported config file format: {}. Use .yaml or .yml",
                extension
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    }

    /// Default abbreviation table with this config's entries layered on top.
    pub fn abbreviations(&self) -> Abbreviations {
        Abbreviations::default().with_overrides(self.abbreviations.clone())
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::resale(self.abbreviations())
    }
}
