//! Layered settings for the binaries.
//!
//! Precedence (highest wins):
//! 1. Environment variables (`CROSSVAL_` prefix, `__` between sections),
//!    e.g. `CROSSVAL_TOLERANCES__PERFORMANCE=0.2`
//! 2. An explicit settings file, if given
//! 3. `crossval.toml` in the working directory, if present
//! 4. Built-in defaults

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::report::ReportFormat;
use crate::validation::ToleranceOverrides;
use crate::Result;

const DEFAULT_FILE: &str = "crossval";
const ENV_PREFIX: &str = "CROSSVAL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub tolerances: ToleranceOverrides,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportSettings {
    pub output_path: Option<PathBuf>,
    pub format: Option<ReportFormat>,
    pub generate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "crossval=info".to_string(),
        }
    }
}

impl Settings {
    /// Load from the default file, an optional explicit file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_FILE).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Parse settings from TOML text only
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }
}
