//! Run configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! [project]
//! name = "Website relaunch"
//! start = "2024-01-08"
//! end = "2024-12-20"
//! timezone = "UTC"
//!
//! [run]
//! binary = "/usr/local/bin/tj3"
//! retain_temp_files = true
//!
//! [validation]
//! correct_minimum_effort = true
//!
//! [profile]
//! name = "custom"
//! fields = [
//!     { capability = "identifier", path = "ref", coercion = { kind = "text" } },
//! ]
//! ```
//!
//! Dates are quoted strings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::SourceProfile;
use crate::models::ProjectSettings;
use crate::scheduler::RunConfig;
use crate::validation::ValidationRules;

/// Complete configuration of one juggler run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JugglerConfig {
    pub project: ProjectSettings,
    pub run: RunConfig,
    pub validation: ValidationRules,
    /// Overrides the profile selected on the command line.
    pub profile: Option<SourceProfile>,
}

impl JugglerConfig {
    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
