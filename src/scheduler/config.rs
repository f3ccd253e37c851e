//! Scheduler invocation settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default scheduler executable, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "tj3";

/// How the external scheduler is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Scheduler executable.
    pub binary: PathBuf,
    /// Keep the generated input file and output directory after the run.
    pub retain_temp_files: bool,
    /// Parent directory for scoped temporaries. `None` = system temp dir.
    pub work_root: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            retain_temp_files: false,
            work_root: None,
        }
    }
}

impl RunConfig {
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn retain_temp_files(mut self, retain: bool) -> Self {
        self.retain_temp_files = retain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.binary, PathBuf::from("tj3"));
        assert!(!config.retain_temp_files);
        assert!(config.work_root.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: RunConfig = toml::from_str("retain_temp_files = true").unwrap();
        assert!(config.retain_temp_files);
        assert_eq!(config.binary, PathBuf::from(DEFAULT_BINARY));
    }
}
