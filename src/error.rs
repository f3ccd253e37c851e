//! Error types.
//!
//! One enum per pipeline stage, unified by [`Error`]. Per-record and
//! per-property problems never surface here: they are corrected or skipped
//! in place and logged (see [`crate::validation`] and
//! [`crate::scheduler::MergeReport`]).

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure that aborts a pipeline stage.
#[derive(Debug, Error)]
pub enum Error {
    /// A record could not be turned into a task.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The node tree rejected a structural change.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The external scheduler could not be run or failed.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The scheduler's result file is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error outside the scheduler invocation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external key that cannot be mapped to an identifier losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Key is the empty string.
    #[error("key is empty")]
    Empty,

    /// Key already contains one of the codec's marker tokens.
    #[error("key `{key}` contains reserved token `{token}`")]
    ReservedToken { key: String, token: &'static str },

    /// Key contains a character outside `[A-Za-z0-9_ -]`.
    #[error("key `{key}` contains unsupported character {ch:?}")]
    InvalidCharacter { key: String, ch: char },

    /// Key does not decode back to itself.
    #[error("key `{key}` does not survive an encode/decode round trip")]
    NotInvertible { key: String },
}

/// A record that could not be built into a task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The record is not a field mapping.
    #[error("record is not an object")]
    NotAnObject,

    /// The identifier field is absent or not textual.
    #[error("record has no identifier field `{field}`")]
    MissingIdentifier { field: String },

    /// The identifier cannot be encoded losslessly.
    #[error("invalid record key: {0}")]
    InvalidKey(#[from] KeyError),
}

/// Structural violations of the node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Two distinct external keys encode to the same identifier.
    #[error("keys `{existing}` and `{incoming}` both encode to identifier `{identifier}`")]
    IdentifierCollision {
        identifier: String,
        existing: String,
        incoming: String,
    },
}

/// Failures around the external scheduler process.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler binary does not exist.
    #[error("scheduler binary `{}` not found", binary.display())]
    NotFound { binary: PathBuf },

    /// The scheduler binary exists but could not be started.
    #[error("failed to start scheduler `{}`: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler exited with a nonzero status.
    #[error("scheduler exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// The scheduler succeeded but produced no result file.
    #[error("scheduler produced no result file at `{}`", path.display())]
    MissingResult { path: PathBuf },

    /// Temporary file or directory handling failed.
    #[error("scheduler workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A malformed calendar result file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("calendar parse error at line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number (after unfolding, the line the entry started on).
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KeyError::ReservedToken {
            key: "a_d_b".into(),
            token: "_d_",
        };
        assert_eq!(err.to_string(), "key `a_d_b` contains reserved token `_d_`");

        let err = ParseError::new(7, "missing DTSTART");
        assert_eq!(err.to_string(), "calendar parse error at line 7: missing DTSTART");
    }

    #[test]
    fn test_error_conversions() {
        let err: Error = LoadError::MissingIdentifier { field: "id".into() }.into();
        assert!(matches!(err, Error::Load(_)));

        let err: LoadError = KeyError::Empty.into();
        assert_eq!(err, LoadError::InvalidKey(KeyError::Empty));
    }
}
