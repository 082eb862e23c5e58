//! Error types for the ldd2bh core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.
//!
//! Only I/O-level problems are represented here as hard failures. Anomalies
//! inside individual directory records degrade to documented default values
//! in the normalizer and never surface as errors.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Security identifier errors
// ---------------------------------------------------------------------------

/// Reasons a binary or encoded security identifier could not be decoded.
///
/// Kept internal to the codec: the public `decode*` helpers in
/// [`crate::sid`] turn these into `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SidError {
    /// No bytes at all.
    #[error("security identifier is empty")]
    Empty,

    /// Fewer than the 8 header bytes (revision, count, authority).
    #[error("security identifier header truncated: {len} bytes")]
    TruncatedHeader { len: usize },

    /// The sub-authority chain is shorter than the declared count.
    #[error("security identifier declares {declared} sub-authorities but only {len} bytes are present")]
    TruncatedSubAuthorities { declared: u8, len: usize },

    /// The encoded-value wrapper names an encoding other than base64.
    #[error("unsupported security identifier encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The base64 payload could not be decoded.
    #[error("invalid base64 security identifier: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

/// Fatal errors raised while reading input collections or writing output
/// documents. Every variant names the collection it happened in.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input file could not be opened or read.
    #[error("failed to read {collection} input '{}': {source}", .path.display())]
    InputRead {
        collection: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file is not a JSON array of attribute-bag records.
    #[error("failed to parse {collection} input '{}': {source}", .path.display())]
    InputParse {
        collection: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The destination directory does not exist.
    #[error("output directory '{}' does not exist", .0.display())]
    OutputDirMissing(PathBuf),

    /// Writing or persisting the output document failed.
    #[error("failed to write {collection} output '{}': {source}", .path.display())]
    OutputWrite {
        collection: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the output document failed.
    #[error("failed to serialize {collection} output: {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConvertError {
    /// Name of the collection the failure belongs to, if any.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::InputRead { collection, .. }
            | Self::InputParse { collection, .. }
            | Self::OutputWrite { collection, .. }
            | Self::Serialize { collection, .. } => Some(collection),
            Self::OutputDirMissing(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = SidError::TruncatedSubAuthorities { declared: 4, len: 12 };
        assert_eq!(
            err.to_string(),
            "security identifier declares 4 sub-authorities but only 12 bytes are present"
        );

        let err = ConvertError::InputParse {
            collection: "groups".into(),
            path: PathBuf::from("/tmp/in/domain_groups.json"),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        let msg = err.to_string();
        assert!(msg.contains("groups"));
        assert!(msg.contains("domain_groups.json"));

        let err = ConfigError::InvalidValue {
            field: "output.users".into(),
            detail: "must not be empty".into(),
        };
        assert!(err.to_string().contains("output.users"));
    }

    #[test]
    fn test_convert_error_collection() {
        let err = ConvertError::InputRead {
            collection: "users".into(),
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.collection(), Some("users"));
        assert_eq!(
            ConvertError::OutputDirMissing(PathBuf::from("/nope")).collection(),
            None
        );
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let err: CoreError = ConfigError::FileNotFound("x.toml".into()).into();
        assert!(matches!(err, CoreError::Config(_)));

        let err: CoreError = ConvertError::OutputDirMissing(PathBuf::from("/nope")).into();
        assert!(matches!(err, CoreError::Convert(_)));
    }
}
