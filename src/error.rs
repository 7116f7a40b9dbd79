//! Error types for metadata parsing and document conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading capability annotations from an EDMX document.
///
/// These never abort a conversion: the extractor logs them and carries on
/// without capability enforcement.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {source}")]
    Xml {
        #[from]
        source: quick_xml::Error,
    },

    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected root element <{name}>: expected edmx:Edmx")]
    UnexpectedRoot { name: String },

    #[error("document ended inside an open element")]
    Truncated,
}

impl From<quick_xml::events::attributes::AttrError> for MetadataError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        MetadataError::Xml {
            source: quick_xml::Error::from(err),
        }
    }
}

/// Errors during a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Document errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid OpenAPI document: {message}")]
    InvalidDocument { message: String },

    // Converter errors (exit code 4)
    #[error("converter `{program}` could not be started: {source}")]
    ConverterUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter `{program}` exited with {status}")]
    ConverterFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::ReadError { .. } | Self::WriteError { .. } => 3,
            Self::InvalidJson { .. } | Self::InvalidDocument { .. } => 2,
            Self::ConverterUnavailable { .. } | Self::ConverterFailed { .. } => 4,
        }
    }

    /// Captured standard error of a failed converter run, if any.
    pub fn converter_stderr(&self) -> Option<&str> {
        match self {
            Self::ConverterFailed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_error_exit_codes() {
        let err = ConvertError::FileNotFound {
            path: PathBuf::from("api.xml"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ConvertError::InvalidDocument {
            message: "root is not an object".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ConvertError::ConverterFailed {
            program: "npx".into(),
            status: "exit status: 1".into(),
            stderr: "boom".into(),
        };
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn converter_stderr_only_when_present() {
        let err = ConvertError::ConverterFailed {
            program: "npx".into(),
            status: "exit status: 1".into(),
            stderr: "  \n".into(),
        };
        assert_eq!(err.converter_stderr(), None);

        let err = ConvertError::ConverterFailed {
            program: "npx".into(),
            status: "exit status: 1".into(),
            stderr: "unknown option".into(),
        };
        assert_eq!(err.converter_stderr(), Some("unknown option"));
    }

    #[test]
    fn metadata_error_display() {
        let err = MetadataError::UnexpectedRoot {
            name: "html".into(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected root element <html>: expected edmx:Edmx"
        );
    }
}
