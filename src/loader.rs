//! Reading and writing OpenAPI documents.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::ConvertError;

/// Load an OpenAPI document from a file path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the file doesn't exist,
/// or `ConvertError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load an OpenAPI document from a JSON string.
///
/// # Errors
///
/// Returns `ConvertError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(content).map_err(|source| ConvertError::InvalidJson { source })
}

/// Serialize a document with four-space indentation.
///
/// Non-ASCII text is written as-is rather than escaped.
pub fn to_pretty_json(doc: &Value) -> Result<String, ConvertError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut serializer)
        .map_err(|source| ConvertError::InvalidJson { source })?;
    String::from_utf8(buf).map_err(|e| ConvertError::InvalidDocument {
        message: e.to_string(),
    })
}

/// Write a document to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns `ConvertError::WriteError` if the directory or file cannot be written.
pub fn write_document(doc: &Value, path: &Path) -> Result<(), ConvertError> {
    let json = to_pretty_json(doc)?;
    let write_error = |source| ConvertError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, json).map_err(write_error)
}
