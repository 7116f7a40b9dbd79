//! Baseline OpenAPI generation.
//!
//! The EDMX → OpenAPI translation itself is done by the `odata-openapi3` tool
//! from the `odata-openapi` npm package; this module only runs it and reads
//! back its output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::loader::load_document;

/// OpenAPI version requested from the converter.
const CONVERTER_OPENAPI_VERSION: &str = "3.1.0";

/// Source of the baseline OpenAPI document for a metadata file.
pub trait BaseConverter {
    /// Produce the baseline document for the EDMX file at `metadata`.
    fn generate(&self, metadata: &Path) -> Result<Value, ConvertError>;
}

/// Runs `npx odata-openapi3` (or another launcher) as a subprocess.
#[derive(Debug, Clone)]
pub struct OdataOpenApi {
    program: String,
}

impl Default for OdataOpenApi {
    fn default() -> Self {
        Self::new("npx")
    }
}

impl OdataOpenApi {
    /// Use `program` to launch `odata-openapi3`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that the converter can be launched at all.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::ConverterUnavailable` if the program cannot be
    /// started, or `ConvertError::ConverterFailed` if `--help` fails.
    pub fn ensure_available(&self) -> Result<(), ConvertError> {
        let output = self.run(&["odata-openapi3", "--help"])?;
        self.check(output).map(|_| ())
    }

    fn run(&self, args: &[&str]) -> Result<Output, ConvertError> {
        debug!("running {} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| ConvertError::ConverterUnavailable {
                program: self.program.clone(),
                source,
            })
    }

    fn check(&self, output: Output) -> Result<Output, ConvertError> {
        if output.status.success() {
            return Ok(output);
        }
        Err(ConvertError::ConverterFailed {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl BaseConverter for OdataOpenApi {
    fn generate(&self, metadata: &Path) -> Result<Value, ConvertError> {
        let target = tempfile::Builder::new()
            .prefix("edmx-openapi-")
            .suffix(".json")
            .tempfile()
            .map_err(|source| ConvertError::WriteError {
                path: std::env::temp_dir(),
                source,
            })?;
        let target_path = target.path().to_string_lossy().into_owned();
        let metadata_path = metadata.to_string_lossy();

        let output = self.run(&[
            "odata-openapi3",
            "--pretty",
            "--openapi-version",
            CONVERTER_OPENAPI_VERSION,
            "--target",
            target_path.as_str(),
            &*metadata_path,
        ])?;
        self.check(output)?;
        info!("base OpenAPI generated at {}", target_path);

        // `target` is deleted when dropped, after the document is read.
        load_document(target.path())
    }
}

/// Uses a baseline document produced earlier instead of running a converter.
#[derive(Debug, Clone)]
pub struct PregeneratedDocument {
    path: PathBuf,
}

impl PregeneratedDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BaseConverter for PregeneratedDocument {
    fn generate(&self, _metadata: &Path) -> Result<Value, ConvertError> {
        info!("using base OpenAPI from {}", self.path.display());
        load_document(&self.path)
    }
}
