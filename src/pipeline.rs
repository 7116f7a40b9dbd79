//! The enhancement pipeline.
//!
//! Stages run in a fixed order on one in-memory document:
//!
//! 1. static sections (`openapi`, `info`, `servers`, `security`, `securitySchemes`)
//! 2. navigation path pruning
//! 3. company parameter injection
//! 4. capability enforcement
//! 5. unused / restricted schema variant pruning
//! 6. system audit field scrubbing

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::capabilities::extract_capabilities;
use crate::converter::BaseConverter;
use crate::enforce::{enforce_capabilities, RemovedOperation};
use crate::error::ConvertError;
use crate::loader::write_document;
use crate::parameters::{add_company_parameter, object_entry};
use crate::paths::remove_navigation_paths;
use crate::schemas::{remove_system_fields, remove_unused_schema_variants};
use crate::sections::{self, OPENAPI_VERSION};
use crate::types::{Capabilities, DEFAULT_NAMESPACE};

/// Options for document enhancement.
#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    /// `info.title`; defaults to `"<api name> API"`.
    pub title: Option<String>,
    /// `info.description`; defaults to the Getting Started template.
    pub description: Option<String>,
    /// API name used in the description and the server URL.
    pub api_name: Option<String>,
    /// API version segment of the server URL (default `v2.0`).
    pub api_version: Option<String>,
    /// Tenant placeholder in the OAuth2 token URL (default `{tenant_Id}`).
    pub tenant_placeholder: Option<String>,
    /// Provider namespace prefixing schema names.
    pub namespace: String,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            api_name: None,
            api_version: None,
            tenant_placeholder: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl EnhanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn api_name(mut self, api_name: Option<String>) -> Self {
        self.api_name = api_name;
        self
    }

    pub fn api_version(mut self, api_version: Option<String>) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn tenant_placeholder(mut self, tenant_placeholder: Option<String>) -> Self {
        self.tenant_placeholder = tenant_placeholder;
        self
    }

    /// Set the provider namespace (without trailing dot).
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into().trim_end_matches('.').to_string();
        self
    }
}

/// What an enhancement run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnhanceReport {
    pub paths_removed: usize,
    pub parameters_injected: usize,
    pub operations_removed: Vec<RemovedOperation>,
    pub empty_paths_removed: Vec<String>,
    pub schemas_removed: Vec<String>,
    pub schemas_scrubbed: usize,
    pub fields_removed: usize,
}

impl EnhanceReport {
    /// True when the run only rewrote boilerplate sections.
    pub fn is_unchanged(&self) -> bool {
        self.paths_removed == 0
            && self.parameters_injected == 0
            && self.operations_removed.is_empty()
            && self.empty_paths_removed.is_empty()
            && self.schemas_removed.is_empty()
            && self.fields_removed == 0
    }
}

/// Enhance a baseline OpenAPI document in place.
///
/// # Errors
///
/// Returns `ConvertError::InvalidDocument` if the document root is not a JSON
/// object. Missing `paths` or `components` are not errors.
pub fn enhance(
    doc: &mut Value,
    capabilities: &Capabilities,
    options: &EnhanceOptions,
) -> Result<EnhanceReport, ConvertError> {
    apply_sections(doc, options)?;

    let mut report = EnhanceReport {
        paths_removed: remove_navigation_paths(doc),
        ..Default::default()
    };
    if let Value::Object(map) = doc {
        report.parameters_injected = add_company_parameter(map);
    }

    let enforcement = enforce_capabilities(doc, capabilities, &options.namespace);
    report.operations_removed = enforcement.operations_removed;
    report.empty_paths_removed = enforcement.empty_paths_removed;

    report.schemas_removed = remove_unused_schema_variants(doc, capabilities, &options.namespace);
    (report.schemas_scrubbed, report.fields_removed) = remove_system_fields(doc);

    Ok(report)
}

fn apply_sections(doc: &mut Value, options: &EnhanceOptions) -> Result<(), ConvertError> {
    let Value::Object(map) = doc else {
        return Err(ConvertError::InvalidDocument {
            message: "document root must be a JSON object".to_string(),
        });
    };

    map.insert("openapi".to_string(), Value::String(OPENAPI_VERSION.to_string()));
    map.insert(
        "info".to_string(),
        sections::info(
            options.title.as_deref(),
            options.description.as_deref(),
            options.api_name.as_deref(),
        ),
    );
    map.insert(
        "servers".to_string(),
        sections::servers(options.api_name.as_deref(), options.api_version.as_deref()),
    );
    map.insert("security".to_string(), sections::security());
    if let Some(components) = object_entry(map, "components") {
        components.insert(
            "securitySchemes".to_string(),
            sections::security_schemes(options.tenant_placeholder.as_deref()),
        );
    }
    Ok(())
}

/// Convert an EDMX file into an enhanced OpenAPI document at `output`.
///
/// Capabilities are read best-effort from `metadata`; the baseline document
/// comes from `converter`.
///
/// # Errors
///
/// Returns `ConvertError` if the baseline cannot be produced, is not an
/// OpenAPI object, or the output cannot be written.
pub fn convert(
    metadata: &Path,
    output: &Path,
    converter: &dyn BaseConverter,
    options: &EnhanceOptions,
) -> Result<EnhanceReport, ConvertError> {
    if !metadata.exists() {
        return Err(ConvertError::FileNotFound {
            path: metadata.to_path_buf(),
        });
    }
    info!("converting {} to {}", metadata.display(), output.display());

    let capabilities = extract_capabilities(metadata);
    let mut doc = converter.generate(metadata)?;
    let report = enhance(&mut doc, &capabilities, options)?;
    write_document(&doc, output)?;

    info!("enhanced OpenAPI saved to {}", output.display());
    Ok(report)
}
