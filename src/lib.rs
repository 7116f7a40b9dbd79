//! EDMX → OpenAPI enhancement
//!
//! Turns the raw OpenAPI document generated from a Business Central EDMX file
//! into a publication-ready one: capability restrictions from the metadata
//! decide which operations survive, deep navigation paths are pruned, and a
//! shared `company` parameter is wired into every company-aware path.
//!
//! # Example
//!
//! ```
//! use edmx_openapi::{enhance, parse_capabilities, EnhanceOptions};
//! use serde_json::json;
//!
//! let metadata = r#"<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
//!   <edmx:DataServices>
//!     <Schema Namespace="Microsoft.NAV" xmlns="http://docs.oasis-open.org/odata/ns/edm">
//!       <EntityContainer Name="NAV">
//!         <EntitySet Name="items" EntityType="Microsoft.NAV.item">
//!           <Annotation Term="Org.OData.Capabilities.V1.DeleteRestrictions">
//!             <Record><PropertyValue Property="Deletable" Bool="false" /></Record>
//!           </Annotation>
//!         </EntitySet>
//!       </EntityContainer>
//!     </Schema>
//!   </edmx:DataServices>
//! </edmx:Edmx>"#;
//!
//! let capabilities = parse_capabilities(metadata).unwrap();
//! let mut doc = json!({
//!     "openapi": "3.1.0",
//!     "paths": {
//!         "/companies({id})/items({id})": { "get": {}, "patch": {}, "delete": {} },
//!         "/companies({id})/items({id})/picture": { "get": {} }
//!     }
//! });
//!
//! let report = enhance(&mut doc, &capabilities, &EnhanceOptions::new()).unwrap();
//!
//! let item = &doc["paths"]["/companies({id})/items({id})"];
//! assert!(item.get("delete").is_none());
//! assert!(item.get("patch").is_some());
//! assert!(doc["paths"].get("/companies({id})/items({id})/picture").is_none());
//! assert_eq!(report.paths_removed, 1);
//! ```
//!
//! # Capability rules
//!
//! | Annotation | Effect on paths | Effect on schemas |
//! |------------|-----------------|-------------------|
//! | `InsertRestrictions/Insertable=false` | remove `post` | remove `-create` |
//! | `UpdateRestrictions/Updatable=false` | remove `patch` | remove `-update` |
//! | `DeleteRestrictions/Deletable=false` | remove `delete` | - |
//! | (none) | keep all | keep referenced variants |

mod capabilities;
mod converter;
mod enforce;
mod error;
mod index;
mod loader;
mod parameters;
mod paths;
mod pipeline;
mod schemas;
mod sections;
mod types;

pub use capabilities::{extract_capabilities, parse_capabilities, read_capabilities};
pub use converter::{BaseConverter, OdataOpenApi, PregeneratedDocument};
pub use enforce::{
    enforce_capabilities, entity_set_of_path, resolve_capabilities, restricted_type_override,
    Enforcement, LookupStrategy, RemovedOperation,
};
pub use error::{ConvertError, MetadataError};
pub use index::{collect_schema_refs, entity_reference_of, EntityReference};
pub use loader::{load_document, load_document_str, to_pretty_json, write_document};
pub use parameters::{add_company_parameter, company_parameter, is_tenant_endpoint};
pub use paths::{classify, is_navigation, is_system_endpoint, remove_navigation_paths, PathKind};
pub use pipeline::{convert, enhance, EnhanceOptions, EnhanceReport};
pub use schemas::{remove_system_fields, remove_unused_schema_variants};
pub use types::{
    Capabilities, CapabilityRecord, CapabilityTable, MutationKind, COMPANY_PARAMETER_REF,
    DEFAULT_NAMESPACE,
};
