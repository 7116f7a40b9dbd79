//! Capability extraction from EDMX metadata.
//!
//! Reads `Org.OData.Capabilities.V1` restriction annotations nested inside
//! `EntitySet` elements:
//!
//! ```xml
//! <EntitySet Name="items" EntityType="Microsoft.NAV.item">
//!   <Annotation Term="Org.OData.Capabilities.V1.DeleteRestrictions">
//!     <Record>
//!       <PropertyValue Property="Deletable" Bool="false" />
//!     </Record>
//!   </Annotation>
//! </EntitySet>
//! ```
//!
//! Elements are matched by resolved namespace URI, so documents using other
//! prefixes (or a default namespace) for the EDM vocabulary parse the same.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::{debug, info, warn};

use crate::error::MetadataError;
use crate::types::{Capabilities, CapabilityRecord};

/// EDMX wrapper namespace.
pub const EDMX_NS: &str = "http://docs.oasis-open.org/odata/ns/edmx";

/// EDM structural and annotation namespace.
pub const EDM_NS: &str = "http://docs.oasis-open.org/odata/ns/edm";

/// Restriction term recognised on an entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Restriction {
    Insert,
    Update,
    Delete,
}

impl Restriction {
    fn from_term(term: &str) -> Option<Self> {
        if term.contains("InsertRestrictions") {
            Some(Restriction::Insert)
        } else if term.contains("UpdateRestrictions") {
            Some(Restriction::Update)
        } else if term.contains("DeleteRestrictions") {
            Some(Restriction::Delete)
        } else {
            None
        }
    }

    /// `PropertyValue` carrying the flag for this term.
    fn property(&self) -> &'static str {
        match self {
            Restriction::Insert => "Insertable",
            Restriction::Update => "Updatable",
            Restriction::Delete => "Deletable",
        }
    }

    fn apply(&self, record: &mut CapabilityRecord, allowed: bool) {
        match self {
            Restriction::Insert => record.insertable = allowed,
            Restriction::Update => record.updatable = allowed,
            Restriction::Delete => record.deletable = allowed,
        }
    }
}

struct OpenEntitySet {
    name: String,
    entity_type: String,
    record: CapabilityRecord,
    depth: usize,
}

struct OpenAnnotation {
    restriction: Option<Restriction>,
    resolved: bool,
    depth: usize,
}

/// Read capability restrictions from an EDMX file, best effort.
///
/// Any read or parse failure is logged as a warning and yields empty
/// capabilities, which turns enforcement into a no-op.
pub fn extract_capabilities(path: &Path) -> Capabilities {
    match read_capabilities(path) {
        Ok(capabilities) => capabilities,
        Err(e) => {
            warn!("could not parse EDMX capabilities from {}: {}", path.display(), e);
            Capabilities::default()
        }
    }
}

/// Read capability restrictions from an EDMX file.
///
/// # Errors
///
/// Returns `MetadataError` if the file cannot be read or is not an EDMX document.
pub fn read_capabilities(path: &Path) -> Result<Capabilities, MetadataError> {
    let content = std::fs::read_to_string(path).map_err(|source| MetadataError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_capabilities(&content)
}

/// Parse capability restrictions from EDMX text.
///
/// Every entity set with both a `Name` and an `EntityType` gets a record,
/// all-permitted unless a restriction annotation says otherwise. The record is
/// stored under the set name and under the bare type name (namespace
/// stripped).
///
/// # Errors
///
/// Returns `MetadataError` for malformed XML, a missing or non-EDMX root
/// element, or a document that ends inside an open element.
pub fn parse_capabilities(xml: &str) -> Result<Capabilities, MetadataError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut capabilities = Capabilities::default();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut entity_set: Option<OpenEntitySet> = None;
    let mut annotations: Vec<OpenAnnotation> = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let in_edm = is_bound_to(&ns, EDM_NS);
        let in_edmx = is_bound_to(&ns, EDMX_NS);

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if !is_empty {
                    depth += 1;
                }

                if !seen_root {
                    if !(in_edmx && e.local_name().as_ref() == b"Edmx") {
                        return Err(MetadataError::UnexpectedRoot {
                            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        });
                    }
                    seen_root = true;
                    continue;
                }

                if !in_edm {
                    continue;
                }

                match e.local_name().as_ref() {
                    b"EntitySet" if entity_set.is_none() => {
                        let Some(open) = open_entity_set(e, depth)? else {
                            continue;
                        };
                        if is_empty {
                            record_entity_set(&mut capabilities, open);
                        } else {
                            entity_set = Some(open);
                        }
                    }
                    b"Annotation" if entity_set.is_some() && !is_empty => {
                        let term = attribute(e, b"Term")?.unwrap_or_default();
                        annotations.push(OpenAnnotation {
                            restriction: Restriction::from_term(&term),
                            resolved: false,
                            depth,
                        });
                    }
                    b"PropertyValue" => {
                        if let Some(open) = entity_set.as_mut() {
                            apply_property_value(e, &mut annotations, &mut open.record)?;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if annotations.last().is_some_and(|a| a.depth == depth) {
                    annotations.pop();
                }
                if entity_set.as_ref().is_some_and(|s| s.depth == depth) {
                    if let Some(open) = entity_set.take() {
                        record_entity_set(&mut capabilities, open);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(MetadataError::MissingRoot);
    }
    if depth != 0 {
        return Err(MetadataError::Truncated);
    }

    info!(
        "parsed capability annotations for {} entity sets",
        capabilities.entity_sets.len()
    );
    Ok(capabilities)
}

fn is_bound_to(ns: &ResolveResult, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(bound)) if *bound == uri.as_bytes())
}

/// Look up an unprefixed attribute and unescape its value.
fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, MetadataError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn open_entity_set(e: &BytesStart, depth: usize) -> Result<Option<OpenEntitySet>, MetadataError> {
    let (Some(name), Some(qualified_type)) = (attribute(e, b"Name")?, attribute(e, b"EntityType")?)
    else {
        debug!("skipping EntitySet without Name or EntityType");
        return Ok(None);
    };
    let entity_type = bare_type_name(&qualified_type).to_string();
    Ok(Some(OpenEntitySet {
        name,
        entity_type,
        record: CapabilityRecord::default(),
        depth,
    }))
}

/// Apply a `PropertyValue` to every enclosing restriction annotation that is
/// waiting for it. Only the first matching value of an annotation counts.
fn apply_property_value(
    e: &BytesStart,
    annotations: &mut [OpenAnnotation],
    record: &mut CapabilityRecord,
) -> Result<(), MetadataError> {
    let Some(property) = attribute(e, b"Property")? else {
        return Ok(());
    };
    let mut allowed = None;
    for annotation in annotations.iter_mut().filter(|a| !a.resolved) {
        let Some(restriction) = annotation.restriction else {
            continue;
        };
        if restriction.property() != property {
            continue;
        }
        let value = match allowed {
            Some(value) => value,
            None => {
                let value = attribute(e, b"Bool")?
                    .map(|b| b.eq_ignore_ascii_case("true"))
                    .unwrap_or(true);
                allowed = Some(value);
                value
            }
        };
        restriction.apply(record, value);
        annotation.resolved = true;
    }
    Ok(())
}

fn record_entity_set(capabilities: &mut Capabilities, open: OpenEntitySet) {
    if open.record.is_restricted() {
        info!(
            "EntitySet '{}' (EntityType '{}') has restrictions: {} not allowed",
            open.name,
            open.entity_type,
            open.record.restricted_operations().join(", ")
        );
    }
    capabilities.insert(&open.name, &open.entity_type, open.record);
}

/// Strip the namespace from a qualified type name (`Microsoft.NAV.item` → `item`).
pub fn bare_type_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
