//! Lookups over an OpenAPI document: schema references, entity types and
//! path segments.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::types::{MutationKind, HTTP_METHODS, SCHEMA_REF_PREFIX};

/// Entity type governing a path, recovered from a schema reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    /// Bare entity type name (`item` for `Microsoft.NAV.item-update`).
    pub entity_type: String,
    /// Schema the reference pointed at.
    pub schema: String,
}

impl EntityReference {
    /// Resolve a `$ref` pointer to the entity type it describes.
    ///
    /// Returns `None` unless the pointer targets `#/components/schemas/` and the
    /// schema name carries the `namespace.` prefix. A trailing `-create` or
    /// `-update` is stripped.
    pub fn from_ref(pointer: &str, namespace: &str) -> Option<Self> {
        let schema = pointer.strip_prefix(SCHEMA_REF_PREFIX)?;
        let entity_type = base_type_of(schema, namespace)?;
        Some(Self {
            entity_type: entity_type.to_string(),
            schema: schema.to_string(),
        })
    }
}

/// Strip `namespace.` and any mutation suffix from a schema name.
///
/// Returns `None` when the name is outside the namespace.
pub fn base_type_of<'a>(schema: &'a str, namespace: &str) -> Option<&'a str> {
    let unqualified = schema.strip_prefix(namespace)?.strip_prefix('.')?;
    Some(strip_mutation_suffix(unqualified))
}

/// Base type of a mutation schema, with the namespace prefix optional.
pub fn mutation_base_type<'a>(schema: &'a str, namespace: &str) -> &'a str {
    let unsuffixed = strip_mutation_suffix(schema);
    unsuffixed
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(unsuffixed)
}

fn strip_mutation_suffix(name: &str) -> &str {
    MutationKind::ALL
        .iter()
        .find_map(|kind| name.strip_suffix(kind.suffix()))
        .unwrap_or(name)
}

/// `$ref` of the JSON body schema of a GET 200 response.
pub fn response_schema_ref(operation: &Value) -> Option<&str> {
    operation
        .get("responses")?
        .get("200")?
        .get("content")?
        .get("application/json")?
        .get("schema")?
        .get("$ref")?
        .as_str()
}

/// `$ref` of the JSON request body schema.
pub fn request_schema_ref(operation: &Value) -> Option<&str> {
    operation
        .get("requestBody")?
        .get("content")?
        .get("application/json")?
        .get("schema")?
        .get("$ref")?
        .as_str()
}

/// Resolve the entity type of a path item from its `get` response schema,
/// falling back to its `patch` request schema.
pub fn entity_reference_of(path_item: &Value, namespace: &str) -> Option<EntityReference> {
    let from_get = path_item
        .get("get")
        .and_then(response_schema_ref)
        .and_then(|r| EntityReference::from_ref(r, namespace));
    from_get.or_else(|| {
        path_item
            .get("patch")
            .and_then(request_schema_ref)
            .and_then(|r| EntityReference::from_ref(r, namespace))
    })
}

/// Collect every schema name referenced anywhere below `value`.
pub fn collect_schema_refs(value: &Value, refs: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(pointer)) => {
                        if let Some(name) = pointer.strip_prefix(SCHEMA_REF_PREFIX) {
                            refs.insert(name.to_string());
                        }
                    }
                    _ => collect_schema_refs(child, refs),
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                collect_schema_refs(item, refs);
            }
        }
        _ => {}
    }
}

/// Number of HTTP operations in a path item.
pub fn operation_count(path_item: &Map<String, Value>) -> usize {
    HTTP_METHODS
        .iter()
        .filter(|method| path_item.contains_key(**method))
        .count()
}

/// Segment name without its key expression (`items({id})` → `items`).
pub fn strip_key(segment: &str) -> &str {
    match segment.find('(') {
        Some(idx) => &segment[..idx],
        None => segment,
    }
}

/// Whether a segment is a bare parenthesized key expression such as `({id})`.
pub fn is_key_segment(segment: &str) -> bool {
    segment.starts_with('(') && segment.ends_with(')')
}

/// Non-empty `/`-separated segments of a path.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
