//! Capability enforcement: drop operations the metadata disallows.
//!
//! Each path's governing [`CapabilityRecord`] is found by an ordered chain of
//! [`LookupStrategy`] values, then possibly replaced by
//! [`restricted_type_override`]. The record decides which of `post`, `patch`
//! and `delete` survive.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::index::{entity_reference_of, operation_count, strip_key};
use crate::types::{Capabilities, CapabilityRecord};

/// One way of finding the capability record that governs a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Entity-set name taken from the first segment below the company scope.
    EntitySetName,
    /// Entity type recovered from the `get` response or `patch` body schema.
    SchemaReference,
    /// Last path segment matched against entity-type names.
    TrailingSegment,
}

impl LookupStrategy {
    /// Strategies in the order they are tried.
    pub const CHAIN: [LookupStrategy; 3] = [
        LookupStrategy::EntitySetName,
        LookupStrategy::SchemaReference,
        LookupStrategy::TrailingSegment,
    ];

    pub fn lookup(
        &self,
        path: &str,
        path_item: &Value,
        capabilities: &Capabilities,
        namespace: &str,
    ) -> Option<CapabilityRecord> {
        match self {
            LookupStrategy::EntitySetName => entity_set_of_path(path)
                .and_then(|set| capabilities.for_entity_set(set))
                .copied(),
            LookupStrategy::SchemaReference => entity_reference_of(path_item, namespace)
                .and_then(|r| capabilities.for_entity_type(&r.entity_type).copied()),
            LookupStrategy::TrailingSegment => {
                let last = path.trim_end_matches('/').rsplit('/').next()?;
                capabilities.for_entity_type(strip_key(last)).copied()
            }
        }
    }
}

/// Entity-set name a path addresses directly.
///
/// `/companies({id})/items({id})` → `items`; `/items` → `items`;
/// `/companies({id})` → `None`.
pub fn entity_set_of_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_start_matches('/');
    let mut parts = trimmed.split('/');
    let first = parts.next()?;
    let segment = if trimmed.starts_with("companies(") {
        parts.next()?
    } else {
        first
    };
    Some(strip_key(segment))
}

/// Record of the first restricted entity type whose `/<type>` occurs anywhere
/// in `path`, in metadata document order.
///
/// This is a plain substring test: `/item` also matches `/itemCategories`.
pub fn restricted_type_override(path: &str, capabilities: &Capabilities) -> Option<CapabilityRecord> {
    capabilities
        .entity_types
        .iter()
        .filter(|(_, record)| record.is_restricted())
        .find(|(name, _)| path.contains(&format!("/{name}")))
        .map(|(_, record)| *record)
}

/// Resolve the capability record governing `path`, if any.
pub fn resolve_capabilities(
    path: &str,
    path_item: &Value,
    capabilities: &Capabilities,
    namespace: &str,
) -> Option<CapabilityRecord> {
    let found = LookupStrategy::CHAIN
        .iter()
        .find_map(|strategy| strategy.lookup(path, path_item, capabilities, namespace));
    restricted_type_override(path, capabilities).or(found)
}

/// An operation dropped because the metadata disallows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedOperation {
    pub path: String,
    pub method: String,
    /// Capability flag that was false (`insertable`, `updatable`, `deletable`).
    pub reason: String,
}

/// Outcome of [`enforce_capabilities`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enforcement {
    pub operations_removed: Vec<RemovedOperation>,
    /// Paths dropped because enforcement left them without operations.
    pub empty_paths_removed: Vec<String>,
}

const GUARDED_METHODS: [(&str, &str); 3] = [
    ("post", "insertable"),
    ("patch", "updatable"),
    ("delete", "deletable"),
];

/// Remove `post`, `patch` and `delete` operations that violate capability
/// restrictions, then drop paths left with no operations at all.
///
/// A no-op when the document has no `paths` or no capabilities were
/// extracted.
pub fn enforce_capabilities(
    doc: &mut Value,
    capabilities: &Capabilities,
    namespace: &str,
) -> Enforcement {
    let mut outcome = Enforcement::default();
    if capabilities.is_empty() {
        return outcome;
    }
    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return outcome;
    };

    for (path, item) in paths.iter_mut() {
        let Some(record) = resolve_capabilities(path, item, capabilities, namespace) else {
            continue;
        };
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        let before = operation_count(item);
        remove_disallowed(path, item, &record, &mut outcome.operations_removed);
        if before > 0 && operation_count(item) == 0 {
            outcome.empty_paths_removed.push(path.clone());
        }
    }

    for path in &outcome.empty_paths_removed {
        paths.shift_remove(path);
        info!("removed {} (no operations left)", path);
    }

    if outcome.operations_removed.is_empty() {
        info!("no HTTP methods needed to be removed for capability compliance");
    } else {
        info!(
            "enforced capabilities: removed {} HTTP methods",
            outcome.operations_removed.len()
        );
    }
    outcome
}

fn remove_disallowed(
    path: &str,
    item: &mut Map<String, Value>,
    record: &CapabilityRecord,
    removed: &mut Vec<RemovedOperation>,
) {
    for (method, flag) in GUARDED_METHODS {
        if record.allows(method) || item.shift_remove(method).is_none() {
            continue;
        }
        info!(
            "removed {} from {} ({}=false)",
            method.to_uppercase(),
            path,
            flag
        );
        removed.push(RemovedOperation {
            path: path.to_string(),
            method: method.to_string(),
            reason: flag.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_NAMESPACE;
    use serde_json::json;

    fn restricted(insertable: bool, updatable: bool, deletable: bool) -> CapabilityRecord {
        CapabilityRecord {
            insertable,
            updatable,
            deletable,
        }
    }

    fn capabilities() -> Capabilities {
        let mut caps = Capabilities::default();
        caps.insert("items", "item", restricted(true, true, false));
        caps.insert("customers", "customer", CapabilityRecord::default());
        caps.insert("generalLedgerEntries", "generalLedgerEntry", restricted(false, false, false));
        caps
    }

    #[test]
    fn entity_set_of_path_handles_scope() {
        assert_eq!(entity_set_of_path("/companies({id})/items({id})"), Some("items"));
        assert_eq!(entity_set_of_path("/companies({id})/items"), Some("items"));
        assert_eq!(entity_set_of_path("/items(id=1)"), Some("items"));
        assert_eq!(entity_set_of_path("/companies({id})"), None);
    }

    #[test]
    fn entity_set_strategy() {
        let caps = capabilities();
        let found = LookupStrategy::EntitySetName.lookup(
            "/companies({id})/items({id})",
            &json!({}),
            &caps,
            DEFAULT_NAMESPACE,
        );
        assert_eq!(found, Some(restricted(true, true, false)));

        let missing = LookupStrategy::EntitySetName.lookup(
            "/companies({id})/itemAliases",
            &json!({}),
            &caps,
            DEFAULT_NAMESPACE,
        );
        assert_eq!(missing, None);
    }

    #[test]
    fn schema_reference_strategy() {
        let caps = capabilities();
        let item = json!({
            "patch": { "requestBody": { "content": { "application/json": {
                "schema": { "$ref": "#/components/schemas/Microsoft.NAV.item-update" }
            }}}}
        });
        let found = LookupStrategy::SchemaReference.lookup("/whatever", &item, &caps, DEFAULT_NAMESPACE);
        assert_eq!(found, Some(restricted(true, true, false)));
    }

    #[test]
    fn trailing_segment_strategy() {
        let caps = capabilities();
        let found = LookupStrategy::TrailingSegment.lookup(
            "/companies({id})/customers({id})/customer",
            &json!({}),
            &caps,
            DEFAULT_NAMESPACE,
        );
        assert_eq!(found, Some(CapabilityRecord::default()));

        let found = LookupStrategy::TrailingSegment.lookup(
            "/x/item({id})/",
            &json!({}),
            &caps,
            DEFAULT_NAMESPACE,
        );
        assert_eq!(found, Some(restricted(true, true, false)));
    }

    #[test]
    fn chain_stops_at_first_match() {
        let mut caps = Capabilities::default();
        caps.insert("customers", "customer", CapabilityRecord::default());
        caps.insert("vendors", "vendor", restricted(false, true, true));
        // Set name says customers; the schema reference would say vendor.
        let item = json!({
            "get": { "responses": { "200": { "content": { "application/json": {
                "schema": { "$ref": "#/components/schemas/Microsoft.NAV.vendor" }
            }}}}}
        });
        let found = resolve_capabilities("/companies({id})/customers", &item, &caps, DEFAULT_NAMESPACE);
        assert_eq!(found, Some(CapabilityRecord::default()));
    }

    #[test]
    fn override_takes_first_restricted_substring_match() {
        let caps = capabilities();
        assert_eq!(
            restricted_type_override("/companies({id})/customers({id})/item", &caps),
            Some(restricted(true, true, false))
        );
        // Unrestricted types never override.
        assert_eq!(restricted_type_override("/companies({id})/customer", &caps), None);
        // Coarse: a longer name sharing the prefix matches too.
        assert_eq!(
            restricted_type_override("/companies({id})/itemCategories", &caps),
            Some(restricted(true, true, false))
        );
    }

    #[test]
    fn override_beats_direct_match() {
        let caps = capabilities();
        let found = resolve_capabilities(
            "/companies({id})/customers({id})/generalLedgerEntry",
            &json!({}),
            &caps,
            DEFAULT_NAMESPACE,
        );
        assert_eq!(found, Some(restricted(false, false, false)));
    }

    #[test]
    fn removes_only_disallowed_methods() {
        let caps = capabilities();
        let mut doc = json!({
            "paths": {
                "/companies({id})/items({id})": { "get": {}, "patch": {}, "delete": {} },
                "/companies({id})/customers({id})": { "get": {}, "patch": {}, "delete": {} }
            }
        });
        let outcome = enforce_capabilities(&mut doc, &caps, DEFAULT_NAMESPACE);

        let items = &doc["paths"]["/companies({id})/items({id})"];
        assert!(items.get("get").is_some());
        assert!(items.get("patch").is_some());
        assert!(items.get("delete").is_none());
        assert!(doc["paths"]["/companies({id})/customers({id})"].get("delete").is_some());
        assert_eq!(
            outcome.operations_removed,
            vec![RemovedOperation {
                path: "/companies({id})/items({id})".into(),
                method: "delete".into(),
                reason: "deletable".into(),
            }]
        );
        assert!(outcome.empty_paths_removed.is_empty());
    }

    #[test]
    fn drops_paths_left_without_operations() {
        let caps = capabilities();
        let mut doc = json!({
            "paths": {
                "/companies({id})/generalLedgerEntries": {
                    "post": {},
                    "parameters": [{ "$ref": "#/components/parameters/company" }]
                },
                "/companies({id})/generalLedgerEntries({id})": { "get": {}, "patch": {}, "delete": {} }
            }
        });
        let outcome = enforce_capabilities(&mut doc, &caps, DEFAULT_NAMESPACE);

        assert_eq!(outcome.operations_removed.len(), 3);
        assert_eq!(
            outcome.empty_paths_removed,
            vec!["/companies({id})/generalLedgerEntries".to_string()]
        );
        assert!(doc["paths"].get("/companies({id})/generalLedgerEntries").is_none());
        let member = &doc["paths"]["/companies({id})/generalLedgerEntries({id})"];
        assert_eq!(member, &json!({ "get": {} }));
    }

    #[test]
    fn empty_capabilities_is_noop() {
        let mut doc = json!({ "paths": { "/items": { "post": {}, "delete": {} } } });
        let before = doc.clone();
        let outcome = enforce_capabilities(&mut doc, &Capabilities::default(), DEFAULT_NAMESPACE);
        assert_eq!(doc, before);
        assert_eq!(outcome, Enforcement::default());
    }
}
