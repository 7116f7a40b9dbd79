//! Cleanup of `-create` / `-update` schema variants.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tracing::info;

use crate::index::{collect_schema_refs, mutation_base_type};
use crate::types::{Capabilities, MutationKind, SYSTEM_AUDIT_FIELDS};

/// Remove mutation schemas that no remaining operation references, or whose
/// entity type disallows that kind of write.
///
/// A `-create` schema must be referenced from some `post` operation and a
/// `-update` schema from some `patch` operation. Read schemas are never
/// touched. Returns the removed schema names, sorted.
pub fn remove_unused_schema_variants(
    doc: &mut Value,
    capabilities: &Capabilities,
    namespace: &str,
) -> Vec<String> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut referenced: HashMap<MutationKind, BTreeSet<String>> = HashMap::new();
    for item in paths.values() {
        for kind in MutationKind::ALL {
            if let Some(operation) = item.get(kind.method()) {
                collect_schema_refs(operation, referenced.entry(kind).or_default());
            }
        }
    }

    let Some(schemas) = doc
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(Value::as_object_mut)
    else {
        return Vec::new();
    };

    let mut unreferenced = 0;
    let mut to_remove = BTreeSet::new();
    for name in schemas.keys() {
        let Some(kind) = MutationKind::of_schema(name) else {
            continue;
        };
        let used = referenced.get(&kind).is_some_and(|refs| refs.contains(name));
        if !used {
            unreferenced += 1;
        }
        let permitted = capabilities
            .for_entity_type(mutation_base_type(name, namespace))
            .map_or(true, |record| kind.permitted_by(record));
        if !used || !permitted {
            to_remove.insert(name.clone());
        }
    }

    for name in &to_remove {
        schemas.shift_remove(name);
    }

    if to_remove.is_empty() {
        info!("no unused schema variants found to remove");
    } else {
        info!(
            "removed {} schema variants ({} unreferenced)",
            to_remove.len(),
            unreferenced
        );
    }
    to_remove.into_iter().collect()
}

/// Remove system audit properties from every `-create` / `-update` schema.
///
/// Returns `(schemas_modified, fields_removed)`.
pub fn remove_system_fields(doc: &mut Value) -> (usize, usize) {
    let Some(schemas) = doc
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(Value::as_object_mut)
    else {
        return (0, 0);
    };

    let mut schemas_modified = 0;
    let mut fields_removed = 0;
    for (name, schema) in schemas.iter_mut() {
        if MutationKind::of_schema(name).is_none() {
            continue;
        }
        let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) else {
            continue;
        };
        let removed = SYSTEM_AUDIT_FIELDS
            .iter()
            .filter(|field| properties.shift_remove(**field).is_some())
            .count();
        if removed > 0 {
            schemas_modified += 1;
            fields_removed += removed;
        }
    }

    if schemas_modified > 0 {
        info!(
            "removed {} system audit fields from {} create/update schemas",
            fields_removed, schemas_modified
        );
    } else {
        info!("no system audit fields found in create/update schemas");
    }
    (schemas_modified, fields_removed)
}
