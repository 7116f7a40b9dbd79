//! Core types for capability-aware document enhancement.

use std::collections::HashMap;

/// JSON Pointer prefix of the reusable schema namespace.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Reference to the shared company query parameter.
pub const COMPANY_PARAMETER_REF: &str = "#/components/parameters/company";

/// Provider namespace used by Business Central schema names.
pub const DEFAULT_NAMESPACE: &str = "Microsoft.NAV";

/// Path prefix of company-scoped entity paths.
pub const COMPANY_SCOPE: &str = "/companies({id})/";

/// Operation keys of an OpenAPI path item.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Audit properties the service manages itself; never accepted on write.
pub const SYSTEM_AUDIT_FIELDS: &[&str] = &[
    "systemCreatedAt",
    "systemCreatedBy",
    "systemModifiedAt",
    "systemModifiedBy",
];

/// Insert/update/delete permissions of one entity set.
///
/// Every flag defaults to `true`; restriction annotations may clear any of
/// them independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityRecord {
    pub insertable: bool,
    pub updatable: bool,
    pub deletable: bool,
}

impl Default for CapabilityRecord {
    fn default() -> Self {
        Self {
            insertable: true,
            updatable: true,
            deletable: true,
        }
    }
}

impl CapabilityRecord {
    /// True when at least one operation is disallowed.
    pub fn is_restricted(&self) -> bool {
        !(self.insertable && self.updatable && self.deletable)
    }

    /// Names of the disallowed operations, in insert/update/delete order.
    pub fn restricted_operations(&self) -> Vec<&'static str> {
        let mut ops = Vec::new();
        if !self.insertable {
            ops.push("insertable");
        }
        if !self.updatable {
            ops.push("updatable");
        }
        if !self.deletable {
            ops.push("deletable");
        }
        ops
    }

    /// Whether `method` is still permitted under this record.
    pub fn allows(&self, method: &str) -> bool {
        match method {
            "post" => self.insertable,
            "patch" => self.updatable,
            "delete" => self.deletable,
            _ => true,
        }
    }
}

/// Insertion-ordered name → record table.
///
/// Re-inserting a name replaces its record but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: Vec<(String, CapabilityRecord)>,
    index: HashMap<String, usize>,
}

impl CapabilityTable {
    pub fn insert(&mut self, name: impl Into<String>, record: CapabilityRecord) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, record));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityRecord> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capability restrictions extracted from one metadata document.
///
/// Owned by a single conversion run; records are keyed both by entity-set
/// name and by the bare name of the entity type backing the set.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub entity_sets: CapabilityTable,
    pub entity_types: CapabilityTable,
}

impl Capabilities {
    /// Record the capabilities of `entity_set`, backed by `entity_type`.
    pub fn insert(&mut self, entity_set: &str, entity_type: &str, record: CapabilityRecord) {
        self.entity_sets.insert(entity_set, record);
        self.entity_types.insert(entity_type, record);
    }

    pub fn for_entity_set(&self, name: &str) -> Option<&CapabilityRecord> {
        self.entity_sets.get(name)
    }

    pub fn for_entity_type(&self, name: &str) -> Option<&CapabilityRecord> {
        self.entity_types.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entity_sets.is_empty()
    }
}

/// Write-side schema variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
}

impl MutationKind {
    pub const ALL: [MutationKind; 2] = [MutationKind::Create, MutationKind::Update];

    /// Schema name suffix of this variant.
    pub fn suffix(&self) -> &'static str {
        match self {
            MutationKind::Create => "-create",
            MutationKind::Update => "-update",
        }
    }

    /// HTTP method whose request body uses this variant.
    pub fn method(&self) -> &'static str {
        match self {
            MutationKind::Create => "post",
            MutationKind::Update => "patch",
        }
    }

    /// Detect the variant from a schema name.
    pub fn of_schema(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| name.ends_with(kind.suffix()))
    }

    /// Whether `record` permits this kind of write.
    pub fn permitted_by(&self, record: &CapabilityRecord) -> bool {
        record.allows(self.method())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_allows_everything() {
        let record = CapabilityRecord::default();
        assert!(record.insertable && record.updatable && record.deletable);
        assert!(!record.is_restricted());
        assert!(record.restricted_operations().is_empty());
    }

    #[test]
    fn flags_are_independent() {
        let record = CapabilityRecord {
            updatable: false,
            ..Default::default()
        };
        assert!(record.is_restricted());
        assert!(record.allows("post"));
        assert!(!record.allows("patch"));
        assert!(record.allows("delete"));
        assert!(record.allows("get"));
        assert_eq!(record.restricted_operations(), vec!["updatable"]);
    }

    #[test]
    fn table_keeps_first_position_on_replace() {
        let mut table = CapabilityTable::default();
        table.insert("item", CapabilityRecord::default());
        table.insert("customer", CapabilityRecord::default());
        let restricted = CapabilityRecord {
            deletable: false,
            ..Default::default()
        };
        table.insert("item", restricted);

        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["item", "customer"]);
        assert_eq!(table.get("item"), Some(&restricted));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn mutation_kind_of_schema() {
        assert_eq!(
            MutationKind::of_schema("Microsoft.NAV.item-create"),
            Some(MutationKind::Create)
        );
        assert_eq!(
            MutationKind::of_schema("Microsoft.NAV.item-update"),
            Some(MutationKind::Update)
        );
        assert_eq!(MutationKind::of_schema("Microsoft.NAV.item"), None);
    }
}
