//! Shared `company` query parameter.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::paths::COMPANY_ENDPOINTS;
use crate::types::COMPANY_PARAMETER_REF;

/// Endpoint prefixes that operate at tenant level and take no company.
const TENANT_PREFIXES: &[&str] = &[
    "/$batch",
    "/apicategoryroutes",
    "/externalbusinesseventdefinitions",
    "/externaleventsubscriptions",
    "/subscriptions",
];

/// Metadata discovery endpoint, matched case-insensitively.
const ENTITY_DEFINITIONS: &str = "/entitydefinitions";

/// Definition stored under `components.parameters.company`.
pub fn company_parameter() -> Value {
    json!({
        "in": "query",
        "name": "company",
        "description": "The company name to which the request is directed.",
        "required": true,
        "schema": {
            "type": "string",
            "maxLength": 100
        }
    })
}

/// Whether `path` is a tenant-level endpoint that must not get the company
/// parameter.
pub fn is_tenant_endpoint(path: &str) -> bool {
    if TENANT_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }
    let discovery = path
        .get(..ENTITY_DEFINITIONS.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(ENTITY_DEFINITIONS));
    discovery || COMPANY_ENDPOINTS.contains(&path)
}

/// Register the shared company parameter and reference it from every path
/// that is not a tenant-level endpoint.
///
/// The reference goes into the path item's own `parameters` array and is
/// never added twice. Returns the number of paths that received it.
pub fn add_company_parameter(doc: &mut Map<String, Value>) -> usize {
    if let Some(parameters) =
        object_entry(doc, "components").and_then(|c| object_entry(c, "parameters"))
    {
        parameters.insert("company".to_string(), company_parameter());
    }

    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut injected = 0;
    for (path, item) in paths.iter_mut() {
        if is_tenant_endpoint(path) {
            continue;
        }
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        let parameters = item
            .entry("parameters")
            .or_insert_with(|| Value::Array(Vec::new()));
        let Some(parameters) = parameters.as_array_mut() else {
            continue;
        };
        if parameters.iter().any(is_company_ref) {
            continue;
        }
        parameters.push(json!({ "$ref": COMPANY_PARAMETER_REF }));
        injected += 1;
    }

    if injected > 0 {
        info!("added company parameter reference to {} paths", injected);
    }
    injected
}

fn is_company_ref(parameter: &Value) -> bool {
    parameter.get("$ref").and_then(Value::as_str) == Some(COMPANY_PARAMETER_REF)
}

/// Get `map[key]` as an object, replacing anything that is not one.
pub(crate) fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn tenant_endpoints() {
        assert!(is_tenant_endpoint("/$batch"));
        assert!(is_tenant_endpoint("/subscriptions({id})"));
        assert!(is_tenant_endpoint("/entityDefinitions"));
        assert!(is_tenant_endpoint("/EntityDefinitions({id})"));
        assert!(is_tenant_endpoint("/companies"));
        assert!(is_tenant_endpoint("/companies({id})"));
        assert!(!is_tenant_endpoint("/companies({id})/items"));
        assert!(!is_tenant_endpoint("/items"));
        assert!(!is_tenant_endpoint("/APICATEGORYROUTES"));
    }

    #[test]
    fn registers_shared_definition() {
        let mut d = doc(json!({ "paths": {} }));
        add_company_parameter(&mut d);
        assert_eq!(d["components"]["parameters"]["company"], company_parameter());
        assert_eq!(d["components"]["parameters"]["company"]["required"], json!(true));
    }

    #[test]
    fn injects_reference_into_entity_paths() {
        let mut d = doc(json!({
            "components": { "schemas": {} },
            "paths": {
                "/companies({id})/items": { "get": {} },
                "/items": { "get": {}, "parameters": [{ "$ref": "#/components/parameters/top" }] },
                "/companies": { "get": {} },
                "/$batch": { "post": {} }
            }
        }));
        let injected = add_company_parameter(&mut d);

        assert_eq!(injected, 2);
        assert_eq!(
            d["paths"]["/companies({id})/items"]["parameters"],
            json!([{ "$ref": COMPANY_PARAMETER_REF }])
        );
        assert_eq!(
            d["paths"]["/items"]["parameters"],
            json!([
                { "$ref": "#/components/parameters/top" },
                { "$ref": COMPANY_PARAMETER_REF }
            ])
        );
        assert!(d["paths"]["/companies"].get("parameters").is_none());
        assert!(d["paths"]["/$batch"].get("parameters").is_none());
        assert!(d["components"].get("schemas").is_some());
    }

    #[test]
    fn injection_is_idempotent() {
        let mut d = doc(json!({ "paths": { "/items": { "get": {} } } }));
        assert_eq!(add_company_parameter(&mut d), 1);
        assert_eq!(add_company_parameter(&mut d), 0);
        assert_eq!(d["paths"]["/items"]["parameters"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn non_object_components_are_replaced() {
        let mut d = doc(json!({ "components": "broken", "paths": { "/items": {} } }));
        assert_eq!(add_company_parameter(&mut d), 1);
        assert_eq!(d["components"]["parameters"]["company"], company_parameter());
    }

    #[test]
    fn object_entry_keeps_existing_objects() {
        let mut d = doc(json!({ "components": { "schemas": { "a": {} } } }));
        let components = object_entry(&mut d, "components").unwrap();
        assert!(components.contains_key("schemas"));
    }

    #[test]
    fn missing_paths_still_registers_definition() {
        let mut d = Map::new();
        assert_eq!(add_company_parameter(&mut d), 0);
        assert!(d["components"]["parameters"].get("company").is_some());
    }
}
