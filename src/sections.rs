//! Publication boilerplate: `info`, `servers`, `security` and the OAuth2
//! security scheme for Business Central.

use serde_json::{json, Value};

const DESCRIPTION_TEMPLATE: &str = include_str!("../templates/description.md");

/// Display name used when no API name is given.
pub const DEFAULT_API_NAME: &str = "Business Central";

/// OpenAPI version written to every enhanced document.
pub const OPENAPI_VERSION: &str = "3.1.1";

const DEFAULT_API_VERSION: &str = "v2.0";
const DEFAULT_TENANT_PLACEHOLDER: &str = "{tenant_Id}";
const SECURITY_SCHEME: &str = "oauth2_client_credentials";

/// Build the `info` section.
pub fn info(title: Option<&str>, description: Option<&str>, api_name: Option<&str>) -> Value {
    let api_name = api_name.unwrap_or(DEFAULT_API_NAME);
    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| format!("{api_name} API"));
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| default_description(api_name));
    json!({
        "title": title,
        "description": description
    })
}

/// Getting Started markdown for `api_name`.
pub fn default_description(api_name: &str) -> String {
    DESCRIPTION_TEMPLATE
        .trim_end()
        .replace("{api_name}", api_name)
}

/// Build the `servers` section.
///
/// The URL embeds the lowercased API name and keeps `{EnvironmentName}` as a
/// server variable.
pub fn servers(api_name: Option<&str>, api_version: Option<&str>) -> Value {
    let api_name = api_name.unwrap_or("api").to_lowercase();
    let api_version = api_version.unwrap_or(DEFAULT_API_VERSION);
    json!([{
        "url": format!(
            "https://api.businesscentral.dynamics.com/v2.0/{{EnvironmentName}}/api/linc/{api_name}/{api_version}"
        ),
        "variables": {
            "EnvironmentName": {
                "default": "Production",
                "description": "The Business Central environment name"
            }
        }
    }])
}

/// Build the top-level `security` requirement.
pub fn security() -> Value {
    json!([{ SECURITY_SCHEME: [] }])
}

/// Build `components.securitySchemes`.
pub fn security_schemes(tenant_placeholder: Option<&str>) -> Value {
    let tenant = tenant_placeholder.unwrap_or(DEFAULT_TENANT_PLACEHOLDER);
    json!({
        SECURITY_SCHEME: {
            "type": "oauth2",
            "description": "OAuth2 Client Credentials Flow for Business Central API",
            "flows": {
                "clientCredentials": {
                    "tokenUrl": format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"),
                    "scopes": {
                        "https://api.businesscentral.dynamics.com/.default": "Default Scope for Business Central API"
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_defaults() {
        let info = info(None, None, Some("produceLinc"));
        assert_eq!(info["title"], "produceLinc API");
        let description = info["description"].as_str().unwrap();
        assert!(description.starts_with("# Getting Started"));
        assert!(description.contains("for the produceLinc API."));
        assert!(!description.contains("{api_name}"));
        // Placeholder meant for the reader, not for substitution.
        assert!(description.contains("`{tenant_id}`"));
    }

    #[test]
    fn info_overrides() {
        let info = info(Some("My API"), Some("Docs"), None);
        assert_eq!(info, json!({ "title": "My API", "description": "Docs" }));
    }

    #[test]
    fn servers_lowercase_api_name() {
        let servers = servers(Some("ProduceLinc"), Some("v1.0"));
        assert_eq!(
            servers[0]["url"],
            "https://api.businesscentral.dynamics.com/v2.0/{EnvironmentName}/api/linc/producelinc/v1.0"
        );
        assert_eq!(servers[0]["variables"]["EnvironmentName"]["default"], "Production");
    }

    #[test]
    fn servers_defaults() {
        let servers = servers(None, None);
        assert!(servers[0]["url"].as_str().unwrap().ends_with("/api/linc/api/v2.0"));
    }

    #[test]
    fn security_scheme_token_url() {
        let schemes = security_schemes(Some("{{tenant_id}}"));
        assert_eq!(
            schemes["oauth2_client_credentials"]["flows"]["clientCredentials"]["tokenUrl"],
            "https://login.microsoftonline.com/{{tenant_id}}/oauth2/v2.0/token"
        );
        let schemes = security_schemes(None);
        assert!(schemes["oauth2_client_credentials"]["flows"]["clientCredentials"]["tokenUrl"]
            .as_str()
            .unwrap()
            .contains("/{tenant_Id}/"));
        assert_eq!(security(), json!([{ "oauth2_client_credentials": [] }]));
    }
}
