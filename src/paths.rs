//! Navigation path pruning.
//!
//! The converter emits a path for every navigation property reachable from
//! every entity set, several levels deep. Only first-level access is kept:
//!
//! | Path | Kept |
//! |------|------|
//! | `/companies({id})/items` | yes |
//! | `/companies({id})/items({id})` | yes |
//! | `/companies({id})/items({id})/picture` | no |
//! | `/companies({id})/items({id})/picture/content` | no |
//! | `/subscriptions({id})` | yes (system endpoint) |

use serde_json::Value;
use tracing::{debug, info};

use crate::index::{is_key_segment, segments};
use crate::types::COMPANY_SCOPE;

/// Tenant-level endpoints exempt from navigation pruning.
pub const SYSTEM_ENDPOINTS: &[&str] = &[
    "/$batch",
    "/apicategoryroutes",
    "/entitydefinitions",
    "/externalbusinesseventdefinitions",
    "/externaleventsubscriptions",
    "/subscriptions",
    "/entityDefinitions",
];

/// Tenant-level company endpoints, matched exactly.
pub const COMPANY_ENDPOINTS: &[&str] = &["/companies", "/companies({id})"];

/// How a path relates to the company scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind<'a> {
    /// Tenant-level system endpoint.
    System,
    /// Under `/companies({id})/`; holds the segments after the scope.
    Scoped(Vec<&'a str>),
    /// Not company-related; holds all segments.
    Unscoped(Vec<&'a str>),
    /// Any other `/companies…` path.
    Other,
}

/// Classify a path for navigation pruning.
pub fn classify(path: &str) -> PathKind<'_> {
    if is_system_endpoint(path) {
        return PathKind::System;
    }
    if let Some(rest) = path.strip_prefix(COMPANY_SCOPE) {
        return PathKind::Scoped(segments(rest));
    }
    if path.starts_with("/companies") {
        return PathKind::Other;
    }
    PathKind::Unscoped(segments(path))
}

/// Whether `path` is a system endpoint or a keyed access to one.
pub fn is_system_endpoint(path: &str) -> bool {
    let system = SYSTEM_ENDPOINTS.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('('))
    });
    system || COMPANY_ENDPOINTS.contains(&path)
}

/// Whether the segments after any scope prefix traverse a navigation property.
///
/// Entity access is one segment (`items`, `items({id})`) or an entity followed
/// by a bare key (`items/({id})`); anything else is navigation.
pub fn is_navigation(segments: &[&str]) -> bool {
    match segments {
        [] | [_] => false,
        [_, second] => !is_key_segment(second),
        _ => true,
    }
}

/// Remove navigation property paths from `doc.paths`.
///
/// Returns the number of paths removed. A document without `paths` is left
/// untouched.
pub fn remove_navigation_paths(doc: &mut Value) -> usize {
    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return 0;
    };

    let total = paths.len();
    let mut scoped_checked = 0;
    let mut system_skipped = 0;
    let mut to_remove = Vec::new();

    for path in paths.keys() {
        let navigation = match classify(path) {
            PathKind::System => {
                system_skipped += 1;
                false
            }
            PathKind::Scoped(segs) => {
                scoped_checked += 1;
                is_navigation(&segs)
            }
            PathKind::Unscoped(segs) => is_navigation(&segs),
            PathKind::Other => false,
        };
        if navigation {
            to_remove.push(path.clone());
        }
    }

    for path in &to_remove {
        paths.shift_remove(path);
        debug!("removed navigation path {}", path);
    }

    info!(
        "checked {} company paths, skipped {} system paths out of {} total paths",
        scoped_checked, system_skipped, total
    );
    if to_remove.is_empty() {
        info!("no navigation property paths found to remove");
    } else {
        info!("removed {} navigation property paths", to_remove.len());
    }
    to_remove.len()
}
