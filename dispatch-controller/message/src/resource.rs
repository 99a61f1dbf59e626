//! Slash-delimited resource paths addressing messages at the transport
//! boundary.
//!
//! Namespaced objects are addressed as `<destination>/<namespace>/<kind>/<name>`
//! where the destination is an edge node or edge cluster name. Router-plane
//! objects carry no destination or namespace and are addressed as
//! `<kind>/<name>`.

use thiserror::Error;

pub const POD: &str = "pod";
pub const CONFIGMAP: &str = "configmap";
pub const SECRET: &str = "secret";
pub const NODE: &str = "node";
pub const RULE: &str = "rule";
pub const RULE_ENDPOINT: &str = "ruleendpoint";
pub const MISSION: &str = "mission";
pub const MISSION_LIST: &str = "missionlist";

/// The namespace segment used for cluster-destined messages.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource destination must not be empty")]
    EmptyDestination,
    #[error("resource namespace must not be empty")]
    EmptyNamespace,
    #[error("resource kind must not be empty")]
    EmptyKind,
    #[error("resource name must not be empty")]
    EmptyName,
}

/// Builds the path for an object bound to an edge node or cluster.
///
/// The name may be empty for list-typed payloads, which leaves a trailing
/// slash in the path.
pub fn for_object(
    destination: &str,
    namespace: &str,
    kind: &str,
    name: &str,
) -> Result<String, ResourceError> {
    if destination.is_empty() {
        return Err(ResourceError::EmptyDestination);
    }
    if namespace.is_empty() {
        return Err(ResourceError::EmptyNamespace);
    }
    if kind.is_empty() {
        return Err(ResourceError::EmptyKind);
    }
    Ok(format!("{}/{}/{}/{}", destination, namespace, kind, name))
}

/// Builds the path for a router-plane object.
pub fn for_router(kind: &str, name: &str) -> Result<String, ResourceError> {
    if kind.is_empty() {
        return Err(ResourceError::EmptyKind);
    }
    if name.is_empty() {
        return Err(ResourceError::EmptyName);
    }
    Ok(format!("{}/{}", kind, name))
}
