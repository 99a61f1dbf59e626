use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routes messages between a source endpoint and a target endpoint on the
/// edge router plane.
#[derive(Clone, Debug, Default, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "rules.edgedispatch.io",
    version = "v1alpha1",
    kind = "Rule",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// Name of the source rule endpoint.
    pub source: String,

    /// Source-specific routing properties, e.g. the path to match.
    #[serde(default)]
    pub source_resource: BTreeMap<String, String>,

    /// Name of the target rule endpoint.
    pub target: String,

    /// Target-specific routing properties, e.g. the URL to forward to.
    #[serde(default)]
    pub target_resource: BTreeMap<String, String>,
}

/// An endpoint a `Rule` can route from or to.
#[derive(Clone, Debug, Default, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "rules.edgedispatch.io",
    version = "v1alpha1",
    kind = "RuleEndpoint",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RuleEndpointSpec {
    pub rule_endpoint_type: String,

    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
