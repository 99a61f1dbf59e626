use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declarative workload targeted at edge clusters.
///
/// The dispatch core treats the mission body as an opaque payload; only its
/// name participates in routing and reconciliation.
#[derive(Clone, Debug, Default, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(group = "clusters.edgedispatch.io", version = "v1alpha1", kind = "Mission")]
#[serde(rename_all = "camelCase")]
pub struct MissionSpec {
    /// The workload manifest to realize in the selected clusters.
    #[serde(default)]
    pub content: serde_json::Value,

    pub placement: Option<MissionPlacement>,

    pub state_check: Option<StateCheck>,
}

/// Selects the edge clusters a mission is placed into.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissionPlacement {
    pub clusters: Option<Vec<ClusterReference>>,
    pub match_labels: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ClusterReference {
    pub name: String,
}

/// Probe run in the edge cluster to judge whether a mission converged.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateCheck {
    pub command: Option<String>,
    pub value: Option<String>,
}

/// A remote cluster capable of hosting missions.
#[derive(Clone, Debug, Default, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "clusters.edgedispatch.io",
    version = "v1alpha1",
    kind = "EdgeCluster",
    status = "EdgeClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct EdgeClusterSpec {
    /// Kubeconfig used by the edge agent to reach the hosted cluster.
    pub kubeconfig: Option<String>,

    pub kube_distro: Option<String>,
}

/// State reported upstream by the edge cluster's agent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeClusterStatus {
    pub health_status: Option<String>,

    /// Names of the missions the cluster acknowledges having received.
    #[serde(default)]
    pub received_missions: Vec<String>,
}
