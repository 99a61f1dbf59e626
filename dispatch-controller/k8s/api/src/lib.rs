#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod edge_cluster;
pub mod rule;
pub mod watch;

pub use self::{
    edge_cluster::{EdgeCluster, EdgeClusterStatus, Mission},
    rule::{Rule, RuleEndpoint},
    watch::Watch,
};
pub use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapEnvSource, ConfigMapProjection, ConfigMapVolumeSource, Container,
    EnvFromSource, Node, NodeCondition, NodeSpec, NodeStatus, Pod, PodSpec, ProjectedVolumeSource,
    Secret, SecretEnvSource, SecretProjection, SecretVolumeSource, Volume, VolumeProjection,
};
pub use kube::{
    api::{Api, ListParams, ObjectMeta, Resource, ResourceExt},
    runtime::watcher,
    Client, Error,
};
