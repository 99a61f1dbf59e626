//! Downstream dispatch core.
//!
//! The cloud side of the control plane watches the following cluster
//! resources and propagates the changes each edge needs to see through the
//! message layer:
//!
//! - Each `Pod` scheduled on an edge node is forwarded to that node. Its
//!   configmap and secret mounts are recorded so those objects can be fanned
//!   out too.
//! - `ConfigMap`s and `Secret`s are forwarded to every edge node with a pod
//!   currently referencing them.
//! - `Node` events keep the edge-node roster (and its readiness) current;
//!   node deletions are announced to the node itself.
//! - `Rule`s and `RuleEndpoint`s configure the router plane and are
//!   broadcast without a destination.
//! - `Mission`s fan out to every registered edge cluster, and `EdgeCluster`
//!   state reports trigger a mission resync when a cluster's view drifts
//!   from the cloud's.
//!
//! ```ignore
//! watch -> Manager<T> queue -> sync loop -> LocationCache -> MessageLayer
//! ```
//!
//! The [`LocationCache`] is the only shared mutable state: a multi-index
//! answering "which edges need to see this object right now". Each resource
//! kind runs its own loop over a dedicated queue; all loops share the cache
//! and the message sink and stop on a common shutdown signal. Delivery is
//! best-effort: failures are logged and dropped, and the authoritative store
//! replays state on resync.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cache;
mod cluster_config;
mod configmap;
mod controller;
mod edge_cluster;
mod manager;
mod mission;
mod node;
mod pod;
mod resource_id;
mod rule;
mod secret;
mod store;

pub use self::{
    cache::LocationCache,
    cluster_config::ClusterConfig,
    controller::{Controller, ResourceManagers},
    manager::{Event, EventKind, Manager},
    resource_id::ResourceId,
    store::Store,
};
