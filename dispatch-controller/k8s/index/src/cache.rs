//! The multi-index answering "which edges need to see this object?"
//!
//! Mutated by the pod, configmap, secret, node, and edge-cluster loops and
//! read by the fan-out loops. Each index has its own lock and no operation
//! spans two of them, so queries return snapshots and callers never hold a
//! lock across a send.

use crate::{pod, ResourceId};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use dashmap::DashMap;
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use parking_lot::RwLock;

/// The configmaps and secrets a pod mounts, by name within the pod's
/// namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MountRefs {
    pub configmaps: HashSet<String>,
    pub secrets: HashSet<String>,
}

#[derive(Debug)]
struct PodEntry {
    node: String,
    refs: MountRefs,
}

/// Tracks which edge nodes and clusters exist and which of them reference
/// each mountable object.
#[derive(Debug, Default)]
pub struct LocationCache {
    /// Edge node name to the status of its `Ready` condition. Membership
    /// defines edgeness.
    edge_nodes: RwLock<HashMap<String, String>>,

    /// Mountable object to the edge nodes whose pods reference it.
    configmap_nodes: RwLock<HashMap<ResourceId, HashSet<String>>>,
    secret_nodes: RwLock<HashMap<ResourceId, HashSet<String>>>,

    /// Edge-scheduled pods with their cached mount references, kept so index
    /// membership can be rebuilt on delta.
    pods: RwLock<HashMap<ResourceId, PodEntry>>,

    /// Registered edge clusters. Iterated concurrently by the mission loop.
    edge_clusters: DashMap<String, bool>,
}

impl LocationCache {
    pub fn is_edge_node(&self, name: &str) -> bool {
        self.edge_nodes.read().contains_key(name)
    }

    pub fn update_edge_node(&self, name: impl ToString, status: impl ToString) {
        self.edge_nodes
            .write()
            .insert(name.to_string(), status.to_string());
    }

    pub fn node_status(&self, name: &str) -> Option<String> {
        self.edge_nodes.read().get(name).cloned()
    }

    /// Forgets a node, scrubbing it out of every configmap/secret membership
    /// set. Emptied sets are pruned.
    pub fn delete_node(&self, name: &str) {
        self.edge_nodes.write().remove(name);
        scrub_node(&mut self.configmap_nodes.write(), name);
        scrub_node(&mut self.secret_nodes.write(), name);
    }

    /// Records a pod's mount references, adding its node to the index entry
    /// of every referenced configmap and secret. On update the diff against
    /// the pod's prior reference set is applied, removing stale memberships.
    pub fn add_or_update_pod(&self, pod: &k8s::Pod) {
        let Some(spec) = pod.spec.as_ref() else {
            return;
        };
        let node = match spec.node_name.as_deref() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => return,
        };
        let id = ResourceId::new(pod.namespace().unwrap_or_default(), pod.name_any());
        let refs = pod::mount_refs(spec);

        let prior = self.pods.write().insert(
            id.clone(),
            PodEntry {
                node: node.clone(),
                refs: refs.clone(),
            },
        );

        // References dropped by this update, or everything the pod used to
        // reference if it moved to another node.
        let (stale_node, stale) = match prior {
            Some(prev) if prev.node == node => {
                let cms = prev
                    .refs
                    .configmaps
                    .difference(&refs.configmaps)
                    .cloned()
                    .collect();
                let secrets = prev
                    .refs
                    .secrets
                    .difference(&refs.secrets)
                    .cloned()
                    .collect();
                (
                    prev.node,
                    MountRefs {
                        configmaps: cms,
                        secrets,
                    },
                )
            }
            Some(prev) => (prev.node, prev.refs),
            None => (String::new(), MountRefs::default()),
        };

        {
            let mut index = self.configmap_nodes.write();
            for cm in stale.configmaps {
                remove_membership(&mut index, &ResourceId::new(id.namespace.clone(), cm), &stale_node);
            }
            for cm in refs.configmaps.iter() {
                index
                    .entry(ResourceId::new(id.namespace.clone(), cm.clone()))
                    .or_default()
                    .insert(node.clone());
            }
        }
        {
            let mut index = self.secret_nodes.write();
            for secret in stale.secrets {
                remove_membership(
                    &mut index,
                    &ResourceId::new(id.namespace.clone(), secret),
                    &stale_node,
                );
            }
            for secret in refs.secrets.iter() {
                index
                    .entry(ResourceId::new(id.namespace.clone(), secret.clone()))
                    .or_default()
                    .insert(node.clone());
            }
        }
    }

    /// Removes a pod's memberships from every affected index entry using its
    /// cached reference set, then forgets the pod.
    pub fn delete_pod(&self, namespace: &str, name: &str) {
        let id = ResourceId::new(namespace.to_string(), name.to_string());
        let Some(entry) = self.pods.write().remove(&id) else {
            return;
        };

        let mut index = self.configmap_nodes.write();
        for cm in entry.refs.configmaps {
            remove_membership(&mut index, &ResourceId::new(id.namespace.clone(), cm), &entry.node);
        }
        drop(index);

        let mut index = self.secret_nodes.write();
        for secret in entry.refs.secrets {
            remove_membership(
                &mut index,
                &ResourceId::new(id.namespace.clone(), secret),
                &entry.node,
            );
        }
    }

    /// Snapshot of the edge nodes referencing a configmap.
    pub fn configmap_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.configmap_nodes
            .read()
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
            .map(|nodes| nodes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the edge nodes referencing a secret.
    pub fn secret_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.secret_nodes
            .read()
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
            .map(|nodes| nodes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn delete_configmap(&self, namespace: &str, name: &str) {
        self.configmap_nodes
            .write()
            .remove(&ResourceId::new(namespace.to_string(), name.to_string()));
    }

    pub fn delete_secret(&self, namespace: &str, name: &str) {
        self.secret_nodes
            .write()
            .remove(&ResourceId::new(namespace.to_string(), name.to_string()));
    }

    pub fn update_edge_cluster(&self, name: impl ToString, present: bool) {
        self.edge_clusters.insert(name.to_string(), present);
    }

    pub fn delete_edge_cluster(&self, name: &str) {
        self.edge_clusters.remove(name);
    }

    /// Snapshot of the registered edge cluster names. Concurrent inserts and
    /// deletes during the walk are tolerated; the view is consistent but not
    /// instantaneous.
    pub fn edge_clusters(&self) -> Vec<String> {
        self.edge_clusters
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

fn remove_membership(
    index: &mut HashMap<ResourceId, HashSet<String>>,
    id: &ResourceId,
    node: &str,
) {
    if let Some(nodes) = index.get_mut(id) {
        nodes.remove(node);
        if nodes.is_empty() {
            index.remove(id);
        }
    }
}

fn scrub_node(index: &mut HashMap<ResourceId, HashSet<String>>, node: &str) {
    index.retain(|_, nodes| {
        nodes.remove(node);
        !nodes.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mk_pod;

    #[test]
    fn pod_update_removes_stale_references() {
        let cache = LocationCache::default();
        cache.update_edge_node("n1", "True");

        let pod = mk_pod("apps", "web-0", "n1", &["cm-a", "cm-b"], &["sec-a"]);
        cache.add_or_update_pod(&pod);
        assert_eq!(cache.configmap_nodes("apps", "cm-a"), vec!["n1"]);
        assert_eq!(cache.secret_nodes("apps", "sec-a"), vec!["n1"]);

        // Dropping cm-b leaves only cm-a behind.
        let pod = mk_pod("apps", "web-0", "n1", &["cm-a"], &[]);
        cache.add_or_update_pod(&pod);
        assert_eq!(cache.configmap_nodes("apps", "cm-a"), vec!["n1"]);
        assert!(cache.configmap_nodes("apps", "cm-b").is_empty());
        assert!(cache.secret_nodes("apps", "sec-a").is_empty());
    }

    #[test]
    fn pod_reschedule_moves_memberships() {
        let cache = LocationCache::default();
        cache.update_edge_node("n1", "True");
        cache.update_edge_node("n2", "True");

        cache.add_or_update_pod(&mk_pod("apps", "web-0", "n1", &["cm-a"], &[]));
        cache.add_or_update_pod(&mk_pod("apps", "web-0", "n2", &["cm-a"], &[]));
        assert_eq!(cache.configmap_nodes("apps", "cm-a"), vec!["n2"]);
    }

    #[test]
    fn delete_pod_prunes_empty_entries() {
        let cache = LocationCache::default();
        cache.update_edge_node("n1", "True");
        cache.add_or_update_pod(&mk_pod("apps", "web-0", "n1", &["cm-a"], &["sec-a"]));

        cache.delete_pod("apps", "web-0");
        assert!(cache.configmap_nodes("apps", "cm-a").is_empty());
        assert!(cache.secret_nodes("apps", "sec-a").is_empty());

        // A second delete is a no-op.
        cache.delete_pod("apps", "web-0");
    }

    #[test]
    fn delete_node_scrubs_every_index() {
        let cache = LocationCache::default();
        cache.update_edge_node("n1", "True");
        cache.update_edge_node("n2", "False");
        cache.add_or_update_pod(&mk_pod("apps", "web-0", "n1", &["cm-a"], &["sec-a"]));
        cache.add_or_update_pod(&mk_pod("apps", "web-1", "n2", &["cm-a"], &[]));

        cache.delete_node("n1");
        assert!(!cache.is_edge_node("n1"));
        assert_eq!(cache.node_status("n1"), None);
        assert_eq!(cache.configmap_nodes("apps", "cm-a"), vec!["n2"]);
        assert!(cache.secret_nodes("apps", "sec-a").is_empty());
    }

    #[test]
    fn unscheduled_pods_are_ignored() {
        let cache = LocationCache::default();
        cache.add_or_update_pod(&mk_pod("apps", "web-0", "", &["cm-a"], &[]));
        assert!(cache.configmap_nodes("apps", "cm-a").is_empty());
    }

    #[test]
    fn edge_cluster_snapshot() {
        let cache = LocationCache::default();
        cache.update_edge_cluster("ec1", true);
        cache.update_edge_cluster("ec2", true);
        cache.delete_edge_cluster("ec1");

        assert_eq!(cache.edge_clusters(), vec!["ec2"]);
    }
}
