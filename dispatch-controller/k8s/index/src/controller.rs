use crate::{
    configmap, edge_cluster, manager::Manager, mission, node, pod, rule, secret, ClusterConfig,
    LocationCache, Store,
};
use anyhow::{Context, Result};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{Message, MessageLayer};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// The per-kind event queues feeding the sync loops.
pub struct ResourceManagers {
    pub pods: Manager<k8s::Pod>,
    pub configmaps: Manager<k8s::ConfigMap>,
    pub secrets: Manager<k8s::Secret>,
    pub nodes: Manager<k8s::Node>,
    pub rules: Manager<k8s::Rule>,
    pub rule_endpoints: Manager<k8s::RuleEndpoint>,
    pub missions: Manager<k8s::Mission>,
    pub edge_clusters: Manager<k8s::EdgeCluster>,
}

/// Aggregates the sync loops, owns the location cache, and performs initial
/// cache priming.
pub struct Controller {
    config: ClusterConfig,
    cache: Arc<LocationCache>,
    messages: Arc<dyn MessageLayer>,
    managers: ResourceManagers,
    missions: Store<k8s::Mission>,
}

impl Controller {
    pub fn new(
        config: ClusterConfig,
        messages: Arc<dyn MessageLayer>,
        managers: ResourceManagers,
        missions: Store<k8s::Mission>,
    ) -> Self {
        Self {
            config,
            cache: Arc::new(LocationCache::default()),
            messages,
            managers,
            missions,
        }
    }

    /// A handle to the shared location cache.
    pub fn cache(&self) -> Arc<LocationCache> {
        self.cache.clone()
    }

    /// Lists edge nodes, pods, and edge clusters from the API server and
    /// primes the cache. Failures here are fatal: without a primed cache the
    /// loops would drop edge-bound state.
    pub async fn init_locating(&self, client: &k8s::Client) -> Result<()> {
        let selector = self.config.edge_node_selector();
        let nodes = k8s::Api::<k8s::Node>::all(client.clone())
            .list(&k8s::ListParams::default().labels(&selector))
            .await
            .context("listing edge nodes")?;
        let pods = k8s::Api::<k8s::Pod>::all(client.clone())
            .list(&k8s::ListParams::default())
            .await
            .context("listing pods")?;
        let edge_clusters = k8s::Api::<k8s::EdgeCluster>::all(client.clone())
            .list(&k8s::ListParams::default())
            .await
            .context("listing edge clusters")?;

        self.prime(nodes.items, pods.items, edge_clusters.items);
        info!("Location cache primed");
        Ok(())
    }

    /// Primes the cache from listed cluster state: every labeled node with
    /// its `Ready` status, the mount references of every pod scheduled on an
    /// edge node, and every edge cluster. Re-running against unchanged
    /// inputs leaves the cache as it was.
    pub fn prime(
        &self,
        nodes: Vec<k8s::Node>,
        pods: Vec<k8s::Pod>,
        edge_clusters: Vec<k8s::EdgeCluster>,
    ) {
        for n in nodes.iter() {
            let status = node::ready_status(n).unwrap_or_default();
            self.cache.update_edge_node(n.name_any(), status);
        }
        for pod in pods.iter() {
            let node_name = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.as_deref())
                .unwrap_or_default();
            if self.cache.is_edge_node(node_name) {
                self.cache.add_or_update_pod(pod);
            }
        }
        for cluster in edge_clusters.iter() {
            self.cache.update_edge_cluster(cluster.name_any(), true);
        }
    }

    /// Spawns one task per sync loop. Every loop observes `shutdown` with
    /// priority over its event queue and returns once it fires.
    pub fn start(self, shutdown: drain::Watch) {
        let Self {
            config: _,
            cache,
            messages,
            managers,
            missions,
        } = self;

        tokio::spawn(
            pod::sync_pods(
                managers.pods,
                cache.clone(),
                messages.clone(),
                shutdown.clone(),
            )
            .instrument(info_span!("pods")),
        );
        tokio::spawn(
            configmap::sync_configmaps(
                managers.configmaps,
                cache.clone(),
                messages.clone(),
                shutdown.clone(),
            )
            .instrument(info_span!("configmaps")),
        );
        tokio::spawn(
            secret::sync_secrets(
                managers.secrets,
                cache.clone(),
                messages.clone(),
                shutdown.clone(),
            )
            .instrument(info_span!("secrets")),
        );
        tokio::spawn(
            node::sync_nodes(
                managers.nodes,
                cache.clone(),
                messages.clone(),
                shutdown.clone(),
            )
            .instrument(info_span!("nodes")),
        );
        tokio::spawn(
            rule::sync_rules(managers.rules, messages.clone(), shutdown.clone())
                .instrument(info_span!("rules")),
        );
        tokio::spawn(
            rule::sync_rule_endpoints(managers.rule_endpoints, messages.clone(), shutdown.clone())
                .instrument(info_span!("ruleendpoints")),
        );
        tokio::spawn(
            mission::sync_missions(
                managers.missions,
                cache.clone(),
                messages.clone(),
                shutdown.clone(),
            )
            .instrument(info_span!("missions")),
        );
        tokio::spawn(
            edge_cluster::sync_edge_clusters(
                managers.edge_clusters,
                cache,
                missions,
                messages,
                shutdown,
            )
            .instrument(info_span!("edgeclusters")),
        );
    }
}

/// Hands an envelope to the message layer, logging and discarding failures.
pub(crate) fn send(messages: &dyn MessageLayer, message: Message) {
    let operation = message.router.operation;
    let resource = message.router.resource.clone();
    match messages.send(message) {
        Ok(()) => debug!(%operation, %resource, "Message sent"),
        Err(error) => warn!(%error, %operation, %resource, "Failed to send message"),
    }
}
