#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use edge_dispatch_controller_k8s_api::{self as k8s, watcher};
use edge_dispatch_controller_k8s_index::{
    ClusterConfig, Controller, Manager, ResourceManagers, Store,
};
use edge_dispatch_controller_message as message;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[clap(
    name = "edge-dispatch",
    about = "Propagates cluster state downstream to edge nodes and clusters"
)]
struct Args {
    #[clap(
        long,
        default_value = "edge_dispatch=info,warn",
        env = "EDGE_DISPATCH_LOG"
    )]
    log_level: String,

    /// Label key marking a node as an edge node.
    #[clap(long, default_value = "node-role.kubernetes.io/edge")]
    edge_role_key: String,

    /// Expected value of the edge-role label.
    #[clap(long, default_value = "")]
    edge_role_value: String,

    /// Capacity of each per-kind event queue.
    #[clap(long, default_value = "1024")]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        log_level,
        edge_role_key,
        edge_role_value,
        queue_capacity,
    } = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(log_level)?)
        .init();

    let config = ClusterConfig {
        edge_role_key,
        edge_role_value,
    };
    let client = k8s::Client::try_default().await?;

    // Only labeled nodes participate; everything else is watched unfiltered.
    let node_watch = watcher::watcher(
        k8s::Api::<k8s::Node>::all(client.clone()),
        watcher::Config::default().labels(&config.edge_node_selector()),
    );

    let missions = Store::new();
    let managers = ResourceManagers {
        pods: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::Pod>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
        configmaps: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::ConfigMap>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
        secrets: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::Secret>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
        nodes: Manager::spawn(node_watch, queue_capacity),
        rules: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::Rule>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
        rule_endpoints: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::RuleEndpoint>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
        missions: Manager::spawn_shared(
            watcher::watcher(
                k8s::Api::<k8s::Mission>::all(client.clone()),
                watcher::Config::default(),
            ),
            missions.clone(),
            queue_capacity,
        ),
        edge_clusters: Manager::spawn(
            watcher::watcher(
                k8s::Api::<k8s::EdgeCluster>::all(client.clone()),
                watcher::Config::default(),
            ),
            queue_capacity,
        ),
    };

    // Envelopes leave the process as JSON lines on stdout; the bus adapter
    // consuming them is deployed alongside.
    let (layer, mut outbound) = message::channel();
    tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(line) => println!("{}", line),
                Err(error) => warn!(%error, "Failed to encode message"),
            }
        }
    });

    let controller = Controller::new(config, Arc::new(layer), managers, missions);
    controller.init_locating(&client).await?;

    let (signal, shutdown) = drain::channel();
    controller.start(shutdown);
    info!("Downstream controller started");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    signal.drain().await;

    Ok(())
}
