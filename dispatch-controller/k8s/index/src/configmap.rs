use crate::{
    controller::send,
    manager::{EventKind, Manager},
    LocationCache,
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fans each configmap change out to every edge node with a pod referencing
/// it.
pub(crate) async fn sync_configmaps(
    mut events: Manager<k8s::ConfigMap>,
    cache: Arc<LocationCache>,
    messages: Arc<dyn MessageLayer>,
    shutdown: drain::Watch,
) {
    let shutdown = shutdown.signaled();
    tokio::pin!(shutdown);
    loop {
        let event = tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("Shutting down");
                return;
            }
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    warn!("Event queue closed");
                    return;
                }
            },
        };

        let configmap = event.object;
        let operation = match event.kind {
            EventKind::Added => Operation::Insert,
            EventKind::Modified => Operation::Update,
            EventKind::Deleted => Operation::Delete,
        };

        let namespace = configmap.namespace().unwrap_or_default();
        let name = configmap.name_any();
        let nodes = cache.configmap_nodes(&namespace, &name);
        if event.kind == EventKind::Deleted {
            cache.delete_configmap(&namespace, &name);
        }
        debug!(nodes = nodes.len(), %operation, "Syncing configmap");

        for node in nodes {
            let path = match resource::for_object(&node, &namespace, resource::CONFIGMAP, &name) {
                Ok(path) => path,
                Err(error) => {
                    warn!(%error, "Failed to build message resource");
                    continue;
                }
            };
            send(
                &*messages,
                Message::new(Router::new(path, operation))
                    .resource_version(configmap.resource_version())
                    .payload(Payload::ConfigMap(configmap.clone())),
            );
        }
    }
}
