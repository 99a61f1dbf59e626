use crate::{
    controller::send,
    manager::{EventKind, Manager},
    LocationCache,
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fans each secret change out to every edge node with a pod referencing it.
///
/// Unlike configmaps, a secret addition is sent as an `update`: deployed
/// edges apply updates idempotently but reject inserts for objects they
/// already hold.
pub(crate) async fn sync_secrets(
    mut events: Manager<k8s::Secret>,
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

        let secret = event.object;
        let operation = match event.kind {
            // TODO: map Added back to insert once every deployed edge
            // accepts secret inserts.
            EventKind::Added | EventKind::Modified => Operation::Update,
            EventKind::Deleted => Operation::Delete,
        };

        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let nodes = cache.secret_nodes(&namespace, &name);
        if event.kind == EventKind::Deleted {
            cache.delete_secret(&namespace, &name);
        }
        debug!(nodes = nodes.len(), %operation, "Syncing secret");

        for node in nodes {
            let path = match resource::for_object(&node, &namespace, resource::SECRET, &name) {
                Ok(path) => path,
                Err(error) => {
                    warn!(%error, "Failed to build message resource");
                    continue;
                }
            };
            send(
                &*messages,
                Message::new(Router::new(path, operation))
                    .resource_version(secret.resource_version())
                    .payload(Payload::Secret(secret.clone())),
            );
        }
    }
}
