use crate::{
    controller::send,
    manager::{EventKind, Manager},
    LocationCache,
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fans each mission change out to every registered edge cluster.
pub(crate) async fn sync_missions(
    mut events: Manager<k8s::Mission>,
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

        let mission = event.object;
        let operation = match event.kind {
            EventKind::Added => Operation::Insert,
            EventKind::Modified => Operation::Update,
            EventKind::Deleted => Operation::Delete,
        };

        let name = mission.name_any();
        let clusters = cache.edge_clusters();
        debug!(clusters = clusters.len(), %operation, "Syncing mission");

        for cluster in clusters {
            let path = match resource::for_object(
                &cluster,
                resource::DEFAULT_NAMESPACE,
                resource::MISSION,
                &name,
            ) {
                Ok(path) => path,
                Err(error) => {
                    warn!(%error, "Failed to build message resource");
                    continue;
                }
            };
            send(
                &*messages,
                Message::new(Router::new(path, operation))
                    .resource_version(mission.resource_version())
                    .payload(Payload::Mission(mission.clone())),
            );
        }
    }
}
