use crate::{
    controller::send,
    manager::{EventKind, Manager},
    LocationCache,
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps the edge-node roster current.
///
/// Node events drive cache state rather than fanning out: readiness changes
/// reach edges indirectly through the other loops. Only a deletion is
/// announced, routed to the node itself.
pub(crate) async fn sync_nodes(
    mut events: Manager<k8s::Node>,
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

        let node = event.object;
        let name = node.name_any();
        match event.kind {
            EventKind::Added | EventKind::Modified => {
                let Some(status) = ready_status(&node) else {
                    continue;
                };
                let prior = cache.node_status(&name);
                cache.update_edge_node(&name, &status);
                if status == "True" && prior.as_deref() != Some("True") {
                    debug!(node = %name, "Edge node ready");
                }
            }
            EventKind::Deleted => {
                cache.delete_node(&name);

                // The path keeps a literal `namespace` segment: node
                // deletions are not namespaced but edges expect the
                // four-segment form.
                let path = match resource::for_object(&name, "namespace", resource::NODE, &name) {
                    Ok(path) => path,
                    Err(error) => {
                        warn!(%error, "Failed to build message resource");
                        continue;
                    }
                };
                send(&*messages, Message::new(Router::new(path, Operation::Delete)));
            }
        }
    }
}

/// The status of a node's `Ready` condition, if reported.
pub(crate) fn ready_status(node: &k8s::Node) -> Option<String> {
    node.status
        .as_ref()?
        .conditions
        .as_ref()?
        .iter()
        .find(|condition| condition.type_ == "Ready")
        .map(|condition| condition.status.clone())
}
