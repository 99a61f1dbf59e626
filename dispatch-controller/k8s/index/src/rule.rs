use crate::{
    controller::send,
    manager::{EventKind, Manager},
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Broadcasts router-plane rules. Rules are immutable once created, so only
/// additions and deletions are dispatched.
pub(crate) async fn sync_rules(
    mut events: Manager<k8s::Rule>,
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

        let rule = event.object;
        let name = rule.name_any();
        let operation = match event.kind {
            EventKind::Added => Operation::Insert,
            EventKind::Deleted => Operation::Delete,
            EventKind::Modified => {
                warn!(rule = %name, "Modify is not supported for rules");
                continue;
            }
        };

        let path = match resource::for_router(resource::RULE, &name) {
            Ok(path) => path,
            Err(error) => {
                warn!(%error, "Failed to build message resource");
                continue;
            }
        };
        send(
            &*messages,
            Message::new(Router::new(path, operation))
                .resource_version(rule.resource_version())
                .payload(Payload::Rule(rule)),
        );
    }
}

/// Broadcasts router-plane rule endpoints; same dispatch rules as
/// [`sync_rules`].
pub(crate) async fn sync_rule_endpoints(
    mut events: Manager<k8s::RuleEndpoint>,
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

        let endpoint = event.object;
        let name = endpoint.name_any();
        let operation = match event.kind {
            EventKind::Added => Operation::Insert,
            EventKind::Deleted => Operation::Delete,
            EventKind::Modified => {
                warn!(endpoint = %name, "Modify is not supported for rule endpoints");
                continue;
            }
        };

        let path = match resource::for_router(resource::RULE_ENDPOINT, &name) {
            Ok(path) => path,
            Err(error) => {
                warn!(%error, "Failed to build message resource");
                continue;
            }
        };
        send(
            &*messages,
            Message::new(Router::new(path, operation))
                .resource_version(endpoint.resource_version())
                .payload(Payload::RuleEndpoint(endpoint)),
        );
    }
}
