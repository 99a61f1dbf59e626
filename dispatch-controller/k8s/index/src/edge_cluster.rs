use crate::{
    controller::send,
    manager::{EventKind, Manager},
    LocationCache, Store,
};
use ahash::AHashSet as HashSet;
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reconciles each edge cluster's reported mission set against the cloud's.
///
/// When a cluster's state report names a different set of missions than the
/// cloud holds, the full mission list is pushed to that cluster; a matching
/// report produces nothing.
pub(crate) async fn sync_edge_clusters(
    mut events: Manager<k8s::EdgeCluster>,
    cache: Arc<LocationCache>,
    missions: Store<k8s::Mission>,
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

        let cluster = event.object;
        let name = cluster.name_any();
        match event.kind {
            EventKind::Added | EventKind::Modified => {
                let missions_in_edge = cluster
                    .status
                    .as_ref()
                    .map(|status| {
                        status
                            .received_missions
                            .iter()
                            .cloned()
                            .collect::<HashSet<_>>()
                    })
                    .unwrap_or_default();

                let mut missions_in_cloud = missions.list();
                missions_in_cloud.sort_by_key(|mission| mission.name_any());
                let cloud_names = missions_in_cloud
                    .iter()
                    .map(|mission| mission.name_any())
                    .collect::<HashSet<_>>();

                if missions_in_edge == cloud_names {
                    continue;
                }
                debug!(
                    cluster = %name,
                    edge = missions_in_edge.len(),
                    cloud = cloud_names.len(),
                    "Resyncing missions",
                );

                let path = match resource::for_object(
                    &name,
                    resource::DEFAULT_NAMESPACE,
                    resource::MISSION_LIST,
                    "",
                ) {
                    Ok(path) => path,
                    Err(error) => {
                        warn!(%error, "Failed to build message resource");
                        continue;
                    }
                };
                send(
                    &*messages,
                    Message::new(Router::new(path, Operation::Update))
                        .payload(Payload::MissionList(missions_in_cloud)),
                );
            }
            EventKind::Deleted => cache.delete_edge_cluster(&name),
        }
    }
}
