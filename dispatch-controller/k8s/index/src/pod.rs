use crate::{
    cache::MountRefs,
    controller::send,
    manager::{EventKind, Manager},
    LocationCache,
};
use edge_dispatch_controller_k8s_api::{self as k8s, ResourceExt};
use edge_dispatch_controller_message::{resource, Message, MessageLayer, Operation, Payload, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards each pod scheduled on an edge node to that node, keeping the
/// location cache's mount references current along the way.
pub(crate) async fn sync_pods(
    mut events: Manager<k8s::Pod>,
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

        let pod = event.object;
        let node = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_default();
        if !cache.is_edge_node(&node) {
            continue;
        }

        let namespace = pod.namespace().unwrap_or_default();
        let path = match resource::for_object(&node, &namespace, resource::POD, &pod.name_any()) {
            Ok(path) => path,
            Err(error) => {
                warn!(%error, "Failed to build message resource");
                continue;
            }
        };
        let operation = match event.kind {
            EventKind::Added => {
                cache.add_or_update_pod(&pod);
                Operation::Insert
            }
            EventKind::Modified => {
                cache.add_or_update_pod(&pod);
                Operation::Update
            }
            // The cached mount references outlive the delete; resync prunes
            // them.
            EventKind::Deleted => Operation::Delete,
        };

        let version = pod.resource_version();
        send(
            &*messages,
            Message::new(Router::new(path, operation))
                .resource_version(version)
                .payload(Payload::Pod(pod)),
        );
    }
}

/// Collects the configmaps and secrets a pod spec references through its
/// volumes (including projected sources) and its containers' `envFrom`.
pub(crate) fn mount_refs(spec: &k8s::PodSpec) -> MountRefs {
    let mut refs = MountRefs::default();

    for volume in spec.volumes.iter().flatten() {
        if let Some(name) = volume.config_map.as_ref().and_then(|src| src.name.clone()) {
            refs.configmaps.insert(name);
        }
        if let Some(name) = volume
            .secret
            .as_ref()
            .and_then(|src| src.secret_name.clone())
        {
            refs.secrets.insert(name);
        }
        for source in volume
            .projected
            .iter()
            .flat_map(|projected| projected.sources.iter().flatten())
        {
            if let Some(name) = source.config_map.as_ref().and_then(|src| src.name.clone()) {
                refs.configmaps.insert(name);
            }
            if let Some(name) = source.secret.as_ref().and_then(|src| src.name.clone()) {
                refs.secrets.insert(name);
            }
        }
    }

    for container in spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten())
    {
        for source in container.env_from.iter().flatten() {
            if let Some(name) = source
                .config_map_ref
                .as_ref()
                .and_then(|src| src.name.clone())
            {
                refs.configmaps.insert(name);
            }
            if let Some(name) = source.secret_ref.as_ref().and_then(|src| src.name.clone()) {
                refs.secrets.insert(name);
            }
        }
    }

    refs
}
