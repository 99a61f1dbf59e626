use crate::{store, Store};
use edge_dispatch_controller_k8s_api::{watcher, ResourceExt, Watch};
use tokio::sync::mpsc;

/// An informer-style delta observed for one object.
#[derive(Clone, Debug)]
pub struct Event<T> {
    pub kind: EventKind,
    pub object: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

/// The consuming half of a per-kind event queue.
///
/// A bridge task translates the raw watch stream into informer-style deltas
/// and feeds the bounded queue; the kind's sync loop drains it. When the
/// queue is full the bridge waits, applying backpressure to the watch.
pub struct Manager<T> {
    events: mpsc::Receiver<Event<T>>,
}

impl<T> Manager<T> {
    /// Creates a detached queue, returning the producing half. Used where
    /// events come from somewhere other than a watch.
    pub fn new(capacity: usize) -> (mpsc::Sender<Event<T>>, Self) {
        let (tx, events) = mpsc::channel(capacity);
        (tx, Self { events })
    }

    /// Receives the next event, or `None` once the producer is gone.
    pub async fn recv(&mut self) -> Option<Event<T>> {
        self.events.recv().await
    }
}

impl<T> Manager<T>
where
    T: ResourceExt + Clone + Send + Sync + 'static,
{
    /// Spawns a bridge task over a watch stream.
    pub fn spawn(watch: impl Into<Watch<T>>, capacity: usize) -> Self {
        Self::spawn_shared(watch, Store::new(), capacity)
    }

    /// Spawns a bridge task that also maintains a shared object store,
    /// updated before each event is queued.
    pub fn spawn_shared(watch: impl Into<Watch<T>>, store: Store<T>, capacity: usize) -> Self {
        let (tx, manager) = Self::new(capacity);
        tokio::spawn(bridge(watch.into(), store, tx));
        manager
    }
}

async fn bridge<T>(mut watch: Watch<T>, store: Store<T>, tx: mpsc::Sender<Event<T>>)
where
    T: ResourceExt + Clone + Send + Sync + 'static,
{
    loop {
        let deltas = match watch.recv().await {
            watcher::Event::Applied(object) => {
                let kind = store.apply(object.clone());
                vec![Event { kind, object }]
            }
            watcher::Event::Deleted(object) => {
                store.delete(&store::object_id(&object));
                vec![Event {
                    kind: EventKind::Deleted,
                    object,
                }]
            }
            // A restart replays the full set; the store turns it back into
            // deltas, including deletes for objects that vanished while the
            // watch was disconnected.
            watcher::Event::Restarted(objects) => store.replace(objects),
        };

        for event in deltas {
            if tx.send(event).await.is_err() {
                // The sync loop is gone; the controller is shutting down.
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_dispatch_controller_k8s_api as k8s;
    use futures::stream;
    use futures::StreamExt;

    fn mk_configmap(ns: &str, name: &str) -> k8s::ConfigMap {
        k8s::ConfigMap {
            metadata: k8s::ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn mk_watch(
        events: Vec<watcher::Event<k8s::ConfigMap>>,
    ) -> Watch<k8s::ConfigMap> {
        Watch::from(stream::iter(events.into_iter().map(Ok)).chain(stream::pending()))
    }

    #[tokio::test]
    async fn applied_events_become_added_then_modified() {
        let mut manager = Manager::spawn(
            mk_watch(vec![
                watcher::Event::Applied(mk_configmap("ns-0", "cm-0")),
                watcher::Event::Applied(mk_configmap("ns-0", "cm-0")),
                watcher::Event::Deleted(mk_configmap("ns-0", "cm-0")),
            ]),
            16,
        );

        assert_eq!(manager.recv().await.unwrap().kind, EventKind::Added);
        assert_eq!(manager.recv().await.unwrap().kind, EventKind::Modified);
        assert_eq!(manager.recv().await.unwrap().kind, EventKind::Deleted);
    }

    #[tokio::test]
    async fn restart_replays_deltas() {
        let mut manager = Manager::spawn(
            mk_watch(vec![
                watcher::Event::Applied(mk_configmap("ns-0", "cm-0")),
                watcher::Event::Applied(mk_configmap("ns-0", "cm-1")),
                // cm-1 vanished while disconnected; cm-2 appeared.
                watcher::Event::Restarted(vec![
                    mk_configmap("ns-0", "cm-0"),
                    mk_configmap("ns-0", "cm-2"),
                ]),
            ]),
            16,
        );

        manager.recv().await.unwrap();
        manager.recv().await.unwrap();

        let ev = manager.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Modified);
        assert_eq!(ev.object.metadata.name.as_deref(), Some("cm-0"));

        let ev = manager.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Added);
        assert_eq!(ev.object.metadata.name.as_deref(), Some("cm-2"));

        let ev = manager.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Deleted);
        assert_eq!(ev.object.metadata.name.as_deref(), Some("cm-1"));
    }
}
