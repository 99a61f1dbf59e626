use crate::{Event, EventKind, ResourceId};
use ahash::AHashMap as HashMap;
use edge_dispatch_controller_k8s_api::ResourceExt;
use parking_lot::RwLock;
use std::sync::Arc;

/// A lister-style cache of the most recent version of each object of a kind.
///
/// Maintained by the watch bridge before events are queued, so a sync loop
/// that lists always observes state at least as new as the event it is
/// processing.
#[derive(Debug)]
pub struct Store<T> {
    objects: Arc<RwLock<HashMap<ResourceId, T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            objects: self.objects.clone(),
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            objects: Default::default(),
        }
    }
}

pub(crate) fn object_id<T: ResourceExt>(obj: &T) -> ResourceId {
    ResourceId::new(obj.namespace().unwrap_or_default(), obj.name_any())
}

impl<T: ResourceExt + Clone> Store<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every cached object.
    pub fn list(&self) -> Vec<T> {
        self.objects.read().values().cloned().collect()
    }

    pub(crate) fn apply(&self, obj: T) -> EventKind {
        match self.objects.write().insert(object_id(&obj), obj) {
            None => EventKind::Added,
            Some(_) => EventKind::Modified,
        }
    }

    pub(crate) fn delete(&self, id: &ResourceId) {
        self.objects.write().remove(id);
    }

    /// Replaces the cache with a freshly-listed set, returning the deltas:
    /// unseen objects as `Added`, known ones as `Modified`, and objects that
    /// vanished while disconnected as `Deleted`.
    pub(crate) fn replace(&self, objs: Vec<T>) -> Vec<Event<T>> {
        let mut objects = self.objects.write();
        let mut prior = std::mem::take(&mut *objects);

        let mut events = Vec::with_capacity(objs.len());
        for obj in objs {
            let id = object_id(&obj);
            let kind = if prior.remove(&id).is_some() {
                EventKind::Modified
            } else {
                EventKind::Added
            };
            objects.insert(id, obj.clone());
            events.push(Event { kind, object: obj });
        }
        for (_, obj) in prior {
            events.push(Event {
                kind: EventKind::Deleted,
                object: obj,
            });
        }
        events
    }
}
