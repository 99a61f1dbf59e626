//! The routed message envelope handed to the outbound transport.
//!
//! Every downstream event is rendered into a [`Message`]: a fresh header
//! (id, timestamp, the source object's resource version), a [`Router`]
//! addressing one edge destination, and the object itself as payload. The
//! envelope is built per event and handed off by value to a [`MessageLayer`]
//! sink; nothing here retries or persists.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod layer;
pub mod resource;

pub use self::layer::{channel, ChannelMessageLayer, MessageLayer, SendError};
use edge_dispatch_controller_k8s_api as k8s;
use serde::Serialize;
use uuid::Uuid;

/// The module name edges see as the origin of downstream messages.
pub const SOURCE: &str = "edgecontroller";

/// The router group carrying resource state.
pub const GROUP_RESOURCE: &str = "resource";

/// A routed envelope bound for a single edge destination.
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    pub header: Header,
    pub router: Router,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Payload>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Header {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    /// Milliseconds since the epoch, stamped at construction.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Router {
    pub source: String,
    pub group: String,
    pub resource: String,
    pub operation: Operation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

/// The typed object carried by a message.
///
/// Serialized untagged so the wire body is the object itself.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Payload {
    Pod(k8s::Pod),
    ConfigMap(k8s::ConfigMap),
    Secret(k8s::Secret),
    Node(k8s::Node),
    Rule(k8s::Rule),
    RuleEndpoint(k8s::RuleEndpoint),
    Mission(k8s::Mission),
    MissionList(Vec<k8s::Mission>),
}

// === impl Message ===

impl Message {
    pub fn new(router: Router) -> Self {
        Self {
            header: Header {
                id: Uuid::new_v4().to_string(),
                parent_id: String::new(),
                timestamp: chrono::Utc::now().timestamp_millis(),
                resource_version: None,
            },
            router,
            content: None,
        }
    }

    pub fn resource_version(mut self, version: Option<String>) -> Self {
        self.header.resource_version = version;
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.content = Some(payload);
        self
    }
}

// === impl Router ===

impl Router {
    /// Routes a resource-group message from the downstream controller.
    pub fn new(resource: String, operation: Operation) -> Self {
        Self {
            source: SOURCE.to_string(),
            group: GROUP_RESOURCE.to_string(),
            resource,
            operation,
        }
    }
}

// === impl Operation ===

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
