/// Holds deployment-level configuration for the downstream controller.
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    /// Label key marking a node as an edge node.
    pub edge_role_key: String,

    /// Expected value of the edge-role label. May be empty.
    pub edge_role_value: String,
}

impl ClusterConfig {
    /// The label selector matching edge nodes.
    pub fn edge_node_selector(&self) -> String {
        format!("{}={}", self.edge_role_key, self.edge_role_value)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            edge_role_key: "node-role.kubernetes.io/edge".to_string(),
            edge_role_value: String::new(),
        }
    }
}
