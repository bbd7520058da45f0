use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// API server URL
    pub api_server_url: String,
    /// Seconds between reconciliation cycles.
    pub poll_interval: u64,
    /// File the controller reads its namespace from.
    pub namespace_file: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            api_server_url: "http://localhost:8080".to_string(),
            poll_interval: 10,
            namespace_file: "/var/run/secrets/kubernetes.io/serviceaccount/namespace".to_string(),
        }
    }
}
