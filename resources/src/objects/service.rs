use serde::{Deserialize, Serialize};

use super::{Labels, Metadata, Object, Protocol};

/// Derived network-exposure resource: routes node-reachable traffic to the
/// pods selected by its label selector. Generated by the controller, never
/// authored directly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Service {
    pub metadata: Metadata,
    pub spec: ServiceSpec,
}

impl Object for Service {
    fn kind(&self) -> &'static str {
        "Service"
    }

    fn name(&self) -> &String {
        &self.metadata.name
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Route service traffic to pods with label keys and values
    /// matching this selector.
    pub selector: Labels,
    /// The list of ports that are exposed by this service.
    pub ports: Vec<ServicePort>,
    #[serde(rename = "type")]
    pub type_: ServiceType,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Must be unique within the service when more than one port is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    /// The port that will be exposed by this service.
    pub port: u16,
    /// Port to access on the target pods, by container-port name or number.
    pub target_port: TargetPort,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TargetPort {
    Number(u16),
    Name(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    #[serde(rename = "ClusterIP")]
    ClusterIp,
    NodePort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_port_serializes_as_number_or_name() {
        assert_eq!(
            serde_json::to_string(&TargetPort::Number(80)).unwrap(),
            "80"
        );
        assert_eq!(
            serde_json::to_string(&TargetPort::Name("http".to_string())).unwrap(),
            "\"http\""
        );

        let numeric: TargetPort = serde_json::from_str("8080").unwrap();
        assert_eq!(numeric, TargetPort::Number(8080));
        let named: TargetPort = serde_json::from_str("\"metrics\"").unwrap();
        assert_eq!(named, TargetPort::Name("metrics".to_string()));
    }
}
