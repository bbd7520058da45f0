use serde::{Deserialize, Serialize};

use super::{
    deployment::{CsiVolumeSource, EnvVar, KeyToPath},
    Labels, Metadata, Object, Protocol, MANAGED_BY_LABEL, MANAGED_BY_VALUE,
};

/// API group serving the SimpleApp resource.
pub const API_GROUP: &str = "apps.simpleapp.dev";
pub const API_VERSION: &str = "v1alpha1";
/// Plural path segment under the group/version.
pub const PLURAL: &str = "simpleapps";

/// User-authored declarative description of one managed application.
/// The controller derives a Deployment and a Service from it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimpleApp {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: SimpleAppSpec,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SimpleAppSpec {
    /// Container image reference for the single managed container.
    pub image: String,
    /// Desired replica count. Absent leaves the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    /// Ports to expose. No two entries may share the same
    /// (hostPort, protocol) pair; later duplicates are dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<AppPort>,
    /// Environment entries, passed through to the container verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Volumes to mount. No two entries may share the same mountPath;
    /// later duplicates are dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<AppVolume>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppPort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port exposed outside the cluster.
    pub host_port: u16,
    /// Port the container listens on.
    pub container_port: u16,
    /// An absent protocol is exposed as TCP but stays distinct from an
    /// explicit TCP for duplicate detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

/// One mount point carrying exactly one volume source.
/// Entries with no source at all are rejected at compile time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppVolume {
    /// Path within the container at which the volume should be mounted.
    pub mount_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<AppEmptyDir>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<AppKeyedSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<AppKeyedSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<AppPvcSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csi: Option<CsiVolumeSource>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppEmptyDir {
    /// Storage medium backing the directory. Empty means the node default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
}

/// ConfigMap and Secret volume declarations share this shape; the compiler
/// maps `name` to the source-specific reference field.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppKeyedSource {
    /// Name of the referenced config map or secret.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<KeyToPath>,
    /// Mode bits for created files. Absent means 0644.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppPvcSource {
    /// Name of a claim in the same namespace.
    pub claim_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl Object for SimpleApp {
    fn kind(&self) -> &'static str {
        "SimpleApp"
    }

    fn name(&self) -> &String {
        &self.metadata.name
    }
}

impl SimpleApp {
    /// Labels stamped on every derived resource;
    /// also the workload's pod selector.
    pub fn labels(&self) -> Labels {
        let mut labels = Labels::new();
        labels.insert("app", &self.metadata.name);
        labels.insert(MANAGED_BY_LABEL, MANAGED_BY_VALUE);
        labels
    }

    /// Drop ports repeating an earlier entry's (hostPort, protocol) pair.
    /// First occurrence wins. Returns the number of entries removed.
    pub fn dedup_ports(&mut self) -> usize {
        let before = self.spec.ports.len();
        let mut kept: Vec<AppPort> = Vec::with_capacity(before);
        for port in self.spec.ports.drain(..) {
            let duplicate = kept
                .iter()
                .any(|stored| stored.host_port == port.host_port && stored.protocol == port.protocol);
            if !duplicate {
                kept.push(port);
            }
        }
        self.spec.ports = kept;
        before - self.spec.ports.len()
    }

    /// Drop volumes repeating an earlier entry's mountPath.
    /// First occurrence wins. Returns the number of entries removed.
    pub fn dedup_volumes(&mut self) -> usize {
        let before = self.spec.volumes.len();
        let mut kept: Vec<AppVolume> = Vec::with_capacity(before);
        for volume in self.spec.volumes.drain(..) {
            if !kept.iter().any(|stored| stored.mount_path == volume.mount_path) {
                kept.push(volume);
            }
        }
        self.spec.volumes = kept;
        before - self.spec.volumes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_ports(ports: Vec<AppPort>) -> SimpleApp {
        SimpleApp {
            api_version: format!("{}/{}", API_GROUP, API_VERSION),
            kind: "SimpleApp".to_string(),
            metadata: Metadata {
                namespace: "default".to_string(),
                name: "web".to_string(),
                ..Default::default()
            },
            spec: SimpleAppSpec {
                image: "nginx:1.25".to_string(),
                ports,
                ..Default::default()
            },
        }
    }

    fn port(host_port: u16, container_port: u16, protocol: Option<Protocol>) -> AppPort {
        AppPort {
            name: None,
            host_port,
            container_port,
            protocol,
        }
    }

    #[test]
    fn dedup_ports_keeps_first_occurrence() {
        let mut app = app_with_ports(vec![
            port(8080, 80, None),
            // Same host port, different container port: still a duplicate.
            port(8080, 8081, None),
            port(8443, 443, None),
        ]);
        assert_eq!(app.dedup_ports(), 1);
        assert_eq!(app.spec.ports.len(), 2);
        assert_eq!(app.spec.ports[0].container_port, 80);
        assert_eq!(app.spec.ports[1].host_port, 8443);
    }

    #[test]
    fn dedup_ports_treats_protocols_as_distinct() {
        let mut app = app_with_ports(vec![
            port(5353, 53, Some(Protocol::Udp)),
            port(5353, 53, Some(Protocol::Tcp)),
            port(5353, 53, None),
        ]);
        assert_eq!(app.dedup_ports(), 0);
        assert_eq!(app.spec.ports.len(), 3);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut app = app_with_ports(vec![port(8080, 80, None), port(8080, 80, None)]);
        assert_eq!(app.dedup_ports(), 1);
        assert_eq!(app.dedup_ports(), 0);
        assert_eq!(app.spec.ports.len(), 1);
    }

    #[test]
    fn dedup_volumes_keeps_first_occurrence() {
        let mut app = app_with_ports(vec![]);
        app.spec.volumes = vec![
            AppVolume {
                mount_path: "/data".to_string(),
                empty_dir: Some(AppEmptyDir::default()),
                ..Default::default()
            },
            AppVolume {
                mount_path: "/data".to_string(),
                persistent_volume_claim: Some(AppPvcSource {
                    claim_name: "data".to_string(),
                    read_only: None,
                }),
                ..Default::default()
            },
        ];
        assert_eq!(app.dedup_volumes(), 1);
        assert_eq!(app.spec.volumes.len(), 1);
        assert!(app.spec.volumes[0].empty_dir.is_some());
        assert_eq!(app.dedup_volumes(), 0);
    }

    #[test]
    fn parses_wire_form() {
        let app: SimpleApp = serde_json::from_str(
            r#"{
                "apiVersion": "apps.simpleapp.dev/v1alpha1",
                "kind": "SimpleApp",
                "metadata": { "namespace": "default", "name": "web" },
                "spec": {
                    "image": "nginx:1.25",
                    "replicas": 2,
                    "ports": [
                        { "hostPort": 8080, "containerPort": 80, "protocol": "TCP" }
                    ],
                    "env": [ { "name": "MODE", "value": "prod" } ],
                    "volumes": [
                        { "mountPath": "/cache", "emptyDir": {} }
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(app.metadata.name, "web");
        assert_eq!(app.spec.replicas, Some(2));
        assert_eq!(app.spec.ports[0].protocol, Some(Protocol::Tcp));
        assert_eq!(app.spec.env[0].value, "prod");
        assert!(app.spec.volumes[0].empty_dir.is_some());
    }

    #[test]
    fn labels_carry_identity_and_marker() {
        let app = app_with_ports(vec![]);
        let labels = app.labels();
        assert_eq!(labels.get("app"), Some(&"web".to_string()));
        assert_eq!(
            labels.get(MANAGED_BY_LABEL),
            Some(&MANAGED_BY_VALUE.to_string())
        );
    }
}
