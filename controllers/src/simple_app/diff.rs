use resources::objects::{
    deployment::{Container, Deployment, Volume, VolumeSource},
    service::Service,
};

/// Replica count the platform applies when a workload leaves it unset.
const DEFAULT_REPLICAS: u32 = 1;
/// Mode bits the platform applies when defaultMode is unset (0644).
const DEFAULT_FILE_MODE: i32 = 420;

/// Semantic equivalence of the desired and observed workload, restricted
/// to the fields the compiler can produce. Used to suppress no-op updates;
/// any mismatch leads to a full spec replace, never a field-level patch.
pub fn deployment_equal(desired: &Deployment, observed: &Deployment) -> bool {
    if desired.spec.replicas.unwrap_or(DEFAULT_REPLICAS)
        != observed.spec.replicas.unwrap_or(DEFAULT_REPLICAS)
    {
        return false;
    }

    match (
        desired.spec.template.spec.containers.first(),
        observed.spec.template.spec.containers.first(),
    ) {
        (Some(desired), Some(observed)) => {
            if !container_equal(desired, observed) {
                return false;
            }
        },
        (None, None) => {},
        _ => return false,
    }

    let desired_volumes = &desired.spec.template.spec.volumes;
    let observed_volumes = &observed.spec.template.spec.volumes;
    desired_volumes.len() == observed_volumes.len()
        && desired_volumes
            .iter()
            .zip(observed_volumes)
            .all(|(a, b)| volume_equal(a, b))
}

fn container_equal(a: &Container, b: &Container) -> bool {
    if a.image != b.image || a.env != b.env || a.ports != b.ports {
        return false;
    }
    // Mount names are derived from the paths, so the paths carry all the
    // meaning.
    a.volume_mounts.len() == b.volume_mounts.len()
        && a.volume_mounts
            .iter()
            .zip(&b.volume_mounts)
            .all(|(m1, m2)| m1.mount_path == m2.mount_path)
}

/// Volumes match by identity first, then by the fields the compiler sets,
/// with absent optionals normalized to their platform defaults on both
/// sides. Differing source kinds never match.
fn volume_equal(a: &Volume, b: &Volume) -> bool {
    if a.name != b.name {
        return false;
    }
    match (&a.source, &b.source) {
        (VolumeSource::ConfigMap(s1), VolumeSource::ConfigMap(s2)) => {
            s1.name == s2.name
                && s1.items == s2.items
                && file_mode(s1.default_mode) == file_mode(s2.default_mode)
                && s1.optional.unwrap_or(false) == s2.optional.unwrap_or(false)
        },
        (VolumeSource::Secret(s1), VolumeSource::Secret(s2)) => {
            s1.secret_name == s2.secret_name
                && s1.items == s2.items
                && file_mode(s1.default_mode) == file_mode(s2.default_mode)
                && s1.optional.unwrap_or(false) == s2.optional.unwrap_or(false)
        },
        (VolumeSource::EmptyDir(e1), VolumeSource::EmptyDir(e2)) => {
            e1.medium == e2.medium && e1.size_limit == e2.size_limit
        },
        (VolumeSource::PersistentVolumeClaim(p1), VolumeSource::PersistentVolumeClaim(p2)) => {
            p1.claim_name == p2.claim_name && p1.read_only == p2.read_only
        },
        (VolumeSource::Csi(c1), VolumeSource::Csi(c2)) => {
            c1.driver == c2.driver
                && c1.fs_type.as_deref().unwrap_or("") == c2.fs_type.as_deref().unwrap_or("")
                && c1.node_publish_secret_ref == c2.node_publish_secret_ref
                && c1.read_only.unwrap_or(false) == c2.read_only.unwrap_or(false)
                && c1.volume_attributes == c2.volume_attributes
        },
        _ => false,
    }
}

fn file_mode(mode: Option<i32>) -> i32 {
    mode.unwrap_or(DEFAULT_FILE_MODE)
}

/// Semantic equivalence of the desired and observed exposure: element-wise
/// port comparison over name, protocol, exposed port and target.
pub fn service_equal(desired: &Service, observed: &Service) -> bool {
    desired.spec.ports == observed.spec.ports
}

#[cfg(test)]
mod tests {
    use resources::objects::{
        deployment::{ConfigMapVolumeSource, CsiVolumeSource, SecretVolumeSource},
        simple_app::{AppKeyedSource, AppPort, AppVolume, SimpleApp, SimpleAppSpec},
        Metadata,
    };

    use super::*;
    use crate::compile;

    fn web_app() -> SimpleApp {
        SimpleApp {
            api_version: "apps.simpleapp.dev/v1alpha1".to_string(),
            kind: "SimpleApp".to_string(),
            metadata: Metadata {
                namespace: "default".to_string(),
                name: "web".to_string(),
                ..Default::default()
            },
            spec: SimpleAppSpec {
                image: "nginx:1.25".to_string(),
                replicas: Some(2),
                ports: vec![AppPort {
                    name: None,
                    host_port: 8080,
                    container_port: 80,
                    protocol: None,
                }],
                volumes: vec![AppVolume {
                    mount_path: "/config".to_string(),
                    config_map: Some(AppKeyedSource {
                        name: "web-config".to_string(),
                        items: vec![],
                        default_mode: None,
                        optional: None,
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            },
        }
    }

    #[test]
    fn recompiled_resources_are_equal() {
        let app = web_app();
        let first = compile::build_deployment(&app).unwrap();
        let second = compile::build_deployment(&app).unwrap();
        assert!(deployment_equal(&first, &second));
        assert!(service_equal(
            &compile::build_service(&app),
            &compile::build_service(&app)
        ));
    }

    #[test]
    fn absent_replicas_match_platform_default() {
        let mut app = web_app();
        app.spec.replicas = None;
        let desired = compile::build_deployment(&app).unwrap();

        let mut observed = desired.clone();
        observed.spec.replicas = Some(1);
        assert!(deployment_equal(&desired, &observed));

        observed.spec.replicas = Some(3);
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn image_change_is_detected() {
        let desired = compile::build_deployment(&web_app()).unwrap();
        let mut observed = desired.clone();
        observed.spec.template.spec.containers[0].image = "nginx:1.24".to_string();
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn port_list_is_order_sensitive() {
        let mut app = web_app();
        app.spec.ports.push(AppPort {
            name: None,
            host_port: 8443,
            container_port: 443,
            protocol: None,
        });
        let desired = compile::build_deployment(&app).unwrap();
        let mut observed = desired.clone();
        observed.spec.template.spec.containers[0].ports.reverse();
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn absent_default_mode_matches_explicit_default() {
        let desired = compile::build_deployment(&web_app()).unwrap();
        let mut observed = desired.clone();
        match &mut observed.spec.template.spec.volumes[0].source {
            VolumeSource::ConfigMap(source) => source.default_mode = Some(420),
            _ => unreachable!(),
        }
        assert!(deployment_equal(&desired, &observed));

        match &mut observed.spec.template.spec.volumes[0].source {
            VolumeSource::ConfigMap(source) => source.default_mode = Some(0o600),
            _ => unreachable!(),
        }
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn absent_optional_matches_false() {
        let desired = compile::build_deployment(&web_app()).unwrap();
        let mut observed = desired.clone();
        match &mut observed.spec.template.spec.volumes[0].source {
            VolumeSource::ConfigMap(source) => source.optional = Some(false),
            _ => unreachable!(),
        }
        assert!(deployment_equal(&desired, &observed));
    }

    #[test]
    fn source_kind_change_is_detected() {
        let desired = compile::build_deployment(&web_app()).unwrap();
        let mut observed = desired.clone();
        observed.spec.template.spec.volumes[0].source =
            VolumeSource::Secret(SecretVolumeSource {
                secret_name: "web-config".to_string(),
                items: vec![],
                default_mode: None,
                optional: None,
            });
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn referenced_config_map_change_is_detected() {
        let desired = compile::build_deployment(&web_app()).unwrap();
        let mut observed = desired.clone();
        observed.spec.template.spec.volumes[0].source =
            VolumeSource::ConfigMap(ConfigMapVolumeSource {
                name: "other-config".to_string(),
                items: vec![],
                default_mode: None,
                optional: None,
            });
        assert!(!deployment_equal(&desired, &observed));
    }

    #[test]
    fn csi_fs_type_defaults_to_empty() {
        let csi = |fs_type: Option<&str>| Volume {
            name: "vol-x".to_string(),
            source: VolumeSource::Csi(CsiVolumeSource {
                driver: "ebs.csi.aws.com".to_string(),
                fs_type: fs_type.map(str::to_string),
                node_publish_secret_ref: None,
                read_only: None,
                volume_attributes: Default::default(),
            }),
        };
        assert!(volume_equal(&csi(None), &csi(Some(""))));
        assert!(!volume_equal(&csi(None), &csi(Some("ext4"))));
    }

    #[test]
    fn service_port_change_is_detected() {
        let desired = compile::build_service(&web_app());
        let mut observed = desired.clone();
        observed.spec.ports[0].port = 9090;
        assert!(!service_equal(&desired, &observed));

        let mut renamed = desired.clone();
        renamed.spec.ports[0].name = Some("http".to_string());
        assert!(!service_equal(&desired, &renamed));
    }
}
