use resources::objects::{
    deployment::{
        ConfigMapVolumeSource, Container, ContainerPort, Deployment, DeploymentSpec,
        EmptyDirVolumeSource, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec,
        SecretVolumeSource, Volume, VolumeMount, VolumeSource,
    },
    service::{Service, ServicePort, ServiceSpec, ServiceType, TargetPort},
    simple_app::{AppVolume, SimpleApp},
    Metadata,
};

use crate::{
    error::{Error, Result},
    naming,
};

/// Compile the desired workload for a normalized specification.
/// Pure; fails only when a volume entry carries no recognized source.
pub fn build_deployment(app: &SimpleApp) -> Result<Deployment> {
    let ports = app
        .spec
        .ports
        .iter()
        .map(|port| ContainerPort {
            name: port.name.clone(),
            container_port: port.container_port,
            protocol: port.protocol,
        })
        .collect();

    let mut volumes = Vec::with_capacity(app.spec.volumes.len());
    let mut volume_mounts = Vec::with_capacity(app.spec.volumes.len());
    for app_volume in &app.spec.volumes {
        let (volume, mount) = make_volume(app, app_volume)?;
        volumes.push(volume);
        volume_mounts.push(mount);
    }

    let labels = app.labels();
    Ok(Deployment {
        metadata: Metadata {
            namespace: app.metadata.namespace.clone(),
            name: app.metadata.name.clone(),
            labels: labels.clone(),
        },
        spec: DeploymentSpec {
            replicas: app.spec.replicas,
            selector: labels.clone(),
            template: PodTemplateSpec {
                metadata: Metadata {
                    labels,
                    ..Default::default()
                },
                spec: PodSpec {
                    containers: vec![Container {
                        name: app.metadata.name.clone(),
                        image: app.spec.image.clone(),
                        ports,
                        env: app.spec.env.clone(),
                        volume_mounts,
                    }],
                    volumes,
                },
            },
        },
    })
}

/// Map one volume entry to a pod volume plus its container mount. The
/// volume identity is derived from the mount path so it stays stable
/// across cycles. When several sources are set the first recognized one
/// wins; none set is a validation failure.
fn make_volume(app: &SimpleApp, app_volume: &AppVolume) -> Result<(Volume, VolumeMount)> {
    let name = naming::volume_name(&app_volume.mount_path);
    let source = if let Some(config_map) = &app_volume.config_map {
        VolumeSource::ConfigMap(ConfigMapVolumeSource {
            name: config_map.name.clone(),
            items: config_map.items.clone(),
            default_mode: config_map.default_mode,
            optional: config_map.optional,
        })
    } else if let Some(empty_dir) = &app_volume.empty_dir {
        VolumeSource::EmptyDir(EmptyDirVolumeSource {
            medium: empty_dir.medium.clone(),
            size_limit: empty_dir.size_limit.clone(),
        })
    } else if let Some(claim) = &app_volume.persistent_volume_claim {
        VolumeSource::PersistentVolumeClaim(PersistentVolumeClaimVolumeSource {
            claim_name: claim.claim_name.clone(),
            read_only: claim.read_only.unwrap_or(false),
        })
    } else if let Some(secret) = &app_volume.secret {
        VolumeSource::Secret(SecretVolumeSource {
            secret_name: secret.name.clone(),
            items: secret.items.clone(),
            default_mode: secret.default_mode,
            optional: secret.optional,
        })
    } else if let Some(csi) = &app_volume.csi {
        VolumeSource::Csi(csi.clone())
    } else {
        return Err(Error::VolumeWithoutSource {
            mount_path: app_volume.mount_path.clone(),
            namespace: app.metadata.namespace.clone(),
            name: app.metadata.name.clone(),
        });
    };
    let mount = VolumeMount {
        name: name.clone(),
        mount_path: app_volume.mount_path.clone(),
    };
    Ok((Volume { name, source }, mount))
}

/// Compile the desired network exposure for a normalized specification.
/// Every exposed port gets a name: the explicit one, or a synthesized
/// protocol-port identifier unique within the service. Explicitly named
/// ports target the container port by name, unnamed ones by number.
pub fn build_service(app: &SimpleApp) -> Service {
    let mut ports: Vec<ServicePort> = Vec::with_capacity(app.spec.ports.len());
    let mut taken: Vec<String> = Vec::with_capacity(app.spec.ports.len());
    for app_port in &app.spec.ports {
        let (name, target_port) = match &app_port.name {
            Some(name) => (name.clone(), TargetPort::Name(name.clone())),
            None => (
                naming::service_port_name(app_port, &taken),
                TargetPort::Number(app_port.container_port),
            ),
        };
        taken.push(name.clone());
        ports.push(ServicePort {
            name: Some(name),
            protocol: app_port.protocol,
            port: app_port.host_port,
            target_port,
        });
    }

    Service {
        metadata: Metadata {
            namespace: app.metadata.namespace.clone(),
            name: app.metadata.name.clone(),
            labels: app.labels(),
        },
        spec: ServiceSpec {
            selector: app.labels(),
            ports,
            type_: ServiceType::NodePort,
        },
    }
}
