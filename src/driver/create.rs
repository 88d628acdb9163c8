//! Machine creation

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use tracing::{debug, info};

use super::{
    check_request, ignition_secret_name, provider_id, secret_data, CreateMachineRequest,
    CreateMachineResponse, IroncoreDriver, ROOT_DISK_DEVICE, ROOT_DISK_NAME,
};
use crate::api::compute::{
    EphemeralVolumeSource, LocalObjectReference, Machine, MachineSpec, Power, SecretKeySelector,
    Volume, VolumeSources, VolumeSpec, VolumeTemplateSpec, RESOURCE_STORAGE,
};
use crate::api::provider::{ProviderSpec, RootDisk, SECRET_USER_DATA};
use crate::error::{Error, Result};
use crate::ignition;

impl IroncoreDriver {
    pub(super) async fn create(&self, req: &CreateMachineRequest) -> Result<CreateMachineResponse> {
        let (machine, class, secret) = check_request(
            req.machine.as_ref(),
            req.machine_class.as_ref(),
            req.secret.as_ref(),
        )?;
        info!(machine = %machine.name, "Machine creation request has been received");

        let spec = self.provider_spec(class, Some(secret))?;
        let (store, namespace) = self.resolve(secret).await?;

        let user_data = secret_data(secret, SECRET_USER_DATA)?;
        let content = self
            .composer
            .render(&ignition::Config {
                hostname: machine.name.clone(),
                user_data: String::from_utf8_lossy(user_data).into_owned(),
                dns_servers: spec.dns_servers.clone(),
                ignition: spec.ignition.clone(),
                ignition_override: spec.ignition_override,
            })
            .map_err(|e| {
                Error::Internal(format!(
                    "failed to create ignition file for machine {}: {e}",
                    machine.name
                ))
            })?;

        let ignition_secret = build_ignition_secret(&machine.name, &namespace, &spec, content);
        let ironcore_machine = build_machine(&machine.name, &namespace, &spec);

        store
            .apply_machine(&ironcore_machine)
            .await
            .map_err(|e| Error::Internal(format!("error applying ironcore machine: {e}")))?;
        store
            .apply_secret(&ignition_secret)
            .await
            .map_err(|e| Error::Internal(format!("error applying ignition secret: {e}")))?;

        info!(machine = %machine.name, "Machine creation request has been processed");
        Ok(CreateMachineResponse {
            provider_id: provider_id(&namespace, &machine.name),
            node_name: machine.name.clone(),
        })
    }
}

fn labels(spec: &ProviderSpec) -> Option<BTreeMap<String, String>> {
    (!spec.labels.is_empty()).then(|| spec.labels.clone())
}

/// Secret carrying the rendered ignition under the provider spec's ignition key.
pub(crate) fn build_ignition_secret(
    machine: &str,
    namespace: &str,
    spec: &ProviderSpec,
    content: String,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(ignition_secret_name(machine)),
            namespace: Some(namespace.to_string()),
            labels: labels(spec),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            spec.ignition_key().to_string(),
            ByteString(content.into_bytes()),
        )])),
        ..Default::default()
    }
}

/// IronCore machine for a provider spec.
///
/// With a root disk the image goes into an ephemeral `primary` volume on
/// device `oda`, ahead of the provider spec's own volumes; otherwise the machine
/// boots the image directly.
pub(crate) fn build_machine(name: &str, namespace: &str, spec: &ProviderSpec) -> Machine {
    let mut volumes = spec.volumes.clone();
    let image = match &spec.root_disk {
        Some(root_disk) => {
            volumes.insert(0, root_volume(spec, root_disk));
            None
        }
        None => Some(spec.image.clone()),
    };

    let mut machine = Machine::new(
        name,
        MachineSpec {
            machine_class_ref: spec.machine_class_ref.clone(),
            machine_pool_selector: spec.machine_pool_selector.clone(),
            machine_pool_ref: spec.machine_pool_ref.clone(),
            power: Power::On,
            image,
            image_pull_secret: spec.image_pull_secret_ref.clone(),
            network_interfaces: spec.network_interfaces.clone(),
            volumes,
            ignition_ref: Some(SecretKeySelector {
                name: ignition_secret_name(name),
                key: spec.ignition_key().to_string(),
            }),
        },
    );
    machine.metadata.namespace = Some(namespace.to_string());
    machine.metadata.labels = labels(spec);
    debug!(machine = %name, volumes = machine.spec.volumes.len(), "Built machine");
    machine
}

fn root_volume(spec: &ProviderSpec, root_disk: &RootDisk) -> Volume {
    let volume_pool_ref = (!root_disk.volume_pool_name.is_empty())
        .then(|| LocalObjectReference::new(&root_disk.volume_pool_name));

    Volume {
        name: ROOT_DISK_NAME.to_string(),
        device: Some(ROOT_DISK_DEVICE.to_string()),
        source: VolumeSources {
            ephemeral: Some(EphemeralVolumeSource {
                volume_template: Some(VolumeTemplateSpec {
                    metadata: ObjectMeta::default(),
                    spec: VolumeSpec {
                        volume_class_ref: Some(LocalObjectReference::new(
                            &root_disk.volume_class_name,
                        )),
                        volume_pool_ref,
                        resources: BTreeMap::from([(
                            RESOURCE_STORAGE.to_string(),
                            root_disk.size.clone(),
                        )]),
                        image: Some(spec.image.clone()),
                        ..Default::default()
                    },
                }),
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    fn spec() -> ProviderSpec {
        ProviderSpec {
            machine_class_ref: LocalObjectReference::new("x3-xlarge"),
            machine_pool_ref: Some(LocalObjectReference::new("az1")),
            image: "my-image".into(),
            labels: BTreeMap::from([("shoot-name".to_string(), "my-shoot".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_machine_without_root_disk() {
        let machine = build_machine("machine-0", "default", &spec());

        assert_eq!(machine.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(machine.spec.image.as_deref(), Some("my-image"));
        assert_eq!(machine.spec.power, Power::On);
        assert!(machine.spec.volumes.is_empty());
        assert_eq!(
            machine.spec.ignition_ref,
            Some(SecretKeySelector {
                name: "machine-0-ignition".into(),
                key: "ignition.json".into(),
            })
        );
        assert_eq!(machine.metadata.labels.unwrap()["shoot-name"], "my-shoot");
    }

    #[test]
    fn test_build_machine_with_root_disk() {
        let mut spec = spec();
        spec.root_disk = Some(RootDisk {
            size: Quantity("10Gi".into()),
            volume_class_name: "fast".into(),
            volume_pool_name: String::new(),
        });
        spec.volumes = vec![Volume {
            name: "data".into(),
            device: Some("odb".into()),
            ..Default::default()
        }];

        let machine = build_machine("machine-0", "default", &spec);
        assert_eq!(machine.spec.image, None);
        assert_eq!(machine.spec.volumes.len(), 2);

        let root = &machine.spec.volumes[0];
        assert_eq!(root.name, "primary");
        assert_eq!(root.device.as_deref(), Some("oda"));
        let template = root
            .source
            .ephemeral
            .as_ref()
            .and_then(|e| e.volume_template.as_ref())
            .unwrap();
        assert_eq!(template.spec.image.as_deref(), Some("my-image"));
        assert_eq!(template.spec.volume_class_ref, Some(LocalObjectReference::new("fast")));
        assert_eq!(template.spec.volume_pool_ref, None);
        assert_eq!(template.spec.resources["storage"], Quantity("10Gi".into()));
        assert_eq!(machine.spec.volumes[1].name, "data");
    }

    #[test]
    fn test_build_ignition_secret() {
        let mut spec = spec();
        spec.ignition_secret_key = "custom".into();

        let secret = build_ignition_secret("machine-0", "default", &spec, "{}".into());
        assert_eq!(secret.metadata.name.as_deref(), Some("machine-0-ignition"));
        assert_eq!(secret.data.unwrap()["custom"], ByteString(b"{}".to_vec()));
    }
}
