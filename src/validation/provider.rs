//! Provider spec and secret validation
//!
//! Every rule runs regardless of earlier failures; the result lists all
//! violations with the path of the offending field.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::field::{ErrorList, FieldError, FieldPath};
use super::names::{
    is_dns1123_label, is_dns1123_subdomain, validate_annotations, validate_labels,
};
use super::quantity::{validate_non_negative, validate_positive};
use crate::api::compute::{
    EphemeralNetworkInterfaceSource, EphemeralVolumeSource, LocalObjectReference,
    NetworkInterface, NetworkInterfaceSource, Volume, VolumeSource, VolumeSpec,
    VolumeTemplateSpec, RESOURCE_STORAGE,
};
use crate::api::device;
use crate::api::provider::{
    ProviderSpec, RootDisk, SECRET_KUBECONFIG, SECRET_NAMESPACE, SECRET_USER_DATA,
};

const SUPPORTED_IP_FAMILIES: [&str; 2] = ["IPv4", "IPv6"];

/// Which keys the machine secret has to carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretScope {
    /// Resources live in the cluster the driver is connected to; only user
    /// data is required.
    #[default]
    Local,
    /// Resources live in a remote cluster addressed by the secret's
    /// kubeconfig and namespace.
    Remote,
}

impl SecretScope {
    fn required_keys(self) -> &'static [&'static str] {
        match self {
            SecretScope::Local => &[SECRET_USER_DATA],
            SecretScope::Remote => &[SECRET_USER_DATA, SECRET_KUBECONFIG, SECRET_NAMESPACE],
        }
    }
}

/// Validate a provider spec together with the machine secret.
pub fn validate_provider_spec_and_secret(
    spec: &ProviderSpec,
    secret: Option<&Secret>,
    scope: SecretScope,
) -> ErrorList {
    let mut errs = validate_provider_spec(spec, &FieldPath::new("spec"));
    errs.extend(validate_secret(secret, scope, &FieldPath::new("secretRef")));
    errs
}

pub fn validate_provider_spec(spec: &ProviderSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    let class_path = path.child("machineClassRef");
    if spec.machine_class_ref.is_empty() {
        errs.push(FieldError::required(&class_path, "machine class reference is required"));
    }
    errs.extend(validate_name(&spec.machine_class_ref, &class_path, is_dns1123_label));

    let pool_path = path.child("machinePoolRef");
    match &spec.machine_pool_ref {
        None => errs.push(FieldError::required(&pool_path, "machine pool reference is required")),
        Some(pool) => errs.extend(validate_name(pool, &pool_path, is_dns1123_subdomain)),
    }

    if spec.image.is_empty() {
        errs.push(FieldError::required(&path.child("image"), "image is required"));
    }

    let pull_secret_path = path.child("imagePullSecretRef");
    match &spec.image_pull_secret_ref {
        None => errs.push(FieldError::required(
            &pull_secret_path,
            "image pull secret reference is required",
        )),
        Some(secret) => errs.extend(validate_name(secret, &pull_secret_path, is_dns1123_label)),
    }

    let selector_path = path.child("machinePoolSelector");
    if spec.machine_pool_selector.is_empty() {
        errs.push(FieldError::required(&selector_path, "machine pool selector is required"));
    }
    errs.extend(validate_labels(&spec.machine_pool_selector, &selector_path));
    errs.extend(validate_labels(&spec.labels, &path.child("labels")));

    if let Some(root_disk) = &spec.root_disk {
        errs.extend(validate_root_disk(root_disk, &path.child("rootDisk")));
    }

    errs.extend(validate_volumes(&spec.volumes, &path.child("volume")));
    errs.extend(validate_network_interfaces(
        &spec.network_interfaces,
        &path.child("networkInterfaces"),
    ));

    let dns_path = path.child("dnsServers");
    for (i, server) in spec.dns_servers.iter().enumerate() {
        if server.parse::<IpAddr>().is_err() {
            errs.push(FieldError::invalid(&dns_path.index(i), server, "must be a valid IP address"));
        }
    }

    errs
}

pub fn validate_secret(secret: Option<&Secret>, scope: SecretScope, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let Some(secret) = secret else {
        errs.push(FieldError::required(path, "secretRef is required"));
        return errs;
    };

    for key in scope.required_keys() {
        let present = secret.data.as_ref().is_some_and(|data| data.contains_key(*key));
        if !present {
            errs.push(FieldError::required(&path.child(*key), format!("{key} is required")));
        }
    }
    errs
}

fn validate_name(
    reference: &LocalObjectReference,
    path: &FieldPath,
    check: fn(&str) -> Vec<String>,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let name_path = path.child("name");
    for msg in check(&reference.name) {
        errs.push(FieldError::invalid(&name_path, &reference.name, msg));
    }
    errs
}

fn validate_root_disk(root_disk: &RootDisk, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    let class_path = path.child("volumeClassName");
    if root_disk.volume_class_name.is_empty() {
        errs.push(FieldError::required(&class_path, "volume class name is required"));
    } else {
        for msg in is_dns1123_label(&root_disk.volume_class_name) {
            errs.push(FieldError::invalid(&class_path, &root_disk.volume_class_name, msg));
        }
    }

    if !root_disk.volume_pool_name.is_empty() {
        for msg in is_dns1123_subdomain(&root_disk.volume_pool_name) {
            errs.push(FieldError::invalid(
                &path.child("volumePoolName"),
                &root_disk.volume_pool_name,
                msg,
            ));
        }
    }

    errs.extend(validate_positive(&root_disk.size, &path.child("size")));
    errs
}

// =============================================================================
// Volumes
// =============================================================================

fn validate_volumes(volumes: &[Volume], path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut seen_names = HashSet::new();
    let mut seen_devices = HashSet::new();

    for (i, volume) in volumes.iter().enumerate() {
        let idx_path = path.index(i);

        if !seen_names.insert(volume.name.as_str()) {
            errs.push(FieldError::duplicate(&idx_path.child("name"), &volume.name));
        }
        if let Some(device) = &volume.device {
            if !seen_devices.insert(device.as_str()) {
                errs.push(FieldError::duplicate(&idx_path.child("device"), device));
            }
        }

        errs.extend(validate_volume(volume, &idx_path));
    }
    errs
}

fn validate_volume(volume: &Volume, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    for msg in is_dns1123_label(&volume.name) {
        errs.push(FieldError::invalid(&path.child("name"), &volume.name, msg));
    }

    let device_path = path.child("device");
    match &volume.device {
        None => errs.push(FieldError::required(&device_path, "must specify device")),
        Some(name) => match device::parse_name(name) {
            Err(e) => errs.push(FieldError::invalid(
                &device_path,
                name,
                format!("invalid device name: {e}"),
            )),
            // Index 0 is the boot device, whatever the prefix.
            Ok((_, 0)) => errs.push(FieldError::forbidden(
                &device_path,
                format!("device name {name} is reserved"),
            )),
            Ok(_) => {}
        },
    }

    let sources = volume.sources();
    if sources.is_empty() {
        errs.push(FieldError::invalid(
            path,
            &volume.name,
            "must specify at least one volume source",
        ));
    }
    for (i, source) in sources.iter().enumerate() {
        let source_path = path.child(source.field());
        if i > 0 {
            errs.push(FieldError::forbidden(&source_path, "must only specify one volume source"));
            continue;
        }
        match source {
            VolumeSource::VolumeRef(reference) => {
                errs.extend(validate_name(reference, &source_path, is_dns1123_label));
            }
            VolumeSource::EmptyDisk(empty_disk) => {
                if let Some(size_limit) = &empty_disk.size_limit {
                    errs.extend(validate_non_negative(size_limit, &source_path.child("sizeLimit")));
                }
            }
            VolumeSource::Ephemeral(ephemeral) => {
                errs.extend(validate_ephemeral_volume(ephemeral, &source_path));
            }
        }
    }

    errs
}

fn validate_ephemeral_volume(source: &EphemeralVolumeSource, path: &FieldPath) -> ErrorList {
    let template_path = path.child("volumeTemplate");
    match &source.volume_template {
        None => {
            let mut errs = ErrorList::new();
            errs.push(FieldError::required(&template_path, "must specify volume template"));
            errs
        }
        Some(template) => validate_volume_template(template, &template_path),
    }
}

fn validate_volume_template(template: &VolumeTemplateSpec, path: &FieldPath) -> ErrorList {
    let mut errs = validate_template_metadata(&template.metadata, &path.child("metadata"));

    let spec_path = path.child("spec");
    if template.spec.claim_ref.is_some() {
        errs.push(FieldError::forbidden(
            &spec_path.child("claimRef"),
            "may not specify claimRef on a machine volume template",
        ));
    }
    if template.spec.unclaimable {
        errs.push(FieldError::forbidden(
            &spec_path.child("unclaimable"),
            "may not specify unclaimable on a machine volume template",
        ));
    }

    errs.extend(validate_volume_spec(&template.spec, &spec_path));
    errs
}

fn validate_volume_spec(spec: &VolumeSpec, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    let class_path = path.child("volumeClassRef");
    match &spec.volume_class_ref {
        None => errs.push(FieldError::required(&class_path, "must specify volume class")),
        Some(class) => errs.extend(validate_name(class, &class_path, is_dns1123_label)),
    }

    errs.extend(validate_labels(&spec.volume_pool_selector, &path.child("volumePoolSelector")));

    if let Some(pool) = &spec.volume_pool_ref {
        errs.extend(validate_name(pool, &path.child("volumePoolRef"), is_dns1123_subdomain));
    }

    if spec.unclaimable && spec.claim_ref.is_some() {
        errs.push(FieldError::forbidden(
            &path.child("claimRef"),
            "cannot specify both unclaimable and claimRef",
        ));
    }

    let storage_path = path.child("resources").key(RESOURCE_STORAGE);
    match spec.resources.get(RESOURCE_STORAGE) {
        None => errs.push(FieldError::required(&storage_path, "must specify storage resource")),
        Some(storage) => errs.extend(validate_positive(storage, &storage_path)),
    }

    if let Some(pull_secret) = &spec.image_pull_secret_ref {
        errs.extend(validate_name(pull_secret, &path.child("imagePullSecretRef"), is_dns1123_label));
    }

    errs
}

/// Embedded templates may only carry labels and annotations.
fn validate_template_metadata(meta: &ObjectMeta, path: &FieldPath) -> ErrorList {
    let empty = BTreeMap::new();
    let mut errs = validate_labels(meta.labels.as_ref().unwrap_or(&empty), &path.child("labels"));
    errs.extend(validate_annotations(
        meta.annotations.as_ref().unwrap_or(&empty),
        &path.child("annotations"),
    ));

    let set_fields = [
        ("name", meta.name.is_some()),
        ("generateName", meta.generate_name.is_some()),
        ("namespace", meta.namespace.is_some()),
        ("uid", meta.uid.is_some()),
        ("resourceVersion", meta.resource_version.is_some()),
        ("generation", meta.generation.is_some()),
        ("selfLink", meta.self_link.is_some()),
        ("creationTimestamp", meta.creation_timestamp.is_some()),
        ("deletionTimestamp", meta.deletion_timestamp.is_some()),
        ("deletionGracePeriodSeconds", meta.deletion_grace_period_seconds.is_some()),
        ("ownerReferences", meta.owner_references.as_ref().is_some_and(|v| !v.is_empty())),
        ("finalizers", meta.finalizers.as_ref().is_some_and(|v| !v.is_empty())),
        ("managedFields", meta.managed_fields.as_ref().is_some_and(|v| !v.is_empty())),
    ];
    for (field, set) in set_fields {
        if set {
            errs.push(FieldError::forbidden(&path.child(field), "cannot be set in a template"));
        }
    }
    errs
}

// =============================================================================
// Network Interfaces
// =============================================================================

fn validate_network_interfaces(nics: &[NetworkInterface], path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if nics.is_empty() {
        errs.push(FieldError::required(path, "at least one network interface is required"));
    }

    for (i, nic) in nics.iter().enumerate() {
        let idx_path = path.index(i);
        let sources = nic.sources();

        if nic.name.is_empty() && sources.is_empty() {
            errs.push(FieldError::required(
                &idx_path,
                "either network interface name or source is required",
            ));
        }
        if !nic.name.is_empty() {
            for msg in is_dns1123_label(&nic.name) {
                errs.push(FieldError::invalid(&idx_path.child("name"), &nic.name, msg));
            }
        }

        for (j, source) in sources.iter().enumerate() {
            let source_path = idx_path.child(source.field());
            if j > 0 {
                errs.push(FieldError::forbidden(
                    &source_path,
                    "must only specify one network interface source",
                ));
                continue;
            }
            match source {
                NetworkInterfaceSource::NetworkInterfaceRef(reference) => {
                    errs.extend(validate_name(reference, &source_path, is_dns1123_label));
                }
                NetworkInterfaceSource::Ephemeral(ephemeral) => {
                    errs.extend(validate_ephemeral_network_interface(ephemeral, &source_path));
                }
            }
        }
    }
    errs
}

fn validate_ephemeral_network_interface(
    source: &EphemeralNetworkInterfaceSource,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let template_path = path.child("networkInterfaceTemplate");
    let Some(template) = &source.network_interface_template else {
        errs.push(FieldError::required(&template_path, "must specify network interface template"));
        return errs;
    };

    errs.extend(validate_template_metadata(&template.metadata, &template_path.child("metadata")));

    let spec_path = template_path.child("spec");
    let network_path = spec_path.child("networkRef");
    if template.spec.network_ref.is_empty() {
        errs.push(FieldError::required(&network_path.child("name"), "must specify network"));
    } else {
        errs.extend(validate_name(&template.spec.network_ref, &network_path, is_dns1123_label));
    }

    for (i, family) in template.spec.ip_families.iter().enumerate() {
        if !SUPPORTED_IP_FAMILIES.contains(&family.as_str()) {
            errs.push(FieldError::invalid(
                &spec_path.child("ipFamilies").index(i),
                family,
                format!("supported values: {}", SUPPORTED_IP_FAMILIES.join(", ")),
            ));
        }
    }
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::compute::{
        EmptyDiskVolumeSource, LocalUidReference, NetworkInterfaceSources, NetworkInterfaceSpec,
        NetworkInterfaceTemplateSpec, VolumeSources,
    };
    use crate::validation::ErrorType;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::ByteString;

    fn volume(name: &str, device: &str) -> Volume {
        Volume {
            name: name.into(),
            device: Some(device.into()),
            source: VolumeSources {
                empty_disk: Some(EmptyDiskVolumeSource::default()),
                ..Default::default()
            },
        }
    }

    fn errors_for(spec: &ProviderSpec) -> ErrorList {
        validate_provider_spec(spec, &FieldPath::new("spec"))
    }

    #[test]
    fn test_empty_spec_reports_required_fields() {
        let errs = errors_for(&ProviderSpec::default());
        for field in [
            "spec.machineClassRef",
            "spec.machinePoolRef",
            "spec.image",
            "spec.imagePullSecretRef",
            "spec.machinePoolSelector",
            "spec.networkInterfaces",
        ] {
            assert!(errs.contains(ErrorType::Required, field), "missing Required at {field}");
        }
    }

    #[test]
    fn test_volume_without_source() {
        let spec = ProviderSpec {
            volumes: vec![Volume {
                name: "data".into(),
                device: Some("odb".into()),
                source: VolumeSources::default(),
            }],
            ..Default::default()
        };
        assert!(errors_for(&spec).contains(ErrorType::Invalid, "spec.volume[0]"));
    }

    #[test]
    fn test_volume_with_two_sources() {
        let mut vol = volume("data", "odb");
        vol.source.volume_ref = Some(LocalObjectReference::new("existing"));
        let spec = ProviderSpec {
            volumes: vec![vol],
            ..Default::default()
        };
        let errs = errors_for(&spec);
        assert!(errs.contains(ErrorType::Forbidden, "spec.volume[0].emptyDisk"));
        assert!(!errs.contains(ErrorType::Forbidden, "spec.volume[0].volumeRef"));
    }

    #[test]
    fn test_missing_device() {
        let mut vol = volume("data", "odb");
        vol.device = None;
        let spec = ProviderSpec {
            volumes: vec![vol],
            ..Default::default()
        };
        assert!(errors_for(&spec).contains(ErrorType::Required, "spec.volume[0].device"));
    }

    #[test]
    fn test_ephemeral_volume_without_template() {
        let spec = ProviderSpec {
            volumes: vec![Volume {
                name: "data".into(),
                device: Some("odb".into()),
                source: VolumeSources {
                    ephemeral: Some(EphemeralVolumeSource::default()),
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        assert!(errors_for(&spec).contains(ErrorType::Required, "spec.volume[0].ephemeral.volumeTemplate"));
    }

    const TEMPLATE: &str = "spec.volume[0].ephemeral.volumeTemplate";
    const NIC_TEMPLATE: &str = "spec.networkInterfaces[0].ephemeral.networkInterfaceTemplate";

    fn volume_template() -> VolumeTemplateSpec {
        VolumeTemplateSpec {
            metadata: ObjectMeta::default(),
            spec: VolumeSpec {
                volume_class_ref: Some(LocalObjectReference::new("fast")),
                resources: BTreeMap::from([(RESOURCE_STORAGE.to_string(), Quantity("10Gi".into()))]),
                ..Default::default()
            },
        }
    }

    fn with_volume_template(template: VolumeTemplateSpec) -> ErrorList {
        errors_for(&ProviderSpec {
            volumes: vec![Volume {
                name: "data".into(),
                device: Some("odb".into()),
                source: VolumeSources {
                    ephemeral: Some(EphemeralVolumeSource {
                        volume_template: Some(template),
                    }),
                    ..Default::default()
                },
            }],
            ..Default::default()
        })
    }

    fn with_nic(nic: NetworkInterface) -> ErrorList {
        errors_for(&ProviderSpec {
            network_interfaces: vec![nic],
            ..Default::default()
        })
    }

    fn ephemeral_nic(spec: NetworkInterfaceSpec) -> NetworkInterface {
        NetworkInterface {
            name: "primary".into(),
            source: NetworkInterfaceSources {
                ephemeral: Some(EphemeralNetworkInterfaceSource {
                    network_interface_template: Some(NetworkInterfaceTemplateSpec {
                        metadata: ObjectMeta::default(),
                        spec,
                    }),
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_valid_volume_template() {
        let errs = with_volume_template(volume_template());
        for (error_type, field) in [
            (ErrorType::Required, format!("{TEMPLATE}.spec.volumeClassRef")),
            (ErrorType::Required, format!("{TEMPLATE}.spec.resources[storage]")),
            (ErrorType::Invalid, format!("{TEMPLATE}.spec.resources[storage]")),
        ] {
            assert!(!errs.contains(error_type, &field), "unexpected error at {field}");
        }
    }

    #[test]
    fn test_volume_template_claim_ref_forbidden() {
        let mut template = volume_template();
        template.spec.claim_ref = Some(LocalUidReference {
            name: "claim".into(),
            uid: "1234".into(),
        });
        let errs = with_volume_template(template);
        assert_eq!(errs.count(ErrorType::Forbidden, &format!("{TEMPLATE}.spec.claimRef")), 1);
    }

    #[test]
    fn test_volume_template_unclaimable_forbidden() {
        let mut template = volume_template();
        template.spec.unclaimable = true;
        let errs = with_volume_template(template);
        assert!(errs.contains(ErrorType::Forbidden, &format!("{TEMPLATE}.spec.unclaimable")));
        assert!(!errs.contains(ErrorType::Forbidden, &format!("{TEMPLATE}.spec.claimRef")));
    }

    #[test]
    fn test_volume_template_metadata_allow_list() {
        let mut template = volume_template();
        template.metadata = ObjectMeta {
            name: Some("data".into()),
            namespace: Some("default".into()),
            labels: Some(BTreeMap::from([("app".to_string(), "db".to_string())])),
            ..Default::default()
        };
        let errs = with_volume_template(template);
        assert!(errs.contains(ErrorType::Forbidden, &format!("{TEMPLATE}.metadata.name")));
        assert!(errs.contains(ErrorType::Forbidden, &format!("{TEMPLATE}.metadata.namespace")));
        assert!(!errs.contains(ErrorType::Forbidden, &format!("{TEMPLATE}.metadata.labels")));
        assert!(!errs.contains(ErrorType::Invalid, &format!("{TEMPLATE}.metadata.labels")));
    }

    #[test]
    fn test_volume_template_class_ref() {
        let mut template = volume_template();
        template.spec.volume_class_ref = None;
        let errs = with_volume_template(template);
        assert!(errs.contains(ErrorType::Required, &format!("{TEMPLATE}.spec.volumeClassRef")));

        let mut template = volume_template();
        template.spec.volume_class_ref = Some(LocalObjectReference::new("Not_A_Class"));
        let errs = with_volume_template(template);
        assert!(errs.contains(ErrorType::Invalid, &format!("{TEMPLATE}.spec.volumeClassRef.name")));
    }

    #[test]
    fn test_volume_template_storage() {
        let storage = format!("{TEMPLATE}.spec.resources[storage]");

        let mut template = volume_template();
        template.spec.resources.clear();
        assert!(with_volume_template(template).contains(ErrorType::Required, &storage));

        for size in ["0", "-1Gi"] {
            let mut template = volume_template();
            template.spec.resources.insert(RESOURCE_STORAGE.to_string(), Quantity(size.into()));
            assert!(with_volume_template(template).contains(ErrorType::Invalid, &storage), "{size}");
        }
    }

    #[test]
    fn test_network_interface_without_name_or_source() {
        let errs = with_nic(NetworkInterface::default());
        assert!(errs.contains(ErrorType::Required, "spec.networkInterfaces[0]"));
    }

    #[test]
    fn test_ephemeral_network_interface_network_ref() {
        let errs = with_nic(ephemeral_nic(NetworkInterfaceSpec::default()));
        assert!(errs.contains(ErrorType::Required, &format!("{NIC_TEMPLATE}.spec.networkRef.name")));

        let errs = with_nic(ephemeral_nic(NetworkInterfaceSpec {
            network_ref: LocalObjectReference::new("Bad_Network"),
            ..Default::default()
        }));
        assert!(errs.contains(ErrorType::Invalid, &format!("{NIC_TEMPLATE}.spec.networkRef.name")));
        assert!(!errs.contains(ErrorType::Required, "spec.networkInterfaces[0]"));
    }

    #[test]
    fn test_ephemeral_network_interface_ip_families() {
        let errs = with_nic(ephemeral_nic(NetworkInterfaceSpec {
            network_ref: LocalObjectReference::new("my-network"),
            ip_families: vec!["IPv4".into(), "IPv5".into()],
            ..Default::default()
        }));
        assert!(errs.contains(ErrorType::Invalid, &format!("{NIC_TEMPLATE}.spec.ipFamilies[1]")));
        assert!(!errs.contains(ErrorType::Invalid, &format!("{NIC_TEMPLATE}.spec.ipFamilies[0]")));
    }

    #[test]
    fn test_root_disk() {
        let spec = ProviderSpec {
            root_disk: Some(RootDisk {
                size: Quantity("0".into()),
                volume_class_name: String::new(),
                volume_pool_name: "Not_A_Pool".into(),
            }),
            ..Default::default()
        };
        let errs = errors_for(&spec);
        assert!(errs.contains(ErrorType::Required, "spec.rootDisk.volumeClassName"));
        assert!(errs.contains(ErrorType::Invalid, "spec.rootDisk.volumePoolName"));
        assert!(errs.contains(ErrorType::Invalid, "spec.rootDisk.size"));
    }

    #[test]
    fn test_dns_servers() {
        let spec = ProviderSpec {
            dns_servers: vec!["1.2.3.4".into(), "not-an-ip".into(), "2001:db8::1".into()],
            ..Default::default()
        };
        let errs = errors_for(&spec);
        assert!(errs.contains(ErrorType::Invalid, "spec.dnsServers[1]"));
        assert!(!errs.contains(ErrorType::Invalid, "spec.dnsServers[0]"));
        assert!(!errs.contains(ErrorType::Invalid, "spec.dnsServers[2]"));
    }

    #[test]
    fn test_secret_scope() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                SECRET_USER_DATA.to_string(),
                ByteString(b"#!/bin/bash".to_vec()),
            )])),
            ..Default::default()
        };
        let path = FieldPath::new("secretRef");

        assert!(validate_secret(Some(&secret), SecretScope::Local, &path).is_empty());

        let errs = validate_secret(Some(&secret), SecretScope::Remote, &path);
        assert!(errs.contains(ErrorType::Required, "secretRef.kubeconfig"));
        assert!(errs.contains(ErrorType::Required, "secretRef.namespace"));
        assert!(!errs.contains(ErrorType::Required, "secretRef.userData"));

        let errs = validate_secret(None, SecretScope::Local, &path);
        assert!(errs.contains(ErrorType::Required, "secretRef"));
    }
}
