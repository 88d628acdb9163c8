//! IronCore compute resources
//!
//! The subset of the `compute.ironcore.dev/v1alpha1` API the provider reads
//! and writes: the `Machine` resource with its network interfaces and
//! volumes, plus the embedded templates for ephemeral sources.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ignition key used when the machine class does not name one.
pub const DEFAULT_IGNITION_KEY: &str = "ignition.json";

/// Resource name of the storage quantity in a volume's resource list.
pub const RESOURCE_STORAGE: &str = "storage";

// =============================================================================
// References
// =============================================================================

/// Reference to an object in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

impl LocalObjectReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Reference to an object in the same namespace, pinned to its UID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocalUidReference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

/// Selects a key of a secret in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SecretKeySelector {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
}

// =============================================================================
// Machine CRD
// =============================================================================

/// Machine is a virtual machine scheduled onto a machine pool.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "compute.ironcore.dev",
    version = "v1alpha1",
    kind = "Machine",
    plural = "machines",
    status = "MachineStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    pub machine_class_ref: LocalObjectReference,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub machine_pool_selector: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_pool_ref: Option<LocalObjectReference>,

    #[serde(default)]
    pub power: Power,

    /// Boot image, used when the machine does not boot from a volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition_ref: Option<SecretKeySelector>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Power {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<MachineState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MachineState {
    Pending,
    Running,
    Shutdown,
    Terminating,
    Terminated,
}

// =============================================================================
// Volumes
// =============================================================================

/// A volume attached to a machine.
///
/// On the wire the source is a set of optional fields; use
/// [`Volume::sources`] to inspect the ones that are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(flatten)]
    pub source: VolumeSources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_disk: Option<EmptyDiskVolumeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<EphemeralVolumeSource>,
}

/// One populated volume source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeSource<'a> {
    VolumeRef(&'a LocalObjectReference),
    EmptyDisk(&'a EmptyDiskVolumeSource),
    Ephemeral(&'a EphemeralVolumeSource),
}

impl VolumeSource<'_> {
    /// Wire name of the source field.
    pub fn field(&self) -> &'static str {
        match self {
            VolumeSource::VolumeRef(_) => "volumeRef",
            VolumeSource::EmptyDisk(_) => "emptyDisk",
            VolumeSource::Ephemeral(_) => "ephemeral",
        }
    }
}

impl Volume {
    /// All sources set on this volume, in field order.
    pub fn sources(&self) -> Vec<VolumeSource<'_>> {
        let s = &self.source;
        let mut sources = Vec::with_capacity(1);
        if let Some(r) = &s.volume_ref {
            sources.push(VolumeSource::VolumeRef(r));
        }
        if let Some(e) = &s.empty_disk {
            sources.push(VolumeSource::EmptyDisk(e));
        }
        if let Some(e) = &s.ephemeral {
            sources.push(VolumeSource::Ephemeral(e));
        }
        sources
    }

    /// The source of this volume, if exactly one is set.
    pub fn source(&self) -> Option<VolumeSource<'_>> {
        match self.sources().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDiskVolumeSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<Quantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralVolumeSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_template: Option<VolumeTemplateSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: VolumeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_class_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volume_pool_selector: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_pool_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_ref: Option<LocalUidReference>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unclaimable: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret_ref: Option<LocalObjectReference>,
}

// =============================================================================
// Network Interfaces
// =============================================================================

/// A network interface of a machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub source: NetworkInterfaceSources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interface_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<EphemeralNetworkInterfaceSource>,
}

/// One populated network interface source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetworkInterfaceSource<'a> {
    NetworkInterfaceRef(&'a LocalObjectReference),
    Ephemeral(&'a EphemeralNetworkInterfaceSource),
}

impl NetworkInterfaceSource<'_> {
    pub fn field(&self) -> &'static str {
        match self {
            NetworkInterfaceSource::NetworkInterfaceRef(_) => "networkInterfaceRef",
            NetworkInterfaceSource::Ephemeral(_) => "ephemeral",
        }
    }
}

impl NetworkInterface {
    /// All sources set on this interface, in field order.
    pub fn sources(&self) -> Vec<NetworkInterfaceSource<'_>> {
        let s = &self.source;
        let mut sources = Vec::with_capacity(1);
        if let Some(r) = &s.network_interface_ref {
            sources.push(NetworkInterfaceSource::NetworkInterfaceRef(r));
        }
        if let Some(e) = &s.ephemeral {
            sources.push(NetworkInterfaceSource::Ephemeral(e));
        }
        sources
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralNetworkInterfaceSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_interface_template: Option<NetworkInterfaceTemplateSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkInterfaceTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NetworkInterfaceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceSpec {
    #[serde(default)]
    pub network_ref: LocalObjectReference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_families: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<IpSource>,
}

/// Either a literal address or a prefix allocated from a parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IpSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<EphemeralPrefixSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralPrefixSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_template: Option<PrefixTemplateSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PrefixTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PrefixSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrefixSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_family: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<LocalObjectReference>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_volume_sources_from_wire() {
        let volume: Volume = serde_json::from_value(json!({
            "name": "data",
            "device": "odb",
            "volumeRef": {"name": "existing"},
            "emptyDisk": {"sizeLimit": "1Gi"}
        }))
        .unwrap();

        let sources = volume.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].field(), "volumeRef");
        assert_eq!(sources[1].field(), "emptyDisk");
        assert!(volume.source().is_none());
    }

    #[test]
    fn test_single_volume_source() {
        let volume = Volume {
            name: "scratch".into(),
            device: Some("odc".into()),
            source: VolumeSources {
                empty_disk: Some(EmptyDiskVolumeSource::default()),
                ..Default::default()
            },
        };
        assert!(matches!(volume.source(), Some(VolumeSource::EmptyDisk(_))));
    }

    #[test]
    fn test_machine_serializes_camel_case() {
        let machine = Machine::new(
            "machine-0",
            MachineSpec {
                machine_class_ref: LocalObjectReference::new("x3-large"),
                image: Some("my-image".into()),
                ignition_ref: Some(SecretKeySelector {
                    name: "machine-0-ignition".into(),
                    key: DEFAULT_IGNITION_KEY.into(),
                }),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&machine).unwrap();
        assert_eq!(value["apiVersion"], "compute.ironcore.dev/v1alpha1");
        assert_eq!(value["kind"], "Machine");
        assert_eq!(value["spec"]["machineClassRef"]["name"], "x3-large");
        assert_eq!(value["spec"]["power"], "On");
        assert_eq!(value["spec"]["ignitionRef"]["key"], "ignition.json");
        assert!(value["spec"].get("volumes").is_none());
    }

    #[test]
    fn test_network_interface_sources() {
        let nic: NetworkInterface = serde_json::from_value(json!({
            "name": "primary",
            "ephemeral": {
                "networkInterfaceTemplate": {
                    "spec": {"networkRef": {"name": "my-network"}, "ipFamilies": ["IPv4"]}
                }
            }
        }))
        .unwrap();

        let sources = nic.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].field(), "ephemeral");
    }
}
