//! Provider spec
//!
//! The opaque `providerSpec` blob of a machine class, decoded into the
//! machine topology the provider creates on IronCore.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::compute::{LocalObjectReference, NetworkInterface, Volume, DEFAULT_IGNITION_KEY};
use crate::error::{Error, Result};

/// API version of the provider spec
pub const API_VERSION: &str = "mcm.gardener.cloud/v1alpha1";

/// Provider name served by this driver
pub const PROVIDER_NAME: &str = "ironcore";

/// Secret key holding the user data passed to the machine
pub const SECRET_USER_DATA: &str = "userData";

/// Secret key holding the kubeconfig of the remote IronCore cluster
pub const SECRET_KUBECONFIG: &str = "kubeconfig";

/// Secret key holding the namespace in the remote IronCore cluster
pub const SECRET_NAMESPACE: &str = "namespace";

/// Machine configuration of a machine class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Machine class (size) of the machine.
    #[serde(default)]
    pub machine_class_ref: LocalObjectReference,

    /// Pool the machine is scheduled onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_pool_ref: Option<LocalObjectReference>,

    /// Labels a pool must carry to host the machine.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub machine_pool_selector: BTreeMap<String, String>,

    /// OCI image the machine boots from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret_ref: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    /// Boot from a volume created from the image instead of the image itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_disk: Option<RootDisk>,

    /// Butane document merged into the base ignition.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ignition: String,

    /// Replace overlapping lists of the base ignition instead of appending.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignition_override: bool,

    /// Key of the ignition in the ignition secret. Defaults to
    /// [`DEFAULT_IGNITION_KEY`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ignition_secret_key: String,

    /// Labels put on every created resource, also used to list machines.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// DNS resolvers configured on the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<String>,
}

impl ProviderSpec {
    /// Decode a provider spec from its raw JSON bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(Error::from)
    }

    /// Secret key the rendered ignition is stored under.
    pub fn ignition_key(&self) -> &str {
        if self.ignition_secret_key.is_empty() {
            DEFAULT_IGNITION_KEY
        } else {
            &self.ignition_secret_key
        }
    }
}

/// Root disk of a machine booting from a volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootDisk {
    pub size: Quantity,
    #[serde(default)]
    pub volume_class_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub volume_pool_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_provider_spec() {
        let raw = br#"{
            "machineClassRef": {"name": "x3-large"},
            "machinePoolRef": {"name": "az1"},
            "machinePoolSelector": {"zone": "a"},
            "image": "my-image",
            "rootDisk": {"size": "10Gi", "volumeClassName": "fast"},
            "ignitionOverride": true,
            "labels": {"shoot-name": "my-shoot"},
            "dnsServers": ["1.2.3.4"]
        }"#;

        let spec = ProviderSpec::from_bytes(raw).unwrap();
        assert_eq!(spec.machine_class_ref.name, "x3-large");
        assert_eq!(spec.machine_pool_ref.as_ref().unwrap().name, "az1");
        assert_eq!(spec.root_disk.as_ref().unwrap().size.0, "10Gi");
        assert!(spec.ignition_override);
        assert_eq!(spec.dns_servers, vec!["1.2.3.4".to_string()]);
    }

    #[test]
    fn test_ignition_key_default() {
        let mut spec = ProviderSpec::default();
        assert_eq!(spec.ignition_key(), "ignition.json");

        spec.ignition_secret_key = "custom".into();
        assert_eq!(spec.ignition_key(), "custom");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(ProviderSpec::from_bytes(b"not json").is_err());
        assert!(ProviderSpec::from_bytes(br#"{"volumes": "nope"}"#).is_err());
    }
}
