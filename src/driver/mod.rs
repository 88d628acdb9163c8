//! Driver Orchestration
//!
//! Implements the machine controller's driver contract on top of a
//! [`MachineStore`]: requests are checked, the provider spec is decoded
//! and validated, the ignition is rendered and the resulting `Machine`
//! and ignition `Secret` are applied.
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────┐   ┌──────────────┐
//! │   Request    │──▶│ Validation │──▶│ Composer │──▶│ MachineStore │
//! └──────────────┘   └────────────┘   └──────────┘   └──────────────┘
//! ```

mod create;
mod delete;
mod list;
mod request;
mod status;
mod volumes;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

use crate::api::provider::{ProviderSpec, PROVIDER_NAME, SECRET_KUBECONFIG, SECRET_NAMESPACE};
use crate::domain::ports::{MachineStore, StoreConnector};
use crate::error::{Error, Result};
use crate::ignition::Composer;
use crate::validation::{validate_provider_spec_and_secret, SecretScope};

pub use request::*;

/// CSI driver whose volumes belong to IronCore machines
pub const IRONCORE_CSI_DRIVER: &str = "csi.ironcore.dev";

/// Field manager used for server-side applies
pub const DEFAULT_FIELD_MANAGER: &str = "mcm.ironcore.dev/field-owner";

/// Name of the volume a machine boots from when it has a root disk
pub const ROOT_DISK_NAME: &str = "primary";

/// Device of the root disk
pub const ROOT_DISK_DEVICE: &str = "oda";

// =============================================================================
// Driver Contract
// =============================================================================

/// Operations the machine controller calls on a provider.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn create_machine(&self, req: &CreateMachineRequest) -> Result<CreateMachineResponse>;

    async fn delete_machine(&self, req: &DeleteMachineRequest) -> Result<DeleteMachineResponse>;

    async fn get_machine_status(
        &self,
        req: &GetMachineStatusRequest,
    ) -> Result<GetMachineStatusResponse>;

    async fn list_machines(&self, req: &ListMachinesRequest) -> Result<ListMachinesResponse>;

    async fn get_volume_ids(&self, req: &GetVolumeIdsRequest) -> Result<GetVolumeIdsResponse>;
}

// =============================================================================
// Configuration
// =============================================================================

/// Where machines are created.
#[derive(Clone)]
pub enum Target {
    /// A fixed namespace of the cluster `store` talks to.
    Namespace {
        store: Arc<dyn MachineStore>,
        namespace: String,
    },
    /// The cluster and namespace named by the `kubeconfig` and `namespace`
    /// keys of each request's secret.
    SecretKubeconfig(Arc<dyn StoreConnector>),
}

impl Target {
    fn secret_scope(&self) -> SecretScope {
        match self {
            Target::Namespace { .. } => SecretScope::Local,
            Target::SecretKubeconfig(_) => SecretScope::Remote,
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Namespace { namespace, .. } => {
                f.debug_tuple("Namespace").field(namespace).finish()
            }
            Target::SecretKubeconfig(_) => f.write_str("SecretKubeconfig"),
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// CSI driver whose persistent volumes are reported by `get_volume_ids`
    pub csi_driver: String,

    /// Interval between checks whether a deleted machine is gone
    pub delete_poll_interval: Duration,

    /// How long to wait for a deleted machine to disappear
    pub delete_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            csi_driver: IRONCORE_CSI_DRIVER.to_string(),
            delete_poll_interval: Duration::from_secs(5),
            delete_timeout: Duration::from_secs(10 * 60),
        }
    }
}

// =============================================================================
// IronCore Driver
// =============================================================================

/// Driver creating IronCore machines.
#[derive(Debug)]
pub struct IroncoreDriver {
    target: Target,
    composer: Composer,
    config: DriverConfig,
}

impl IroncoreDriver {
    pub fn new(target: Target, composer: Composer, config: DriverConfig) -> Self {
        Self {
            target,
            composer,
            config,
        }
    }

    /// Store and namespace a request's resources live in.
    async fn resolve(&self, secret: &Secret) -> Result<(Arc<dyn MachineStore>, String)> {
        match &self.target {
            Target::Namespace { store, namespace } => Ok((store.clone(), namespace.clone())),
            Target::SecretKubeconfig(connector) => {
                let namespace = String::from_utf8(secret_data(secret, SECRET_NAMESPACE)?.to_vec())
                    .map_err(|e| {
                        Error::Internal(format!(
                            "invalid namespace in machine secret {}: {e}",
                            secret_key(secret)
                        ))
                    })?;
                let kubeconfig = secret_data(secret, SECRET_KUBECONFIG)?;
                let store = connector.connect(kubeconfig).await.map_err(|e| {
                    Error::Internal(format!(
                        "failed to create client for machine secret {}: {e}",
                        secret_key(secret)
                    ))
                })?;
                Ok((store, namespace))
            }
        }
    }

    /// Decode and validate the provider spec of a machine class.
    fn provider_spec(&self, class: &MachineClass, secret: Option<&Secret>) -> Result<ProviderSpec> {
        let spec =
            ProviderSpec::from_bytes(&class.provider_spec).map_err(|e| Error::Internal(e.to_string()))?;
        let errs = validate_provider_spec_and_secret(&spec, secret, self.target.secret_scope());
        if !errs.is_empty() {
            return Err(Error::Validation(errs));
        }
        Ok(spec)
    }
}

#[async_trait]
impl Driver for IroncoreDriver {
    async fn create_machine(&self, req: &CreateMachineRequest) -> Result<CreateMachineResponse> {
        self.create(req).await
    }

    async fn delete_machine(&self, req: &DeleteMachineRequest) -> Result<DeleteMachineResponse> {
        self.delete(req).await
    }

    async fn get_machine_status(
        &self,
        req: &GetMachineStatusRequest,
    ) -> Result<GetMachineStatusResponse> {
        self.status(req).await
    }

    async fn list_machines(&self, req: &ListMachinesRequest) -> Result<ListMachinesResponse> {
        self.list(req).await
    }

    async fn get_volume_ids(&self, req: &GetVolumeIdsRequest) -> Result<GetVolumeIdsResponse> {
        Ok(self.volume_ids(req))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Unwrap the parts of a request every machine operation needs.
fn check_request<'a>(
    machine: Option<&'a MachineRef>,
    class: Option<&'a MachineClass>,
    secret: Option<&'a Secret>,
) -> Result<(&'a MachineRef, &'a MachineClass, &'a Secret)> {
    match (machine, class, secret) {
        (Some(machine), Some(class), Some(secret)) => {
            check_provider(class)?;
            Ok((machine, class, secret))
        }
        _ => Err(Error::InvalidArgument("received empty request".to_string())),
    }
}

fn check_provider(class: &MachineClass) -> Result<()> {
    if class.provider != PROVIDER_NAME {
        return Err(Error::InvalidArgument(format!(
            "requested provider '{}' is not supported by the driver '{}'",
            class.provider, PROVIDER_NAME
        )));
    }
    Ok(())
}

fn secret_key(secret: &Secret) -> String {
    format!(
        "{}/{}",
        secret.metadata.namespace.as_deref().unwrap_or_default(),
        secret.metadata.name.as_deref().unwrap_or_default()
    )
}

fn secret_data<'a>(secret: &'a Secret, key: &str) -> Result<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.as_slice())
        .ok_or_else(|| {
            Error::Internal(format!(
                "failed to find {key} in machine secret {}",
                secret_key(secret)
            ))
        })
}

/// Provider ID of a machine, `ironcore://<namespace>/<name>`.
pub fn provider_id(namespace: &str, name: &str) -> String {
    format!("{PROVIDER_NAME}://{namespace}/{name}")
}

/// Name of the secret holding a machine's ignition.
pub fn ignition_secret_name(machine: &str) -> String {
    format!("{machine}-ignition")
}
