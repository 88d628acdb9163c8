//! Domain Ports
//!
//! The driver talks to IronCore only through these traits. The Kubernetes
//! adapter implements them against a live cluster, the in-memory adapter
//! backs tests and dry runs.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Driver (create/delete/list)  │
//! └──────────────┬───────────────┘
//!                │ MachineStore / StoreConnector
//!                ▼
//! ┌──────────────────────────────┐
//! │ KubeMachineStore │ InMemory  │
//! └──────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;

use crate::api::compute::Machine;
use crate::error::Result;

/// Persistence of machines and their ignition secrets in one cluster.
///
/// Objects are addressed by namespace and name. Apply operations are
/// server-side applies owned by the store's field manager.
#[async_trait]
pub trait MachineStore: Send + Sync {
    /// Create or update a machine.
    async fn apply_machine(&self, machine: &Machine) -> Result<Machine>;

    /// Fetch a machine, `None` if it does not exist.
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<Machine>>;

    /// List machines carrying all of `labels`.
    async fn list_machines(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Machine>>;

    /// Request deletion of a machine. Returns `false` if it did not exist.
    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<bool>;

    /// Create or update a secret.
    async fn apply_secret(&self, secret: &Secret) -> Result<Secret>;

    /// Delete a secret. Returns `false` if it did not exist.
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool>;
}

/// Opens a [`MachineStore`] on the cluster described by a kubeconfig.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, kubeconfig: &[u8]) -> Result<Arc<dyn MachineStore>>;
}

/// Render a label map as a Kubernetes equality selector (`a=b,c=d`).
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `labels` contains every entry of `selector`.
pub fn matches_labels(labels: Option<&BTreeMap<String, String>>, selector: &BTreeMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
}
