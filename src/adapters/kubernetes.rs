//! Kubernetes Machine Store Adapter
//!
//! Implements the `MachineStore` port with kube-rs against the IronCore
//! API server. Writes are forced server-side applies.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{debug, instrument};

use crate::api::compute::Machine;
use crate::domain::ports::{label_selector, MachineStore, StoreConnector};
use crate::error::{Error, Result};

/// Machine store backed by a Kubernetes client.
#[derive(Clone)]
pub struct KubeMachineStore {
    client: Client,
    field_manager: String,
}

impl KubeMachineStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn machines(&self, namespace: &str) -> Api<Machine> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn apply_params(&self) -> PatchParams {
        PatchParams::apply(&self.field_manager).force()
    }
}

impl std::fmt::Debug for KubeMachineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeMachineStore")
            .field("field_manager", &self.field_manager)
            .finish()
    }
}

fn object_key(meta: &ObjectMeta) -> Result<(String, String)> {
    let name = meta
        .name
        .clone()
        .ok_or_else(|| Error::Internal("object has no name".to_string()))?;
    Ok((meta.namespace.clone().unwrap_or_default(), name))
}

/// Map a 404 to `Ok(false)`.
fn deleted<T>(result: std::result::Result<T, kube::Error>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl MachineStore for KubeMachineStore {
    #[instrument(skip(self, machine), fields(name = ?machine.metadata.name))]
    async fn apply_machine(&self, machine: &Machine) -> Result<Machine> {
        let (namespace, name) = object_key(&machine.metadata)?;
        let applied = self
            .machines(&namespace)
            .patch(&name, &self.apply_params(), &Patch::Apply(machine))
            .await?;
        debug!(namespace = %namespace, name = %name, "Applied machine");
        Ok(applied)
    }

    #[instrument(skip(self))]
    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<Machine>> {
        Ok(self.machines(namespace).get_opt(name).await?)
    }

    #[instrument(skip(self))]
    async fn list_machines(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Machine>> {
        let mut params = ListParams::default();
        if !labels.is_empty() {
            params = params.labels(&label_selector(labels));
        }
        let list = self.machines(namespace).list(&params).await?;
        debug!(count = list.items.len(), "Listed machines");
        Ok(list.items)
    }

    #[instrument(skip(self))]
    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<bool> {
        deleted(
            self.machines(namespace)
                .delete(name, &DeleteParams::default())
                .await,
        )
    }

    #[instrument(skip(self, secret), fields(name = ?secret.metadata.name))]
    async fn apply_secret(&self, secret: &Secret) -> Result<Secret> {
        let (namespace, name) = object_key(&secret.metadata)?;
        let applied = self
            .secrets(&namespace)
            .patch(&name, &self.apply_params(), &Patch::Apply(secret))
            .await?;
        debug!(namespace = %namespace, name = %name, "Applied secret");
        Ok(applied)
    }

    #[instrument(skip(self))]
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool> {
        deleted(
            self.secrets(namespace)
                .delete(name, &DeleteParams::default())
                .await,
        )
    }
}

/// Connects to clusters described by kubeconfigs carried in machine secrets.
#[derive(Debug, Clone)]
pub struct KubeStoreConnector {
    field_manager: String,
}

impl KubeStoreConnector {
    pub fn new(field_manager: impl Into<String>) -> Self {
        Self {
            field_manager: field_manager.into(),
        }
    }
}

#[async_trait]
impl StoreConnector for KubeStoreConnector {
    async fn connect(&self, kubeconfig: &[u8]) -> Result<Arc<dyn MachineStore>> {
        let text = std::str::from_utf8(kubeconfig)
            .map_err(|e| Error::Internal(format!("kubeconfig is not valid UTF-8: {e}")))?;
        let kubeconfig = Kubeconfig::from_yaml(text)?;
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        let client = Client::try_from(config)?;
        Ok(Arc::new(KubeMachineStore::new(client, self.field_manager.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        let meta = ObjectMeta {
            name: Some("machine-0".into()),
            namespace: Some("default".into()),
            ..Default::default()
        };
        assert_eq!(
            object_key(&meta).unwrap(),
            ("default".to_string(), "machine-0".to_string())
        );
        assert!(object_key(&ObjectMeta::default()).is_err());
    }

    #[test]
    fn test_deleted_maps_not_found() {
        let not_found: std::result::Result<(), kube::Error> =
            Err(kube::Error::Api(kube::error::ErrorResponse {
                status: "Failure".into(),
                message: "not found".into(),
                reason: "NotFound".into(),
                code: 404,
            }));
        assert!(!deleted(not_found).unwrap());
        assert!(deleted(Ok::<_, kube::Error>(())).unwrap());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_kubeconfig() {
        let connector = KubeStoreConnector::new("test");
        assert!(connector.connect(b"\xff\xfe").await.is_err());
        assert!(connector.connect(b"clusters: [").await.is_err());
    }
}
