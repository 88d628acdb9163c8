//! In-memory Machine Store
//!
//! Keeps machines and secrets in process memory. Used by tests and by the
//! CLI's dry-run mode.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use parking_lot::RwLock;

use crate::api::compute::Machine;
use crate::domain::ports::{matches_labels, MachineStore, StoreConnector};
use crate::error::{Error, Result};

type Key = (String, String);

fn key(namespace: Option<&String>, name: Option<&String>) -> Result<Key> {
    let name = name.ok_or_else(|| Error::Internal("object has no name".to_string()))?;
    Ok((namespace.cloned().unwrap_or_default(), name.clone()))
}

/// Machine store holding objects in memory.
#[derive(Debug, Default)]
pub struct InMemoryMachineStore {
    machines: RwLock<BTreeMap<Key, Machine>>,
    secrets: RwLock<BTreeMap<Key, Secret>>,
    retain_deleted_machines: bool,
}

impl InMemoryMachineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose machines never disappear after deletion, as if held
    /// by a finalizer.
    pub fn with_retained_machines() -> Self {
        Self {
            retain_deleted_machines: true,
            ..Self::default()
        }
    }

    pub fn machine(&self, namespace: &str, name: &str) -> Option<Machine> {
        self.machines
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn machines(&self) -> Vec<Machine> {
        self.machines.read().values().cloned().collect()
    }

    pub fn secrets(&self) -> Vec<Secret> {
        self.secrets.read().values().cloned().collect()
    }
}

#[async_trait]
impl MachineStore for InMemoryMachineStore {
    async fn apply_machine(&self, machine: &Machine) -> Result<Machine> {
        let key = key(machine.metadata.namespace.as_ref(), machine.metadata.name.as_ref())?;
        self.machines.write().insert(key, machine.clone());
        Ok(machine.clone())
    }

    async fn get_machine(&self, namespace: &str, name: &str) -> Result<Option<Machine>> {
        Ok(self.machine(namespace, name))
    }

    async fn list_machines(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Machine>> {
        Ok(self
            .machines
            .read()
            .iter()
            .filter(|((ns, _), m)| ns == namespace && matches_labels(m.metadata.labels.as_ref(), labels))
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn delete_machine(&self, namespace: &str, name: &str) -> Result<bool> {
        let key = (namespace.to_string(), name.to_string());
        if self.retain_deleted_machines {
            return Ok(self.machines.read().contains_key(&key));
        }
        Ok(self.machines.write().remove(&key).is_some())
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<Secret> {
        let key = key(secret.metadata.namespace.as_ref(), secret.metadata.name.as_ref())?;
        self.secrets.write().insert(key, secret.clone());
        Ok(secret.clone())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self
            .secrets
            .write()
            .remove(&(namespace.to_string(), name.to_string()))
            .is_some())
    }
}

/// Connector handing out one shared in-memory store for every kubeconfig.
#[derive(Debug, Default)]
pub struct InMemoryStoreConnector {
    store: Arc<InMemoryMachineStore>,
    kubeconfigs: RwLock<Vec<Vec<u8>>>,
}

impl InMemoryStoreConnector {
    pub fn new(store: Arc<InMemoryMachineStore>) -> Self {
        Self {
            store,
            kubeconfigs: RwLock::default(),
        }
    }

    /// Kubeconfigs seen so far, in connection order.
    pub fn kubeconfigs(&self) -> Vec<Vec<u8>> {
        self.kubeconfigs.read().clone()
    }
}

#[async_trait]
impl StoreConnector for InMemoryStoreConnector {
    async fn connect(&self, kubeconfig: &[u8]) -> Result<Arc<dyn MachineStore>> {
        if kubeconfig.is_empty() {
            return Err(Error::Internal("kubeconfig is empty".to_string()));
        }
        self.kubeconfigs.write().push(kubeconfig.to_vec());
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::compute::MachineSpec;

    fn machine(namespace: &str, name: &str, labels: &[(&str, &str)]) -> Machine {
        let mut m = Machine::new(name, MachineSpec::default());
        m.metadata.namespace = Some(namespace.to_string());
        m.metadata.labels = Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        m
    }

    #[tokio::test]
    async fn test_machine_lifecycle() {
        let store = InMemoryMachineStore::new();
        store.apply_machine(&machine("ns", "m0", &[])).await.unwrap();

        assert!(store.get_machine("ns", "m0").await.unwrap().is_some());
        assert!(store.get_machine("other", "m0").await.unwrap().is_none());

        assert!(store.delete_machine("ns", "m0").await.unwrap());
        assert!(!store.delete_machine("ns", "m0").await.unwrap());
        assert!(store.get_machine("ns", "m0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_namespace_and_labels() {
        let store = InMemoryMachineStore::new();
        store.apply_machine(&machine("ns", "a", &[("shoot", "x")])).await.unwrap();
        store.apply_machine(&machine("ns", "b", &[("shoot", "y")])).await.unwrap();
        store.apply_machine(&machine("other", "c", &[("shoot", "x")])).await.unwrap();

        let selector = BTreeMap::from([("shoot".to_string(), "x".to_string())]);
        let listed = store.list_machines("ns", &selector).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].metadata.name.as_deref(), Some("a"));

        assert_eq!(store.list_machines("ns", &BTreeMap::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retained_machines() {
        let store = InMemoryMachineStore::with_retained_machines();
        store.apply_machine(&machine("ns", "m0", &[])).await.unwrap();
        assert!(store.delete_machine("ns", "m0").await.unwrap());
        assert!(store.machine("ns", "m0").is_some());
    }

    #[tokio::test]
    async fn test_connector_records_kubeconfigs() {
        let store = Arc::new(InMemoryMachineStore::new());
        let connector = InMemoryStoreConnector::new(store.clone());

        assert!(connector.connect(b"").await.is_err());
        let connected = connector.connect(b"apiVersion: v1").await.unwrap();
        connected.apply_machine(&machine("ns", "m0", &[])).await.unwrap();

        assert!(store.machine("ns", "m0").is_some());
        assert_eq!(connector.kubeconfigs(), vec![b"apiVersion: v1".to_vec()]);
    }
}
