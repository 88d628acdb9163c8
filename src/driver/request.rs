//! Driver requests and responses

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{PersistentVolumeSpec, Secret};

/// Machine class as handed over by the machine controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineClass {
    pub name: String,
    /// Provider the class is meant for, must be `ironcore`.
    pub provider: String,
    /// Raw JSON provider spec.
    pub provider_spec: Vec<u8>,
}

/// Machine a request is about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRef {
    pub name: String,
}

impl MachineRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateMachineRequest {
    pub machine: Option<MachineRef>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMachineResponse {
    pub provider_id: String,
    pub node_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteMachineRequest {
    pub machine: Option<MachineRef>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteMachineResponse {}

#[derive(Debug, Clone, Default)]
pub struct GetMachineStatusRequest {
    pub machine: Option<MachineRef>,
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetMachineStatusResponse {
    pub provider_id: String,
    pub node_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListMachinesRequest {
    pub machine_class: Option<MachineClass>,
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMachinesResponse {
    /// Provider ID to machine name.
    pub machine_list: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetVolumeIdsRequest {
    pub pv_specs: Vec<PersistentVolumeSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetVolumeIdsResponse {
    pub volume_ids: Vec<String>,
}
