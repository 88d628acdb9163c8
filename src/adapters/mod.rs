//! Infrastructure Adapters
//!
//! Implementations of the domain ports.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │      Ports: MachineStore │ StoreConnector    │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │ KubeMachineStore     │ InMemoryMachineStore  │
//! │ KubeStoreConnector   │ InMemoryStoreConnector│
//! └──────────────────────────────────────────────┘
//! ```

mod kubernetes;
mod memory;

pub use kubernetes::{KubeMachineStore, KubeStoreConnector};
pub use memory::{InMemoryMachineStore, InMemoryStoreConnector};
