//! Domain Layer
//!
//! - **Ports** (`ports.rs`) - Trait abstractions over the IronCore API
//!
//! ```ignore
//! use ironcore_mcm_provider::domain::ports::MachineStore;
//!
//! async fn exists<S: MachineStore>(store: &S, ns: &str, name: &str) -> Result<bool> {
//!     Ok(store.get_machine(ns, name).await?.is_some())
//! }
//! ```

pub mod ports;

pub use ports::{MachineStore, StoreConnector};
