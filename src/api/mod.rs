//! API types
//!
//! - [`device`] - block device naming scheme
//! - [`compute`] - IronCore compute resources written by the driver
//! - [`provider`] - the machine class provider spec

pub mod compute;
pub mod device;
pub mod provider;

pub use compute::{Machine, MachineSpec};
pub use provider::{ProviderSpec, RootDisk, PROVIDER_NAME};
