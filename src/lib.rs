//! IronCore Machine Controller Manager Provider
//!
//! Creates, deletes, lists and inspects IronCore machines on behalf of the
//! Gardener machine controller manager.
//!
//! # Architecture
//!
//! ```text
//! MachineClass + Secret
//!        │
//!        ▼
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ api        │──▶│ validation │──▶│ ignition     │──▶│ driver       │
//! │ (decode)   │   │ (rules)    │   │ (compose)    │   │ (apply)      │
//! └────────────┘   └────────────┘   └──────────────┘   └──────┬───────┘
//!                                                              │ ports
//!                                                              ▼
//!                                                       ┌──────────────┐
//!                                                       │ adapters     │
//!                                                       └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Kubernetes and in-memory machine stores
//! - [`api`] - Device names, the IronCore `Machine` resource and the provider spec
//! - [`domain`] - Ports the driver is written against
//! - [`driver`] - Machine controller driver operations
//! - [`error`] - Error types and status codes
//! - [`ignition`] - Ignition composition and user data preparation
//! - [`validation`] - Provider spec and secret validation

pub mod adapters;
pub mod api;
pub mod domain;
pub mod driver;
pub mod error;
pub mod ignition;
pub mod validation;

// Re-export commonly used types
pub use api::{Machine, ProviderSpec, PROVIDER_NAME};
pub use driver::{Driver, DriverConfig, IroncoreDriver, Target};
pub use error::{Code, Error, Result};
pub use ignition::{Composer, ComposerConfig};
