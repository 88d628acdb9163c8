//! Validation of provider specs and machine secrets
//!
//! Field errors follow the Kubernetes conventions: each carries a kind
//! (`Required`, `Forbidden`, `Invalid`, `Duplicate`, `TooLong`) and the
//! path of the offending field.

pub mod field;
pub mod names;
pub mod provider;
pub mod quantity;

pub use field::{ErrorList, ErrorType, FieldError, FieldPath};
pub use provider::{validate_provider_spec, validate_provider_spec_and_secret, validate_secret, SecretScope};
