//! Error types for the IronCore machine provider

use std::fmt;

use thiserror::Error;

use crate::validation::ErrorList;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Status codes understood by the machine controller.
///
/// The controller derives its retry policy from the code: `Unknown` and
/// `DeadlineExceeded` lead to a short retry, the others to a long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    InvalidArgument,
    NotFound,
    Internal,
    Unknown,
    DeadlineExceeded,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::InvalidArgument => "InvalidArgument",
            Code::NotFound => "NotFound",
            Code::Internal => "Internal",
            Code::Unknown => "Unknown",
            Code::DeadlineExceeded => "DeadlineExceeded",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while validating, rendering or applying machines
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Device Names
    // =========================================================================
    /// Device name does not follow the `<prefix><suffix>` scheme
    #[error("{name} does not match device name regex {pattern}")]
    MalformedDeviceName { name: String, pattern: String },

    /// Device prefix is not exactly two lowercase letters
    #[error("invalid device prefix {prefix:?}: must be two lowercase letters")]
    InvalidDevicePrefix { prefix: String },

    /// Device index outside of the representable range
    #[error("device index {index} exceeds the maximum index {max}")]
    DeviceIndexOutOfRange { index: usize, max: usize },

    // =========================================================================
    // Boot Configuration
    // =========================================================================
    /// User data already carries an SSH key section
    #[error("userdata already contains key `ssh_authorized_keys`")]
    DuplicateKeysSection,

    /// YAML document could not be parsed
    #[error("failed to parse YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON document could not be parsed or written
    #[error("failed to process JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Base and override documents disagree on the shape of a value
    #[error("cannot merge {overlay} into {base} at {path}")]
    MergeConflict {
        path: String,
        base: &'static str,
        overlay: &'static str,
    },

    /// Template substitution failed
    #[error("failed to render ignition template: {0}")]
    Template(String),

    /// Butane to ignition translation failed
    #[error("failed to translate butane config: {0}")]
    Translate(String),

    // =========================================================================
    // Validation
    // =========================================================================
    /// Provider spec or secret violate field rules
    #[error("failed to validate provider spec and secret: {0}")]
    Validation(ErrorList),

    // =========================================================================
    // Driver Status
    // =========================================================================
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Unknown(String),

    #[error("{0}")]
    DeadlineExceeded(String),

    // =========================================================================
    // Kubernetes
    // =========================================================================
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Kubeconfig could not be loaded
    #[error("invalid kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

impl Error {
    /// Status code reported to the machine controller for this error.
    pub fn code(&self) -> Code {
        match self {
            Error::InvalidArgument(_) => Code::InvalidArgument,
            Error::NotFound(_) => Code::NotFound,
            Error::Unknown(_) => Code::Unknown,
            Error::DeadlineExceeded(_) => Code::DeadlineExceeded,
            Error::Kube(kube::Error::Api(e)) if e.code == 404 => Code::NotFound,
            _ => Code::Internal,
        }
    }

    /// Whether the error denotes a missing Kubernetes object.
    pub fn is_not_found(&self) -> bool {
        self.code() == Code::NotFound
    }

    pub(crate) fn template(err: tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Error::Template(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidArgument("x".into()).code(), Code::InvalidArgument);
        assert_eq!(Error::NotFound("x".into()).code(), Code::NotFound);
        assert_eq!(Error::Unknown("x".into()).code(), Code::Unknown);
        assert_eq!(Error::DeadlineExceeded("x".into()).code(), Code::DeadlineExceeded);
        assert_eq!(Error::DuplicateKeysSection.code(), Code::Internal);
        assert_eq!(Error::Translate("x".into()).code(), Code::Internal);
    }

    #[test]
    fn test_kube_not_found_maps_to_not_found() {
        let err = Error::Kube(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".into(),
            message: "machines \"foo\" not found".into(),
            reason: "NotFound".into(),
            code: 404,
        }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_device_message() {
        let err = Error::MalformedDeviceName {
            name: "f_aa".into(),
            pattern: "^[a-z]{2}$".into(),
        };
        assert_eq!(err.to_string(), "f_aa does not match device name regex ^[a-z]{2}$");
    }
}
