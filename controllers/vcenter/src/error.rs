//! Controller-specific error types.
//!
//! This module defines the failures a controller can detect. None of them
//! escape an operation: they are converted into error records or error
//! strings inside the operation's response.

use thiserror::Error;
use vcenter_client::VcenterError;

/// Remediation hint for problems with the supplied desired spec
pub const REMEDIATION_CHECK_INPUT: &str = "Check input spec and retry the operation";

/// Remediation hint for problems reported by, or reaching, vCenter
pub const REMEDIATION_CHECK_COMPONENT: &str = "Check component on vcenter";

/// Remediation hint for controller misconfiguration
pub const REMEDIATION_CHECK_CONFIG: &str = "Check controller configuration and retry";

/// Errors that can occur in the vCenter configuration controllers.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// REST call failed
    #[error("vCenter error: {0}")]
    Transport(VcenterError),

    /// Task did not finish in time
    #[error("Task timeout: {0}")]
    TaskTimeout(String),

    /// Task reached an invalid or unknown status
    #[error("Task status error: {0}")]
    TaskStatus(String),

    /// Response was missing expected keys
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Desired spec named a component the controller does not manage
    #[error("Unsupported component: {0}")]
    UnsupportedComponent(String),

    /// Desired spec was empty or had the wrong shape
    #[error("Invalid desired spec: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported controller: {0}")]
    UnsupportedController(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ControllerError {
    /// Remediation hint for this failure, chosen by the kind of problem detected
    pub fn remediation(&self) -> &'static str {
        match self {
            ControllerError::UnsupportedComponent(_) | ControllerError::Validation(_) => REMEDIATION_CHECK_INPUT,
            ControllerError::InvalidConfig(_)
            | ControllerError::UnsupportedController(_)
            | ControllerError::UnsupportedOperation(_) => REMEDIATION_CHECK_CONFIG,
            ControllerError::Transport(_)
            | ControllerError::TaskTimeout(_)
            | ControllerError::TaskStatus(_)
            | ControllerError::MalformedResponse(_) => REMEDIATION_CHECK_COMPONENT,
        }
    }

    /// Whether the failure happened talking to vCenter rather than in local input
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ControllerError::Transport(_)
                | ControllerError::TaskTimeout(_)
                | ControllerError::TaskStatus(_)
                | ControllerError::MalformedResponse(_)
        )
    }
}

impl From<VcenterError> for ControllerError {
    fn from(error: VcenterError) -> Self {
        match error {
            VcenterError::TaskTimeout { .. } => ControllerError::TaskTimeout(error.to_string()),
            VcenterError::TaskStatus { .. } => ControllerError::TaskStatus(error.to_string()),
            VcenterError::InvalidResponse(message) => ControllerError::MalformedResponse(message),
            other => ControllerError::Transport(other),
        }
    }
}
