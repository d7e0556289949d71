//! Controller-specific error types.
//!
//! This module defines error types specific to the Egress IP Controller
//! that are not covered by upstream library errors.

use ip_pool::IpPoolError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Egress IP Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Egress IP pool error
    #[error("IP pool error: {0}")]
    Pool(#[from] IpPoolError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
