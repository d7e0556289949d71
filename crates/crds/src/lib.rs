//! EgressOps CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for EgressOps controllers.

pub mod conditions;
pub mod egress_ip_claim;

pub use conditions::*;
pub use egress_ip_claim::*;
