//! Egress IP Controller
//!
//! Reconciles `EgressIPClaim` CRDs against a finite pool of egress IP
//! addresses, allocating the requested number of addresses to each claim
//! exactly once and recording the outcome as status conditions.

mod backoff;
mod controller;
mod error;
mod reconciler;
mod watcher;

use crate::error::ControllerError;
use controller::Controller;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting Egress IP Controller");

    // Load configuration from environment variables
    let pool_cidr = env::var("EGRESS_POOL_CIDR").map_err(|_| {
        ControllerError::InvalidConfig(
            "EGRESS_POOL_CIDR environment variable is required".to_string(),
        )
    })?;
    let namespace = env::var("WATCH_NAMESPACE").ok();

    info!("Configuration:");
    info!("  Pool CIDR: {}", pool_cidr);
    info!(
        "  Namespace: {}",
        namespace.as_deref().unwrap_or("all namespaces")
    );

    let controller = Controller::new(&pool_cidr, namespace).await?;

    tokio::select! {
        result = controller.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
