//! Main controller implementation.
//!
//! This module contains the `Controller` struct that orchestrates
//! reconciliation and resource watching for the Egress IP Controller.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use ip_pool::{IpPool, IpPoolTrait};
use kube::Client;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for egress IP management.
pub struct Controller {
    claim_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    ///
    /// Builds the Kubernetes client, constructs the egress IP pool over the
    /// configured CIDR, and starts the claim watcher in a background task.
    pub async fn new(pool_cidr: &str, namespace: Option<String>) -> Result<Self, ControllerError> {
        info!("Initializing Egress IP Controller");

        let kube_client = Client::try_default().await?;

        let pool = IpPool::new(pool_cidr)?;
        info!(
            "Egress IP pool {} holds {} allocatable address(es)",
            pool.cidr(),
            pool.size()
        );

        let reconciler = Reconciler::new(pool);
        let watcher = Watcher::new(reconciler, kube_client, namespace);

        let claim_watcher = tokio::spawn(async move { watcher.watch_claims().await });

        Ok(Self { claim_watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Egress IP Controller running");

        self.claim_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("EgressIPClaim watcher panicked: {}", e)))?
            .map_err(|e| ControllerError::Watch(format!("EgressIPClaim watcher error: {}", e)))?;

        Ok(())
    }
}
