//! Kubernetes resource watcher.
//!
//! This module handles watching EgressIPClaim resources for changes,
//! classifying each event into a lifecycle operation, invoking the
//! reconciler, persisting status updates, and rescheduling requeued
//! claims with backoff.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::reconciler::{Operation, Reconciler, resource_key};
use crds::EgressIPClaim;
use futures::TryStreamExt;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use kube_runtime::watcher;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const MIN_BACKOFF_SECONDS: u64 = 1;
const MAX_BACKOFF_SECONDS: u64 = 60;
const REQUEUE_CHANNEL_CAPACITY: usize = 64;

/// Per-key retry bookkeeping for requeued claims.
struct RequeueState {
    attempts: u32,
    backoff: FibonacciBackoff,
}

impl RequeueState {
    fn new() -> Self {
        Self {
            attempts: 0,
            backoff: FibonacciBackoff::new(MIN_BACKOFF_SECONDS, MAX_BACKOFF_SECONDS),
        }
    }

    fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }
}

/// Classifies an observed claim against the cache of known claims.
///
/// Returns `None` when the cached copy has an identical spec: the event is
/// an echo of a status-only change (typically our own patch) and needs no
/// reconciliation.
fn classify(known: &HashMap<String, EgressIPClaim>, claim: &EgressIPClaim) -> Option<Operation> {
    match known.get(&resource_key(claim)) {
        None => Some(Operation::Create),
        Some(cached) if cached.spec == claim.spec => None,
        Some(_) => Some(Operation::Update),
    }
}

/// Watches EgressIPClaim resources for changes.
pub struct Watcher {
    reconciler: Reconciler,
    client: Client,
    namespace: Option<String>,
}

impl Watcher {
    /// Creates a new watcher instance.
    ///
    /// With a namespace the watcher is scoped to it; without one it watches
    /// claims across all namespaces.
    pub fn new(reconciler: Reconciler, client: Client, namespace: Option<String>) -> Self {
        Self {
            reconciler,
            client,
            namespace,
        }
    }

    fn claim_api(&self) -> Api<EgressIPClaim> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    /// Starts watching EgressIPClaim resources.
    ///
    /// Runs until the watch stream fails or ends. Requeued claims re-enter
    /// the loop through an internal channel after their backoff delay.
    pub async fn watch_claims(&self) -> Result<(), ControllerError> {
        info!("Starting EgressIPClaim watcher");

        let mut stream = Box::pin(watcher(self.claim_api(), watcher::Config::default()));

        let (requeue_tx, mut requeue_rx) = mpsc::channel::<String>(REQUEUE_CHANNEL_CAPACITY);

        // Newest observed copy of every live claim, keyed by resource_key.
        let mut known: HashMap<String, EgressIPClaim> = HashMap::new();
        let mut requeues: HashMap<String, RequeueState> = HashMap::new();

        loop {
            tokio::select! {
                event = stream.try_next() => {
                    let event = event
                        .map_err(|e| ControllerError::Watch(format!("Watcher stream error: {}", e)))?;
                    let Some(event) = event else {
                        warn!("EgressIPClaim watch stream ended");
                        return Ok(());
                    };

                    match event {
                        watcher::Event::Apply(claim) | watcher::Event::InitApply(claim) => {
                            let key = resource_key(&claim);
                            match classify(&known, &claim) {
                                Some(operation) => {
                                    known.insert(key, claim.clone());
                                    self.dispatch(claim, operation, &mut requeues, &requeue_tx)
                                        .await;
                                }
                                None => {
                                    debug!("EgressIPClaim {} spec unchanged, skipping", key);
                                    known.insert(key, claim);
                                }
                            }
                        }
                        watcher::Event::Delete(claim) => {
                            let key = resource_key(&claim);
                            info!("EgressIPClaim {} deleted", key);
                            known.remove(&key);
                            requeues.remove(&key);
                            self.dispatch(claim, Operation::Delete, &mut requeues, &requeue_tx)
                                .await;
                        }
                        watcher::Event::Init => {
                            info!("EgressIPClaim watcher initialized");
                        }
                        watcher::Event::InitDone => {
                            info!("EgressIPClaim watcher initialization complete");
                        }
                    }
                }
                Some(key) = requeue_rx.recv() => {
                    match known.get(&key) {
                        Some(claim) => {
                            let claim = claim.clone();
                            debug!("Retrying EgressIPClaim {}", key);
                            // Requeues only ever originate from unsatisfied
                            // creates, so they re-dispatch as Create.
                            self.dispatch(claim, Operation::Create, &mut requeues, &requeue_tx)
                                .await;
                        }
                        None => {
                            debug!("Dropping requeue for removed EgressIPClaim {}", key);
                            requeues.remove(&key);
                        }
                    }
                }
            }
        }
    }

    /// Runs one claim through the reconciler and acts on the outcome.
    async fn dispatch(
        &self,
        claim: EgressIPClaim,
        operation: Operation,
        requeues: &mut HashMap<String, RequeueState>,
        requeue_tx: &mpsc::Sender<String>,
    ) {
        let key = resource_key(&claim);
        let attempts = requeues.get(&key).map_or(0, |state| state.attempts);

        let (updated, mut requeue) = self.reconciler.process(claim, attempts, operation);

        if let Some(updated) = updated {
            if let Err(e) = self.patch_status(&updated).await {
                error!("Failed to update EgressIPClaim {} status: {}", key, e);
                requeue = true;
            }
        }

        if requeue {
            self.schedule_requeue(key, requeues, requeue_tx);
        } else if let Some(state) = requeues.get_mut(&key) {
            state.reset();
        }
    }

    /// Persists a claim's status with a status-only merge patch.
    async fn patch_status(&self, claim: &EgressIPClaim) -> Result<(), ControllerError> {
        let name = claim.metadata.name.as_deref().ok_or_else(|| {
            ControllerError::InvalidConfig("EgressIPClaim missing name".to_string())
        })?;
        let namespace = claim.metadata.namespace.as_deref().unwrap_or("default");

        let api: Api<EgressIPClaim> = Api::namespaced(self.client.clone(), namespace);

        let status_patch = json!({
            "status": claim.status
        });

        let pp = PatchParams::default();
        api.patch_status(name, &pp, &Patch::Merge(&status_patch))
            .await?;

        info!("Updated EgressIPClaim {}/{} status", namespace, name);

        Ok(())
    }

    /// Schedules a retry for `key` after the next backoff delay.
    fn schedule_requeue(
        &self,
        key: String,
        requeues: &mut HashMap<String, RequeueState>,
        requeue_tx: &mpsc::Sender<String>,
    ) {
        let state = requeues.entry(key.clone()).or_insert_with(RequeueState::new);
        state.attempts += 1;
        let delay = state.backoff.next_backoff();

        warn!(
            "Requeueing EgressIPClaim {} in {}s (attempt {})",
            key,
            delay.as_secs(),
            state.attempts
        );

        let tx = requeue_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(key).await.is_err() {
                debug!("Requeue channel closed, dropping retry");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{EgressIPClaimSpec, EgressIPClaimStatus};

    fn claim(name: &str, desired_count: Option<u32>) -> EgressIPClaim {
        let mut claim = EgressIPClaim::new(name, EgressIPClaimSpec { desired_count });
        claim.metadata.namespace = Some("default".to_string());
        claim
    }

    #[test]
    fn test_classify_unknown_claim_as_create() {
        let known = HashMap::new();

        assert_eq!(
            classify(&known, &claim("a", None)),
            Some(Operation::Create)
        );
    }

    #[test]
    fn test_classify_status_only_echo_as_noise() {
        let mut known = HashMap::new();
        let observed = claim("a", Some(2));
        known.insert(resource_key(&observed), observed.clone());

        let mut echo = observed;
        echo.status = Some(EgressIPClaimStatus {
            allocated_addresses: vec!["169.254.1.1".to_string(), "169.254.1.2".to_string()],
            conditions: Vec::new(),
        });

        assert_eq!(classify(&known, &echo), None);
    }

    #[test]
    fn test_classify_changed_spec_as_update() {
        let mut known = HashMap::new();
        let observed = claim("a", Some(2));
        known.insert(resource_key(&observed), observed);

        assert_eq!(
            classify(&known, &claim("a", Some(5))),
            Some(Operation::Update)
        );
    }

    #[test]
    fn test_classify_keys_claims_by_namespace_and_name() {
        let mut known = HashMap::new();
        let observed = claim("a", Some(2));
        known.insert(resource_key(&observed), observed);

        let mut other_namespace = claim("a", Some(2));
        other_namespace.metadata.namespace = Some("staging".to_string());

        assert_eq!(
            classify(&known, &other_namespace),
            Some(Operation::Create)
        );
    }
}
