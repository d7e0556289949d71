//! Reconciliation logic for EgressIPClaim resources.
//!
//! This module maps one observed lifecycle event onto pool allocations and
//! an updated status. The transform never fails: allocation problems are
//! absorbed into status conditions and a requeue signal that the watcher
//! turns into a retry with backoff.

use crds::{
    CONDITION_TYPE_ALLOCATED, Condition, ConditionStatus, EgressIPClaim, EgressIPClaimStatus,
    set_condition,
};
use ip_pool::IpPoolTrait;
use tracing::{debug, error, info};

/// Condition reason recorded when the pool cannot satisfy an allocation.
pub const REASON_ALLOCATION_FAILED: &str = "IpPoolAllocationFailed";

/// Condition reason recorded when allocation succeeds.
pub const REASON_SUCCESS: &str = "Success";

/// Lifecycle operation the watcher observed for a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Stable bookkeeping key for a claim.
///
/// The same key feeds the pool's per-owner accounting and the watcher's
/// caches, so the two can never diverge for one claim.
pub fn resource_key(claim: &EgressIPClaim) -> String {
    format!(
        "{}/{}",
        claim.metadata.namespace.as_deref().unwrap_or("default"),
        claim.metadata.name.as_deref().unwrap_or_default()
    )
}

/// Reconciles EgressIPClaim resources against the egress IP pool.
pub struct Reconciler {
    pool: Box<dyn IpPoolTrait>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(pool: impl IpPoolTrait + 'static) -> Self {
        Self {
            pool: Box::new(pool),
        }
    }

    /// Processes one observed lifecycle event for a claim.
    ///
    /// Returns the claim when its status changed and should be persisted,
    /// plus a flag telling the watcher to retry this key later with backoff.
    /// A requeue is returned without the claim: the pass was inconclusive
    /// and writing an intermediate status would churn the resource under
    /// transient pool pressure.
    pub fn process(
        &self,
        mut claim: EgressIPClaim,
        num_requeues: u32,
        operation: Operation,
    ) -> (Option<EgressIPClaim>, bool) {
        let key = resource_key(&claim);
        info!(
            "Processing {:?} of EgressIPClaim {} (requeues: {})",
            operation, key, num_requeues
        );

        match operation {
            Operation::Create => {
                let desired_count = claim.spec.desired_count;
                let prev_status = claim.status.clone().unwrap_or_default();
                let status = claim.status.get_or_insert_with(EgressIPClaimStatus::default);

                if allocate_ips(&key, desired_count, self.pool.as_ref(), status) {
                    return (None, true);
                }

                if prev_status == *status {
                    return (None, false);
                }

                debug!("EgressIPClaim {} status changed: {:?}", key, status);

                (Some(claim), false)
            }
            Operation::Update => {
                // TODO handle update (react to desiredCount changes)
                (None, false)
            }
            Operation::Delete => {
                // TODO handle delete (release the claim's addresses to the pool)
                (None, false)
            }
        }
    }
}

/// Allocates the desired number of egress IPs for `key`, mutating `status`
/// in place.
///
/// A claim whose allocation already matches the desired count is left
/// untouched without contacting the pool, so reprocessing (including after
/// a controller restart) is a no-op. Allocation is all-or-nothing per pass:
/// any pool failure records an `Allocated=False` condition and returns true
/// so the caller retries once capacity may have freed up.
pub(crate) fn allocate_ips(
    key: &str,
    desired_count: Option<u32>,
    pool: &dyn IpPoolTrait,
    status: &mut EgressIPClaimStatus,
) -> bool {
    let desired = desired_count.unwrap_or(1) as usize;

    if desired == status.allocated_addresses.len() {
        return false;
    }

    info!("Allocating {} egress IP(s) for {}", desired, key);

    // Caller-authored desired must not size an allocation up front; the
    // list regrows per successful pool call.
    status.allocated_addresses = Vec::new();

    for _ in 0..desired {
        let ip = match pool.allocate(key) {
            Ok(ip) => ip,
            Err(e) => {
                error!("Error allocating egress IPs for {}: {}", key, e);
                set_condition(
                    &mut status.conditions,
                    Condition {
                        type_: CONDITION_TYPE_ALLOCATED.to_string(),
                        status: ConditionStatus::False,
                        reason: Some(REASON_ALLOCATION_FAILED.to_string()),
                        message: Some(format!(
                            "Error allocating {desired} egress IP(s) from the pool: {e}"
                        )),
                        last_transition_time: None,
                    },
                );

                return true;
            }
        };

        status.allocated_addresses.push(ip);
    }

    set_condition(
        &mut status.conditions,
        Condition {
            type_: CONDITION_TYPE_ALLOCATED.to_string(),
            status: ConditionStatus::True,
            reason: Some(REASON_SUCCESS.to_string()),
            message: Some(format!("Allocated {desired} egress IP(s)")),
            last_transition_time: None,
        },
    );

    false
}
