//! CIDR-backed egress IP pool
//!
//! The pool hands out the usable host addresses of a configured IPv4 CIDR,
//! lowest first. All bookkeeping lives behind a single mutex so `allocate`
//! calls from concurrently reconciled claims are safe.

use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ipnet::Ipv4Net;
use tracing::debug;

use crate::error::IpPoolError;
use crate::pool_trait::IpPoolTrait;

/// Upper bound on allocatable addresses per pool. A CIDR wider than /15
/// is almost certainly a configuration mistake and would make the
/// available-address set needlessly large.
const MAX_POOL_SIZE: usize = 250_000;

/// In-memory allocator over the usable host range of an IPv4 CIDR.
#[derive(Debug)]
pub struct IpPool {
    cidr: String,
    size: usize,
    state: Mutex<PoolState>,
}

#[derive(Debug)]
struct PoolState {
    available: BTreeSet<Ipv4Addr>,
    allocations: HashMap<String, Vec<Ipv4Addr>>,
}

impl IpPool {
    /// Builds a pool over the usable host range of `cidr`.
    ///
    /// The network and broadcast addresses are excluded for prefixes
    /// shorter than /31. Fails on malformed or IPv6 CIDRs and on pools
    /// larger than the sanity cap.
    pub fn new(cidr: &str) -> Result<Self, IpPoolError> {
        let net = cidr
            .parse::<Ipv4Net>()
            .map_err(|e| IpPoolError::InvalidCidr(format!("{cidr}: {e}")))?
            .trunc();

        let host_bits = u32::from(32 - net.prefix_len());
        let host_count = if net.prefix_len() >= 31 {
            1u64 << host_bits
        } else {
            (1u64 << host_bits) - 2
        };

        if host_count > MAX_POOL_SIZE as u64 {
            return Err(IpPoolError::PoolTooLarge {
                cidr: net.to_string(),
                size: host_count as usize,
                max: MAX_POOL_SIZE,
            });
        }

        let available: BTreeSet<Ipv4Addr> = net.hosts().collect();
        let size = available.len();

        debug!("Built egress IP pool over {} ({} addresses)", net, size);

        Ok(Self {
            cidr: net.to_string(),
            size,
            state: Mutex::new(PoolState {
                available,
                allocations: HashMap::new(),
            }),
        })
    }

    /// A poisoned lock only means another allocation panicked mid-update;
    /// the bookkeeping itself is still consistent, so recover the guard.
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IpPoolTrait for IpPool {
    fn cidr(&self) -> &str {
        &self.cidr
    }

    fn size(&self) -> usize {
        self.size
    }

    fn available(&self) -> usize {
        self.state().available.len()
    }

    fn allocate(&self, key: &str) -> Result<String, IpPoolError> {
        if key.is_empty() {
            return Err(IpPoolError::InvalidKey);
        }

        let mut state = self.state();

        let ip = state.available.pop_first().ok_or_else(|| IpPoolError::Exhausted {
            cidr: self.cidr.clone(),
        })?;
        state.allocations.entry(key.to_string()).or_default().push(ip);

        debug!("Allocated {} to {} ({} left)", ip, key, state.available.len());

        Ok(ip.to_string())
    }

    fn release(&self, key: &str) -> Vec<String> {
        let mut state = self.state();

        let Some(ips) = state.allocations.remove(key) else {
            return Vec::new();
        };

        let released: Vec<String> = ips.iter().map(ToString::to_string).collect();
        state.available.extend(ips);

        debug!("Released {} address(es) held by {}", released.len(), key);

        released
    }

    fn allocated_for(&self, key: &str) -> Vec<String> {
        self.state()
            .allocations
            .get(key)
            .map(|ips| ips.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }
}
