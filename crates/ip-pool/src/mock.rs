//! Mock IpPool for unit testing
//!
//! This module provides a scriptable implementation of `IpPoolTrait` so
//! reconciler tests can run without building a real CIDR-backed pool.
//!
//! The mock hands out sequential link-local addresses up to a configurable
//! capacity and records every `allocate` call (in key order) for assertions.
//! Capacity can be adjusted mid-test to script exhaustion and recovery.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use crate::error::IpPoolError;
use crate::pool_trait::IpPoolTrait;

/// Mock IP pool for testing
///
/// Clones share state, so a test can keep one handle for assertions while
/// the reconciler under test owns another.
#[derive(Debug, Clone)]
pub struct MockIpPool {
    cidr: String,
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    capacity: usize,
    handed_out: u32,
    allocations: HashMap<String, Vec<String>>,
    allocate_calls: Vec<String>,
}

impl MockIpPool {
    /// Sequential addresses start one above this base.
    const BASE: Ipv4Addr = Ipv4Addr::new(169, 254, 1, 0);

    /// Create a mock pool with room for `capacity` allocations
    pub fn new(capacity: usize) -> Self {
        Self {
            cidr: "169.254.1.0/24".to_string(),
            state: Arc::new(Mutex::new(MockState {
                capacity,
                handed_out: 0,
                allocations: HashMap::new(),
                allocate_calls: Vec::new(),
            })),
        }
    }

    /// Adjust the total capacity mid-test (for exhaustion/recovery scripts)
    pub fn set_capacity(&self, capacity: usize) {
        self.state.lock().unwrap().capacity = capacity;
    }

    /// Keys passed to `allocate`, in call order
    pub fn allocate_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().allocate_calls.clone()
    }
}

impl IpPoolTrait for MockIpPool {
    fn cidr(&self) -> &str {
        &self.cidr
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().capacity
    }

    fn available(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.capacity.saturating_sub(state.handed_out as usize)
    }

    fn allocate(&self, key: &str) -> Result<String, IpPoolError> {
        let mut state = self.state.lock().unwrap();
        state.allocate_calls.push(key.to_string());

        if key.is_empty() {
            return Err(IpPoolError::InvalidKey);
        }
        if state.handed_out as usize >= state.capacity {
            return Err(IpPoolError::Exhausted {
                cidr: self.cidr.clone(),
            });
        }

        state.handed_out += 1;
        let ip = Ipv4Addr::from(u32::from(Self::BASE) + state.handed_out).to_string();
        state
            .allocations
            .entry(key.to_string())
            .or_default()
            .push(ip.clone());

        Ok(ip)
    }

    fn release(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .allocations
            .remove(key)
            .unwrap_or_default()
    }

    fn allocated_for(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .allocations
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}
