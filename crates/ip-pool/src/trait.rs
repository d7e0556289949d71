//! IpPool trait for mocking
//!
//! This trait abstracts the IP pool to enable mocking in unit tests.
//! The concrete IpPool implements this trait, and tests can use mock
//! implementations. All methods are synchronous: the pool is in-memory
//! bookkeeping, never I/O.

use crate::error::IpPoolError;

/// Trait for IP pool operations
///
/// Implementations must be safe for concurrent `allocate` calls from
/// different owner keys; calls for the same key are expected to be
/// serialized by the caller but must not corrupt pool state if they
/// are not.
pub trait IpPoolTrait: Send + Sync {
    /// CIDR the pool allocates from
    fn cidr(&self) -> &str;

    /// Total number of allocatable addresses in the pool
    fn size(&self) -> usize;

    /// Number of addresses currently available for allocation
    fn available(&self) -> usize;

    /// Allocates one address owned by `key`
    ///
    /// Repeated calls with the same key accumulate addresses under that
    /// key; they never replace earlier allocations.
    fn allocate(&self, key: &str) -> Result<String, IpPoolError>;

    /// Returns every address owned by `key` to the pool
    ///
    /// Returns the released addresses; an unknown key releases nothing.
    fn release(&self, key: &str) -> Vec<String>;

    /// Addresses currently owned by `key`, in allocation order
    fn allocated_for(&self, key: &str) -> Vec<String>;
}
