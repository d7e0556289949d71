//! In-Memory Egress IP Pool
//!
//! A concurrency-safe allocator of egress IPs over a configured IPv4 CIDR.
//! Addresses are handed out lowest-first and tracked per owner key, so a
//! claim's allocations can be inspected and released as a unit.
//!
//! # Example
//!
//! ```
//! use ip_pool::{IpPool, IpPoolTrait};
//!
//! # fn example() -> Result<(), ip_pool::IpPoolError> {
//! let pool = IpPool::new("10.201.0.0/24")?;
//!
//! // Lowest available address first
//! let ip = pool.allocate("default/my-claim")?;
//! assert_eq!(ip, "10.201.0.1");
//!
//! // Bookkeeping is per owner key
//! assert_eq!(pool.allocated_for("default/my-claim"), vec![ip]);
//! assert_eq!(pool.available(), pool.size() - 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod error;
pub mod pool;
#[path = "trait.rs"]
pub mod pool_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use error::IpPoolError;
pub use pool::IpPool;
pub use pool_trait::IpPoolTrait;
#[cfg(feature = "test-util")]
pub use mock::MockIpPool;
