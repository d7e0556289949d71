//! IP pool errors

use thiserror::Error;

/// Errors that can occur when building or allocating from an IP pool
#[derive(Debug, Error)]
pub enum IpPoolError {
    /// The configured CIDR could not be parsed as an IPv4 network
    #[error("Invalid IPv4 CIDR: {0}")]
    InvalidCidr(String),

    /// The configured CIDR spans more addresses than the pool supports
    #[error("Pool {cidr} spans {size} addresses, exceeding the maximum of {max}")]
    PoolTooLarge {
        /// The offending CIDR
        cidr: String,
        /// Number of allocatable addresses the CIDR would produce
        size: usize,
        /// Upper bound on pool size
        max: usize,
    },

    /// No addresses left to allocate
    #[error("Pool {cidr} is exhausted")]
    Exhausted {
        /// CIDR of the exhausted pool
        cidr: String,
    },

    /// Allocation requested with an unusable owner key
    #[error("Allocation key must not be empty")]
    InvalidKey,
}
