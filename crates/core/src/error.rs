//! Error vocabulary shared between the decision core and its stores.

use thiserror::Error;

/// Boxed source error for wrapping driver-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the storage capabilities.
///
/// `CacheMiss` and `UnexpectedDataFormat` are internal to the cache layer:
/// callers downgrade them to a miss and fall back to the authoritative
/// store. Everything else propagates.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The cache has no entry for the requested key.
    #[error("cache miss")]
    CacheMiss,

    /// A cache entry exists but could not be decoded.
    #[error("unexpected data format in cache key {key:?}")]
    UnexpectedDataFormat {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The supplied CIDR does not parse as a network.
    #[error("invalid CIDR: {0:?}")]
    InvalidCidr(String),

    /// The requested entry does not exist.
    #[error("entry not found")]
    NotFound,

    /// The backing store could not be reached or failed mid-operation.
    #[error("storage unavailable")]
    Unavailable(#[source] BoxError),
}

impl StorageError {
    /// Wrap a transport or driver failure.
    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        StorageError::Unavailable(err.into())
    }

    pub fn is_cache_miss(&self) -> bool {
        matches!(self, StorageError::CacheMiss)
    }
}

/// Errors returned by the access and management services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The supplied CIDR does not parse as a network.
    #[error("invalid CIDR: {0:?}")]
    InvalidCidr(String),

    /// Remove targeted a subnet that is not on the list.
    #[error("subnet not found")]
    SubnetNotFound,

    /// A storage failure that prevented a decision or edit.
    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidCidr(cidr) => ServiceError::InvalidCidr(cidr),
            StorageError::NotFound => ServiceError::SubnetNotFound,
            other => ServiceError::Storage(other),
        }
    }
}
