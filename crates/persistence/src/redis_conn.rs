//! Redis connection management

use bruteguard_core::StorageError;
use redis::aio::ConnectionManager;
use tracing::info;

/// Shared handle to the counter/cache store.
///
/// The underlying [`ConnectionManager`] multiplexes one connection, is cheap
/// to clone and reconnects on its own after transient failures.
pub struct RedisHandle {
    manager: ConnectionManager,
}

impl RedisHandle {
    /// Open a client for the given URL and verify the server responds.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url).map_err(StorageError::unavailable)?;
        let mut manager = client
            .get_connection_manager()
            .await
            .map_err(StorageError::unavailable)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(StorageError::unavailable)?;

        info!("connected to redis");

        Ok(Self { manager })
    }

    /// Clone out a connection handle.
    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}
