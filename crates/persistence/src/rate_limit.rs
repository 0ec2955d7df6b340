//! Sliding-window counter store
//!
//! Each `(dimension, value)` pair maps to a Redis sorted set whose members
//! are one-per-attempt tokens scored by the attempt timestamp in Unix
//! milliseconds. A count at time `now` is the cardinality after dropping
//! scores at or below `now - window`; the key carries an idle TTL slightly
//! longer than the window so abandoned buckets evict themselves.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bruteguard_core::{AttemptCounts, AttemptKeys, AttemptRecorder, BucketResetter, StorageError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

const KEY_PREFIX: &str = "ratelimit";

/// Extra lifetime on top of the window before an idle key self-evicts.
const IDLE_TTL_SLACK: Duration = Duration::from_secs(1);

/// Redis-backed sliding-window counters for the three attempt dimensions.
pub struct RateLimitStore {
    conn: ConnectionManager,
    window: Duration,
}

impl RateLimitStore {
    pub fn new(conn: ConnectionManager, window: Duration) -> Self {
        Self { conn, window }
    }

    fn ip_key(ip: &str) -> String {
        format!("{KEY_PREFIX}:ip:{ip}")
    }

    fn login_key(login: &str) -> String {
        format!("{KEY_PREFIX}:login:{login}")
    }

    fn password_key(password: &str) -> String {
        format!("{KEY_PREFIX}:password:{password}")
    }

    fn idle_ttl_secs(&self) -> i64 {
        (self.window + IDLE_TTL_SLACK).as_secs() as i64
    }

    async fn reset(&self, key: String) -> Result<bool, StorageError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(key).await.map_err(StorageError::unavailable)?;
        Ok(deleted > 0)
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Scores at or below the cutoff have left the window.
fn window_cutoff(now_ms: i64, window: Duration) -> i64 {
    now_ms - window.as_millis() as i64
}

#[async_trait]
impl AttemptRecorder for RateLimitStore {
    /// All twelve commands go out as a single pipelined round-trip: per key,
    /// expired members are dropped, the remaining cardinality is read, the
    /// new attempt is inserted and the idle TTL is refreshed. The reported
    /// counts therefore exclude the attempt being recorded.
    async fn count_and_record(&self, keys: &AttemptKeys) -> Result<AttemptCounts, StorageError> {
        let now = now_millis();
        let cutoff = window_cutoff(now, self.window);
        // One fresh token per attempt; timestamps alone collide under
        // concurrency and ZADD would silently deduplicate them.
        let member = Uuid::new_v4().to_string();

        let ip_key = Self::ip_key(&keys.ip);
        let login_key = Self::login_key(&keys.login);
        let password_key = Self::password_key(&keys.password);
        let bucket_keys = [&ip_key, &login_key, &password_key];

        let mut pipe = redis::pipe();
        for key in bucket_keys {
            pipe.zrembyscore(key, 0, cutoff).ignore();
        }
        for key in bucket_keys {
            pipe.zcard(key);
        }
        for key in bucket_keys {
            pipe.zadd(key, &member, now).ignore();
        }
        for key in bucket_keys {
            pipe.expire(key, self.idle_ttl_secs()).ignore();
        }

        let mut conn = self.conn.clone();
        let (ip, login, password): (i64, i64, i64) = pipe
            .query_async(&mut conn)
            .await
            .map_err(StorageError::unavailable)?;

        Ok(AttemptCounts { ip, login, password })
    }
}

#[async_trait]
impl BucketResetter for RateLimitStore {
    async fn reset_by_ip(&self, ip: &str) -> Result<bool, StorageError> {
        self.reset(Self::ip_key(ip)).await
    }

    async fn reset_by_login(&self, login: &str) -> Result<bool, StorageError> {
        self.reset(Self::login_key(login)).await
    }

    async fn reset_by_password(&self, password: &str) -> Result<bool, StorageError> {
        self.reset(Self::password_key(password)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_keys_are_namespaced_per_dimension() {
        assert_eq!(RateLimitStore::ip_key("10.0.0.1"), "ratelimit:ip:10.0.0.1");
        assert_eq!(RateLimitStore::login_key("alice"), "ratelimit:login:alice");
        assert_eq!(
            RateLimitStore::password_key("hunter2"),
            "ratelimit:password:hunter2"
        );
    }

    #[test]
    fn distinct_values_never_share_a_key() {
        // The same literal in different dimensions must stay isolated.
        assert_ne!(
            RateLimitStore::ip_key("alice"),
            RateLimitStore::login_key("alice")
        );
        assert_ne!(
            RateLimitStore::login_key("alice"),
            RateLimitStore::password_key("alice")
        );
    }

    #[test]
    fn cutoff_trails_now_by_exactly_one_window() {
        let window = Duration::from_secs(60);
        assert_eq!(window_cutoff(1_000_000, window), 1_000_000 - 60_000);

        // An event recorded at the cutoff itself is discarded, one
        // millisecond later it still counts.
        let cutoff = window_cutoff(2_000_000, window);
        assert!(cutoff < 2_000_000 - 59_999);
        assert_eq!(cutoff + 60_000, 2_000_000);
    }
}
