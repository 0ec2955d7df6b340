//! Storage layer: Postgres subnet repository, Redis sliding-window counters
//! and the Redis-backed subnet cache, composed behind the core capability
//! traits.

pub mod database;
pub mod rate_limit;
pub mod redis_conn;
pub mod subnet;

pub use database::Database;
pub use rate_limit::RateLimitStore;
pub use redis_conn::RedisHandle;
pub use subnet::{SubnetCache, SubnetProvider, SubnetRepository};
