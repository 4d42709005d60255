use crate::error::ConsoleError;
use crate::key_value::{KeyDetail, KeyWriteRequest};
use crate::listing::RawListing;
use crate::stats::ServerStats;
use async_trait::async_trait;

/// Remote store the console administers.
///
/// Implementations talk to the admin HTTP service; tests use an in-memory
/// fake. Every call is a single request with no retries.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Human-readable name for logs, e.g. the base URL.
    fn describe(&self) -> String;

    async fn stats(&self) -> Result<ServerStats, ConsoleError>;

    async fn test_connection(&self) -> Result<bool, ConsoleError>;

    /// Key names matching a glob pattern.
    async fn search(&self, pattern: &str) -> Result<Vec<String>, ConsoleError>;

    /// Current key listing. `None` means the server has nothing to list
    /// (for example, no store connection).
    async fn list_keys(&self) -> Result<Option<RawListing>, ConsoleError>;

    /// Full value of one key. A missing key is [`ConsoleError::NotFound`].
    async fn key_detail(&self, key: &str) -> Result<KeyDetail, ConsoleError>;

    async fn delete_key(&self, key: &str) -> Result<(), ConsoleError>;

    /// Overwrite a key with a new value and TTL.
    async fn set_key(&self, request: &KeyWriteRequest) -> Result<(), ConsoleError>;

    /// Remove every key in the current database.
    async fn flush(&self) -> Result<(), ConsoleError>;
}
