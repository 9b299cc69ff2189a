use models::Task;

mod memory;
mod redis_store;

pub use memory::MemoryRegistry;
pub use redis_store::{RedisConfig, RedisRegistry};

/// Application prefix of every registry key.
pub const APP_PREFIX: &str = "inlet";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task {bucket}/{id} is not found")]
    NotFound { bucket: String, id: String },
    #[error("registry storage error")]
    Storage(#[from] redis::RedisError),
    #[error("failed to encode task record")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode task record")]
    Decode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// TaskRegistry is a TTL'd projection of task state keyed by (bucket, id).
/// It is last-writer-wins: callers must accept staleness of about one hop.
#[async_trait::async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Upsert `task`, resetting its TTL.
    async fn push(&self, task: &Task) -> Result<()>;
    /// Point lookup. `Error::NotFound` is distinct from a storage error.
    async fn get(&self, bucket: &str, id: &str) -> Result<Task>;
    /// Enumerate all live tasks of `bucket`, in unspecified order.
    /// Entries which vanish or fail to decode mid-scan are skipped.
    async fn get_all(&self, bucket: &str) -> Result<Vec<Task>>;
}

/// Registry key of a (bucket, id) pair.
pub fn task_key(bucket: &str, id: &str) -> String {
    format!("{APP_PREFIX}:{bucket}:{id}")
}

/// Wildcard pattern matching every key of `bucket`.
pub fn scan_pattern(bucket: &str) -> String {
    format!("{APP_PREFIX}:{bucket}:*")
}
