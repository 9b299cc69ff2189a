use super::{scan_pattern, task_key, Error, Result, TaskRegistry};
use models::Task;
use redis::AsyncCommands;

/// Configuration of the Redis-backed registry.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub address: String,
    /// Time-to-live of every pushed record.
    #[serde(with = "humantime_serde")]
    pub ttl: std::time::Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: "redis://localhost:6379".to_string(),
            ttl: std::time::Duration::from_secs(3600),
        }
    }
}

/// RedisRegistry stores task records as JSON values under
/// `inlet:<bucket>:<id>` keys with a per-entry TTL.
#[derive(Clone)]
pub struct RedisRegistry {
    manager: redis::aio::ConnectionManager,
    ttl_seconds: u64,
}

impl RedisRegistry {
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.address.as_str())?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            ttl_seconds: config.ttl.as_secs().max(1),
        })
    }
}

#[async_trait::async_trait]
impl TaskRegistry for RedisRegistry {
    async fn push(&self, task: &Task) -> Result<()> {
        let key = task_key(&task.bucket, &task.id.to_string());
        let value = serde_json::to_vec(task).map_err(Error::Encode)?;

        let mut conn = self.manager.clone();
        () = conn.set_ex(key, value, self.ttl_seconds).await?;
        Ok(())
    }

    async fn get(&self, bucket: &str, id: &str) -> Result<Task> {
        let key = task_key(bucket, id);

        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;

        let Some(value) = value else {
            return Err(Error::NotFound {
                bucket: bucket.to_string(),
                id: id.to_string(),
            });
        };

        serde_json::from_slice(&value).map_err(Error::Decode)
    }

    async fn get_all(&self, bucket: &str) -> Result<Vec<Task>> {
        let mut conn = self.manager.clone();

        let keys: Vec<String> = {
            let mut iter = conn.scan_match(scan_pattern(bucket)).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut tasks = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<Vec<u8>> = match conn.get(&key).await {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "failed to read task record, skipping");
                    continue;
                }
            };

            // The entry may have expired between SCAN and GET.
            let Some(value) = value else { continue };

            match serde_json::from_slice(&value) {
                Ok(task) => tasks.push(task),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "corrupt task record, skipping");
                }
            }
        }

        Ok(tasks)
    }
}
