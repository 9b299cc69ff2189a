use super::{Error, Result, TaskRegistry};
use models::Task;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// MemoryRegistry is the in-process registry used by tests and local runs.
/// Entries never expire.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: Mutex<HashMap<(String, String), Task>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TaskRegistry for MemoryRegistry {
    async fn push(&self, task: &Task) -> Result<()> {
        let key = (task.bucket.clone(), task.id.to_string());
        self.entries.lock().await.insert(key, task.clone());
        Ok(())
    }

    async fn get(&self, bucket: &str, id: &str) -> Result<Task> {
        let key = (bucket.to_string(), id.to_string());
        self.entries
            .lock()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                id: id.to_string(),
            })
    }

    async fn get_all(&self, bucket: &str) -> Result<Vec<Task>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|((b, _), _)| b == bucket)
            .map(|(_, task)| task.clone())
            .collect())
    }
}
