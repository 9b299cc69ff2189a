mod coordinator;
mod worker;

pub use coordinator::Coordinator;

/// Configuration of the pipeline coordinator.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of concurrently processing workers.
    pub semaphore_width: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            semaphore_width: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to upload file")]
    Upload(#[source] cloud::Error),
    #[error("failed to publish task to queue")]
    Publish(#[source] queue::Error),
    #[error("task registry error")]
    Registry(#[from] registry::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
