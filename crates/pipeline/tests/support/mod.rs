use cloud::{MemoryStore, ObjectStore};
use indexer::{DocumentIndex, MemoryIndex};
use models::{Task, TaskStatus};
use pipeline::{Coordinator, PipelineConfig};
use queue::{MemoryQueue, TaskQueue};
use recognizer::{Recognize, ScriptedRecognizer};
use registry::{MemoryRegistry, TaskRegistry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const TEST_BUCKET: &str = "watchtower-test-bucket";

/// TestEnv wires a Coordinator over in-memory implementations of every
/// capability, with a running listener.
pub struct TestEnv {
    pub coordinator: Arc<Coordinator>,
    pub queue: Arc<MemoryQueue>,
    pub objects: Arc<MemoryStore>,
    pub index: Arc<MemoryIndex>,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub shutdown: CancellationToken,
    pub listener: tokio::task::JoinHandle<()>,
}

pub async fn start(recognizer: ScriptedRecognizer) -> TestEnv {
    start_with_width(recognizer, PipelineConfig::default().semaphore_width).await
}

pub async fn start_with_width(recognizer: ScriptedRecognizer, width: usize) -> TestEnv {
    let registry = Arc::new(MemoryRegistry::new());
    let (queue, deliveries) = MemoryQueue::new(64);
    let objects = Arc::new(MemoryStore::new().with_bucket(TEST_BUCKET).await);
    let index = Arc::new(MemoryIndex::new());
    let recognizer = Arc::new(recognizer);

    let coordinator = Coordinator::new(
        &PipelineConfig {
            semaphore_width: width,
        },
        registry.clone() as Arc<dyn TaskRegistry>,
        queue.clone() as Arc<dyn TaskQueue>,
        objects.clone() as Arc<dyn ObjectStore>,
        index.clone() as Arc<dyn DocumentIndex>,
        recognizer.clone() as Arc<dyn Recognize>,
    );

    let shutdown = CancellationToken::new();
    let listener = coordinator.launch_listener(deliveries, shutdown.clone());

    TestEnv {
        coordinator,
        queue,
        objects,
        index,
        recognizer,
        shutdown,
        listener,
    }
}

impl TestEnv {
    /// Poll the registry until the task satisfies `until`, or panic after
    /// `deadline`.
    pub async fn wait_for_task(
        &self,
        bucket: &str,
        id: &str,
        deadline: std::time::Duration,
        until: impl Fn(&Task) -> bool,
    ) -> Task {
        let poll = async {
            loop {
                if let Ok(task) = self.coordinator.get_task(bucket, id).await {
                    if until(&task) {
                        return task;
                    }
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        };

        tokio::time::timeout(deadline, poll)
            .await
            .expect("task did not reach the expected state in time")
    }

    pub async fn wait_for_status(
        &self,
        bucket: &str,
        id: &str,
        status: TaskStatus,
        deadline: std::time::Duration,
    ) -> Task {
        self.wait_for_task(bucket, id, deadline, |task| task.status == status)
            .await
    }
}
