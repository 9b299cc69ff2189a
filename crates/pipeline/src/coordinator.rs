use super::{Error, PipelineConfig, Result};
use cloud::ObjectStore;
use indexer::DocumentIndex;
use models::{FileUpload, Message, Task, TaskStatus};
use queue::TaskQueue;
use recognizer::Recognize;
use registry::TaskRegistry;
use std::sync::Arc;

/// Coordinator owns the task state machine: it creates and publishes tasks,
/// consumes their redelivery, and fans out bounded workers which drive each
/// task to a terminal state.
pub struct Coordinator {
    pub(crate) registry: Arc<dyn TaskRegistry>,
    pub(crate) queue: Arc<dyn TaskQueue>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) index: Arc<dyn DocumentIndex>,
    pub(crate) recognizer: Arc<dyn Recognize>,
    pub(crate) semaphore_width: usize,
}

impl Coordinator {
    pub fn new(
        config: &PipelineConfig,
        registry: Arc<dyn TaskRegistry>,
        queue: Arc<dyn TaskQueue>,
        objects: Arc<dyn ObjectStore>,
        index: Arc<dyn DocumentIndex>,
        recognizer: Arc<dyn Recognize>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            queue,
            objects,
            index,
            recognizer,
            semaphore_width: config.semaphore_width.max(1),
        })
    }

    /// Create a task for `upload`: store the blob, publish the task message,
    /// and record it as Pending. On failure the task is marked Failed and
    /// the error propagates to the caller.
    #[tracing::instrument(
        skip(self, upload),
        fields(bucket = %upload.bucket, file_path = %upload.file_path)
    )]
    pub async fn create_task(&self, upload: FileUpload) -> Result<Task> {
        let mut task = Task::new(&upload.bucket, &upload.file_path, upload.data.len() as i64);

        tracing::info!(task_id = %task.id, "created new task");
        self.registry.push(&task).await?;

        if let Err(err) = self
            .objects
            .upload(&upload.bucket, &upload.file_path, upload.data, upload.expires)
            .await
        {
            // The registry keeps the initial Received record; clients see
            // the failure through the returned error.
            task.transition(TaskStatus::Failed, format!("failed to upload file: {err}"));
            return Err(Error::Upload(err));
        }

        if let Err(err) = self.queue.publish(&Message::for_task(&task)).await {
            task.transition(
                TaskStatus::Failed,
                format!("failed to publish task to queue: {err}"),
            );
            self.push_status(&task).await;
            return Err(Error::Publish(err));
        }

        task.transition(TaskStatus::Pending, "");
        self.push_status(&task).await;

        Ok(task)
    }

    /// Classify whether the registry already tracks this task as in flight.
    /// Received, Pending, and Processing entries are in flight; Failed and
    /// Successful ones may be re-run.
    ///
    /// TODO: wire this into create_task once duplicate suppression
    /// semantics are settled.
    pub async fn check_task_already_created(&self, task: &Task) -> bool {
        let existing = match self
            .registry
            .get(&task.bucket, &task.id.to_string())
            .await
        {
            Ok(existing) => existing,
            Err(registry::Error::NotFound { .. }) => return false,
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "failed to get task from registry");
                return false;
            }
        };

        match existing.status {
            TaskStatus::Received | TaskStatus::Pending | TaskStatus::Processing => true,
            TaskStatus::Failed | TaskStatus::Successful => false,
        }
    }

    pub async fn get_task(&self, bucket: &str, id: &str) -> registry::Result<Task> {
        self.registry.get(bucket, id).await
    }

    /// All known tasks of `bucket`, optionally narrowed to one status.
    pub async fn get_all_tasks(
        &self,
        bucket: &str,
        status: Option<TaskStatus>,
    ) -> registry::Result<Vec<Task>> {
        let mut tasks = self.registry.get_all(bucket).await?;
        if let Some(status) = status {
            tasks.retain(|task| task.status == status);
        }
        Ok(tasks)
    }

    /// Record the task's current status. The task is in whatever state it
    /// is regardless of whether the projection write lands, so failures
    /// are logged rather than retried.
    pub(crate) async fn push_status(&self, task: &Task) {
        if let Err(err) = self.registry.push(task).await {
            tracing::warn!(
                task_id = %task.id,
                status = task.status.as_i8(),
                error = %err,
                "failed to update task status"
            );
        }
    }
}
