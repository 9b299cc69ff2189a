use super::Coordinator;
use anyhow::Context as _;
use models::{Document, Task, TaskStatus};
use opentelemetry::trace::TraceContextExt as _;
use queue::Delivery;
use recognizer::InputFile;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;
use tracing_opentelemetry::OpenTelemetrySpanExt as _;

impl Coordinator {
    /// Start the consumer loop and return immediately. The loop selects
    /// over the consumer channel and `shutdown`; each message is admitted
    /// through a semaphore of the configured width and processed by its own
    /// worker. On shutdown the loop stops admitting and waits for in-flight
    /// workers to finish.
    pub fn launch_listener(
        self: &Arc<Self>,
        deliveries: tokio::sync::mpsc::Receiver<Delivery>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(coordinator.listen(deliveries, shutdown))
    }

    async fn listen(
        self: Arc<Self>,
        mut deliveries: tokio::sync::mpsc::Receiver<Delivery>,
        shutdown: CancellationToken,
    ) {
        let width = self.semaphore_width as u32;
        let semaphore = Arc::new(Semaphore::new(self.semaphore_width));

        loop {
            let delivery = tokio::select! {
                delivery = deliveries.recv() => match delivery {
                    Some(delivery) => delivery,
                    None => {
                        // The bridge dropped its sender: broker reconnects
                        // are exhausted, or the host is tearing down.
                        tracing::error!("consumer channel closed, stopping listener");
                        break;
                    }
                },
                () = shutdown.cancelled() => {
                    tracing::info!("terminating processing");
                    break;
                }
            };

            // Admission is cancellation-aware: a message arriving during
            // shutdown is dropped, never half-processed.
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => {
                    permit.expect("semaphore is never closed")
                }
                () = shutdown.cancelled() => {
                    tracing::debug!(
                        task_id = %delivery.message.body.id,
                        "dropping message during shutdown"
                    );
                    break;
                }
            };

            let coordinator = self.clone();
            tokio::spawn(async move {
                coordinator.process_delivery(delivery).await;
                drop(permit);
            });
        }

        // Acquiring every permit only succeeds once all workers are done.
        let _ = semaphore.acquire_many(width).await;
        tracing::info!("listener drained in-flight workers");
    }

    /// Process one redelivered task to a terminal state.
    async fn process_delivery(&self, delivery: Delivery) {
        let Delivery {
            message,
            remote_span,
        } = delivery;
        let mut task = message.body;

        let span = tracing::info_span!(
            "process-task",
            task_id = %task.id,
            bucket = %task.bucket,
            file_path = %task.file_path,
            event_id = %message.event_id,
        );
        if let Some(remote_span) = remote_span {
            // Continue the publisher's trace across the queue hop.
            span.set_parent(opentelemetry::Context::new().with_remote_span_context(remote_span));
        }

        async {
            tracing::info!("processing task event");
            task.transition(TaskStatus::Processing, "");
            self.push_status(&task).await;

            match self.process_task(&task).await {
                Ok(doc_id) => {
                    let status_text = format!("task {} has been processed successful", task.id);
                    tracing::info!(doc_id = %doc_id, "{status_text}");
                    task.transition(TaskStatus::Successful, status_text);
                }
                Err(err) => {
                    let status_text = format!("failed while processing file: {err:#}");
                    tracing::error!(error = %status_text, "failed while task processing");
                    task.transition(TaskStatus::Failed, status_text);
                }
            }

            // The worker always records its terminal verdict before exit.
            self.push_status(&task).await;
        }
        .instrument(span)
        .await
    }

    async fn process_task(&self, task: &Task) -> anyhow::Result<String> {
        let data = self
            .objects
            .download(&task.bucket, &task.file_path)
            .await
            .context("failed to load file")?;

        // A zero-byte download still goes through recognition, which then
        // reports the emptiness itself.
        let input = InputFile {
            name: models::basename(&task.file_path).to_string(),
            data: data.clone(),
        };
        let recognized = self
            .recognizer
            .recognize(input)
            .await
            .context("failed to recognize file")?;

        let doc = Document::from_task(task, recognized.text, data.len() as i64);
        let doc_id = self
            .index
            .store_document(&task.bucket, &doc)
            .await
            .context("failed to store document")?;

        tracing::debug!(doc_id = %doc_id, "document has been stored");
        Ok(doc_id)
    }
}
