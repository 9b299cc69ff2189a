use super::{trace, Delivery, Error, Result, TaskQueue};
use models::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// MemoryQueue is an in-process loopback bridge: published messages are
/// serialized, decoded again, and delivered on the consumer channel, so a
/// publish exercises the same wire round-trip as the broker path.
pub struct MemoryQueue {
    tx: tokio::sync::mpsc::Sender<Delivery>,
    fail_publishes: AtomicBool,
}

impl MemoryQueue {
    pub fn new(capacity: usize) -> (Arc<Self>, tokio::sync::mpsc::Receiver<Delivery>) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        (
            Arc::new(Self {
                tx,
                fail_publishes: AtomicBool::new(false),
            }),
            rx,
        )
    }

    /// Make subsequent publishes fail with a transient error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_publishes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TaskQueue for MemoryQueue {
    async fn publish(&self, message: &Message) -> Result<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(Error::Transient(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "synthetic broker outage",
            ))));
        }

        let body = serde_json::to_vec(message).map_err(Error::Fatal)?;
        let headers = trace::current_trace_headers();

        let message: Message = serde_json::from_slice(&body)
            .expect("a just-encoded message always decodes");
        let delivery = Delivery {
            message,
            remote_span: trace::remote_span_from_headers(&headers),
        };

        self.tx.send(delivery).await.map_err(|send_error| {
            Error::Transient(Box::new(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                send_error.to_string(),
            )))
        })
    }
}
