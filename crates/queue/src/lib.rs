use models::Message;

mod amqp;
mod memory;
pub mod trace;

pub use amqp::{AmqpBridge, AmqpConfig};
pub use memory::MemoryQueue;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message cannot be represented on the wire. Retrying is useless.
    #[error("failed to encode queue message")]
    Fatal(#[source] serde_json::Error),
    /// The broker was unreachable or refused the operation. Retry upstream.
    #[error("queue transport error")]
    Transient(#[source] BoxError),
}

impl From<lapin::Error> for Error {
    fn from(err: lapin::Error) -> Self {
        Error::Transient(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Delivery is a consumed envelope: the message plus the publisher's span,
/// rebuilt from transport headers.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Message,
    pub remote_span: Option<opentelemetry::trace::SpanContext>,
}

/// TaskQueue is the durable publish half of the bridge. Consumption is
/// modeled as an owned channel of Deliveries, handed out at connect time.
#[async_trait::async_trait]
pub trait TaskQueue: Send + Sync {
    async fn publish(&self, message: &Message) -> Result<()>;
}
