mod http;
mod stub;

pub use http::{HttpRecognizer, RecognizerConfig};
pub use stub::ScriptedRecognizer;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service could not be reached or replied abnormally.
    #[error("recognizer is unavailable")]
    Unavailable(#[source] BoxError),
    /// The service replied, but extracted no text at all.
    #[error("recognizer returned empty content")]
    Empty,
    #[error("invalid recognizer address: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// InputFile is a named byte blob submitted for text extraction.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub data: bytes::Bytes,
}

/// Recognized is the extraction result. `text` is never empty.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Recognized {
    pub text: String,
}

/// Recognize is a single-call request/response boundary to a text
/// extraction service. No streaming.
#[async_trait::async_trait]
pub trait Recognize: Send + Sync {
    async fn recognize(&self, input: InputFile) -> Result<Recognized>;
}
