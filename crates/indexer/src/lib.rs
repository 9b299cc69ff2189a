use models::Document;

mod http;
mod memory;

pub use http::{HttpIndexer, IndexerConfig};
pub use memory::MemoryIndex;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("document index is unavailable")]
    Unavailable(#[source] reqwest::Error),
    #[error("document index replied with status {0}")]
    BadStatus(u16),
    #[error("failed to decode document index reply")]
    Decode(#[source] reqwest::Error),
    #[error("invalid index address: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// DocumentIndex stores extracted documents in a search index named after
/// their bucket. Stores are idempotent: repeating a store with the same
/// `file_path` replaces the previous document.
#[async_trait::async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Store `doc` in `index`, returning the assigned document id.
    async fn store_document(&self, index: &str, doc: &Document) -> Result<String>;
    async fn delete_document(&self, index: &str, doc_id: &str) -> Result<()>;

    async fn create_index(&self, index: &str) -> Result<()>;
    async fn delete_index(&self, index: &str) -> Result<()>;
}
