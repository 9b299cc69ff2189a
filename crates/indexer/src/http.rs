use super::{DocumentIndex, Error, Result};
use models::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub address: String,
    #[serde(with = "humantime_serde")]
    pub timeout: std::time::Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:2892".to_string(),
            timeout: std::time::Duration::from_secs(300),
        }
    }
}

/// Wire form of a stored document. Timestamps travel as unix-millis.
#[derive(Debug, Serialize)]
struct StoreDocumentForm<'a> {
    file_name: &'a str,
    file_path: &'a str,
    file_size: i64,
    content: &'a str,
    created_at: i64,
    modified_at: i64,
}

impl<'a> From<&'a Document> for StoreDocumentForm<'a> {
    fn from(doc: &'a Document) -> Self {
        Self {
            file_name: &doc.file_name,
            file_path: &doc.file_path,
            file_size: doc.file_size,
            content: &doc.content,
            created_at: unix_millis(doc.created_at),
            modified_at: unix_millis(doc.modified_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoreDocumentReply {
    #[allow(dead_code)]
    status: i32,
    message: String,
}

/// HttpIndexer stores documents through the index service's REST surface.
pub struct HttpIndexer {
    base: url::Url,
    client: reqwest::Client,
}

impl HttpIndexer {
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        let base = url::Url::parse(&config.address)
            .map_err(|_| Error::Address(config.address.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::Unavailable)?;

        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base
            .join(path)
            .map_err(|_| Error::Address(format!("{}{path}", self.base)))
    }
}

#[async_trait::async_trait]
impl DocumentIndex for HttpIndexer {
    async fn store_document(&self, index: &str, doc: &Document) -> Result<String> {
        // force=true: a repeated store of the same file path replaces the
        // previously indexed document.
        let url = self.endpoint(&format!("storage/{index}/create?force=true"))?;

        tracing::debug!(index = %index, file_path = %doc.file_path, "storing document to index");

        let response = self
            .client
            .put(url)
            .json(&StoreDocumentForm::from(doc))
            .send()
            .await
            .map_err(Error::Unavailable)?;

        if !response.status().is_success() {
            return Err(Error::BadStatus(response.status().as_u16()));
        }

        let reply: StoreDocumentReply = response.json().await.map_err(Error::Decode)?;
        Ok(reply.message)
    }

    async fn delete_document(&self, index: &str, doc_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("storage/{index}/{doc_id}"))?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(Error::Unavailable)?;

        if !response.status().is_success() {
            return Err(Error::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn create_index(&self, index: &str) -> Result<()> {
        let url = self.endpoint(&format!("storage/{index}/create"))?;

        let response = self
            .client
            .put(url)
            .json(&serde_json::json!({ "id": index, "name": index }))
            .send()
            .await
            .map_err(Error::Unavailable)?;

        if !response.status().is_success() {
            return Err(Error::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let url = self.endpoint(&format!("storage/{index}"))?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(Error::Unavailable)?;

        if !response.status().is_success() {
            return Err(Error::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

fn unix_millis(ts: time::OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}
