use super::{DocumentIndex, Error, Result};
use models::Document;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// MemoryIndex is the in-process document index used by tests. It keeps
/// the overwrite-by-path semantics of the real index and counts store
/// attempts so tests can assert invocation counts.
#[derive(Default)]
pub struct MemoryIndex {
    indices: Mutex<BTreeMap<String, BTreeMap<String, Document>>>,
    store_calls: AtomicUsize,
    fail_stores: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent stores fail as a 5xx from the index service.
    pub fn set_failing(&self, failing: bool) {
        self.fail_stores.store(failing, Ordering::SeqCst);
    }

    /// Number of store attempts, including failed ones.
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// All documents currently held by `index`, keyed by file path.
    pub async fn documents(&self, index: &str) -> BTreeMap<String, Document> {
        self.indices
            .lock()
            .await
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentIndex for MemoryIndex {
    async fn store_document(&self, index: &str, doc: &Document) -> Result<String> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(Error::BadStatus(503));
        }

        self.indices
            .lock()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(doc.file_path.clone(), doc.clone());

        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn delete_document(&self, index: &str, doc_id: &str) -> Result<()> {
        // Documents are keyed by path in this fixture; ids are synthetic.
        self.indices
            .lock()
            .await
            .get_mut(index)
            .map(|docs| docs.retain(|path, _| path != doc_id));
        Ok(())
    }

    async fn create_index(&self, index: &str) -> Result<()> {
        self.indices
            .lock()
            .await
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.indices.lock().await.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{DocumentIndex, MemoryIndex};
    use models::{Document, Task};

    #[tokio::test]
    async fn test_store_overwrites_by_path() {
        let index = MemoryIndex::new();
        let task = Task::new("bucket", "a.txt", 3);

        let first = Document::from_task(&task, "one".to_string(), 3);
        let second = Document::from_task(&task, "two".to_string(), 3);

        index.store_document("bucket", &first).await.unwrap();
        index.store_document("bucket", &second).await.unwrap();

        let docs = index.documents("bucket").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs["a.txt"].content, "two");
        assert_eq!(index.store_calls(), 2);
    }
}
