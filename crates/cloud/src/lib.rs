use models::{FileAttributes, FileEntry};

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object {bucket}/{path} was not found")]
    NotFound { bucket: String, path: String },
    #[error("bucket {0} was not found")]
    NoSuchBucket(String),
    #[error("object store operation {op} failed")]
    Store {
        op: &'static str,
        #[source]
        source: BoxError,
    },
}

impl Error {
    fn store(op: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Store {
            op,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// ObjectStore is a thin typed gateway over a bucketed blob store.
/// It never mutates stored blobs: it uploads, copies, or deletes them.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_buckets(&self) -> Result<Vec<String>>;
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
    async fn remove_bucket(&self, bucket: &str) -> Result<()>;
    async fn is_bucket_exist(&self, bucket: &str) -> Result<bool>;

    /// Non-recursive listing of `bucket` under `prefix`.
    async fn get_bucket_files(&self, bucket: &str, prefix: &str) -> Result<Vec<FileEntry>>;
    async fn get_file_metadata(&self, bucket: &str, path: &str) -> Result<FileAttributes>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: bytes::Bytes,
        expires: Option<time::OffsetDateTime>,
    ) -> Result<()>;
    async fn download(&self, bucket: &str, path: &str) -> Result<bytes::Bytes>;
    async fn copy(&self, bucket: &str, src_path: &str, dst_path: &str) -> Result<()>;
    async fn delete(&self, bucket: &str, path: &str) -> Result<()>;

    async fn move_file(&self, bucket: &str, src_path: &str, dst_path: &str) -> Result<()> {
        self.copy(bucket, src_path, dst_path).await?;
        self.delete(bucket, src_path).await
    }

    /// Presigned, time-limited GET URL of a stored blob.
    async fn presign_get_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: std::time::Duration,
    ) -> Result<String>;
}

/// Normalize an object path: strip leading `/` and `./`, collapse repeated
/// separators, and resolve `.` components. Object keys never start with a
/// separator.
pub fn clean_path(path: &str) -> String {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            part => parts.push(part),
        }
    }
    let mut cleaned = parts.join("/");
    if path.ends_with('/') && !cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}
