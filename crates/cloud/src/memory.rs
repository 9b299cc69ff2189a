use super::{clean_path, Error, ObjectStore, Result};
use models::{FileAttributes, FileEntry};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

struct StoredObject {
    data: bytes::Bytes,
    uploaded_at: time::OffsetDateTime,
    expires: Option<time::OffsetDateTime>,
}

/// MemoryStore is the in-process object store used by tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `bucket` up front, as provisioning tooling would.
    pub async fn with_bucket(self, bucket: &str) -> Self {
        self.buckets
            .lock()
            .await
            .insert(bucket.to_string(), BTreeMap::new());
        self
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets.lock().await.keys().cloned().collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.buckets
            .lock()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        self.buckets
            .lock()
            .await
            .remove(bucket)
            .map(|_| ())
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))
    }

    async fn is_bucket_exist(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.lock().await.contains_key(bucket))
    }

    async fn get_bucket_files(&self, bucket: &str, prefix: &str) -> Result<Vec<FileEntry>> {
        let prefix = clean_path(prefix);
        let buckets = self.buckets.lock().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?;

        let mut entries = Vec::new();
        let mut seen_dirs = std::collections::BTreeSet::new();

        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                // A deeper component surfaces once, as a directory.
                Some((dir, _)) => {
                    if seen_dirs.insert(dir.to_string()) {
                        entries.push(FileEntry {
                            file_name: format!("{prefix}{dir}/"),
                            directory: prefix.clone(),
                            is_directory: true,
                        });
                    }
                }
                None => entries.push(FileEntry {
                    file_name: key.clone(),
                    directory: prefix.clone(),
                    is_directory: false,
                }),
            }
        }
        Ok(entries)
    }

    async fn get_file_metadata(&self, bucket: &str, path: &str) -> Result<FileAttributes> {
        let path = clean_path(path);
        let buckets = self.buckets.lock().await;
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(&path))
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                path: path.clone(),
            })?;

        Ok(FileAttributes {
            sha256: String::new(),
            content_type: "application/octet-stream".to_string(),
            last_modified: object.uploaded_at,
            size: object.data.len() as i64,
            expires: object.expires,
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: bytes::Bytes,
        expires: Option<time::OffsetDateTime>,
    ) -> Result<()> {
        let mut buckets = self.buckets.lock().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?;

        objects.insert(
            clean_path(path),
            StoredObject {
                data,
                uploaded_at: time::OffsetDateTime::now_utc(),
                expires,
            },
        );
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<bytes::Bytes> {
        let path = clean_path(path);
        let buckets = self.buckets.lock().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(&path))
            .map(|object| object.data.clone())
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                path,
            })
    }

    async fn copy(&self, bucket: &str, src_path: &str, dst_path: &str) -> Result<()> {
        let src_path = clean_path(src_path);
        let mut buckets = self.buckets.lock().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?;

        let copied = objects
            .get(&src_path)
            .map(|object| StoredObject {
                data: object.data.clone(),
                uploaded_at: time::OffsetDateTime::now_utc(),
                expires: object.expires,
            })
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                path: src_path,
            })?;

        objects.insert(clean_path(dst_path), copied);
        Ok(())
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        let path = clean_path(path);
        let mut buckets = self.buckets.lock().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?;

        objects.remove(&path).map(|_| ()).ok_or(Error::NotFound {
            bucket: bucket.to_string(),
            path,
        })
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: std::time::Duration,
    ) -> Result<String> {
        let path = clean_path(path);
        let buckets = self.buckets.lock().await;
        if !buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(&path))
        {
            return Err(Error::NotFound {
                bucket: bucket.to_string(),
                path,
            });
        }

        Ok(format!(
            "memory://{bucket}/{path}?expires={}",
            ttl.as_secs()
        ))
    }
}
