use super::{clean_path, Error, ObjectStore, Result};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use models::{FileAttributes, FileEntry};

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct S3Config {
    pub address: String,
    pub access_id: String,
    pub secret_key: String,
    pub token: Option<String>,
    pub enable_ssl: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            address: "localhost:9000".to_string(),
            access_id: String::new(),
            secret_key: String::new(),
            token: None,
            enable_ssl: false,
        }
    }
}

/// S3Store speaks to any S3-compatible endpoint with static credentials
/// and path-style addressing.
#[derive(Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Self {
        let scheme = if config.enable_ssl { "https" } else { "http" };
        let credentials = aws_credential_types::Credentials::new(
            config.access_id.clone(),
            config.secret_key.clone(),
            config.token.clone(),
            None,
            "inlet-static",
        );

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .endpoint_url(format!("{scheme}://{}", config.address))
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn get_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| Error::store("list-buckets", err))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| Error::store("create-bucket", err))?;
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| Error::store("remove-bucket", err))?;
        Ok(())
    }

    async fn is_bucket_exist(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(Error::store("head-bucket", service_err))
                }
            }
        }
    }

    async fn get_bucket_files(&self, bucket: &str, prefix: &str) -> Result<Vec<FileEntry>> {
        let prefix = clean_path(prefix);
        let output = self
            .client
            .list_objects()
            .bucket(bucket)
            .prefix(&prefix)
            .delimiter("/")
            .send()
            .await
            .map_err(|err| Error::store("list-objects", err))?;

        let mut entries = Vec::new();
        for common in output.common_prefixes() {
            if let Some(dir) = common.prefix() {
                entries.push(FileEntry {
                    file_name: dir.to_string(),
                    directory: prefix.clone(),
                    is_directory: true,
                });
            }
        }
        for object in output.contents() {
            if let Some(key) = object.key() {
                entries.push(FileEntry {
                    file_name: key.to_string(),
                    directory: prefix.clone(),
                    is_directory: false,
                });
            }
        }
        Ok(entries)
    }

    async fn get_file_metadata(&self, bucket: &str, path: &str) -> Result<FileAttributes> {
        let path = clean_path(path);
        let output = match self
            .client
            .head_object()
            .bucket(bucket)
            .key(&path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    return Err(Error::NotFound {
                        bucket: bucket.to_string(),
                        path,
                    });
                }
                return Err(Error::store("head-object", service_err));
            }
        };

        Ok(FileAttributes {
            sha256: output.checksum_sha256().unwrap_or_default().to_string(),
            content_type: output.content_type().unwrap_or_default().to_string(),
            last_modified: convert_datetime(output.last_modified())
                .unwrap_or(time::OffsetDateTime::UNIX_EPOCH),
            size: output.content_length().unwrap_or_default(),
            expires: output
                .expires_string()
                .and_then(|raw| {
                    time::OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc2822)
                        .ok()
                }),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: bytes::Bytes,
        expires: Option<time::OffsetDateTime>,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(clean_path(path))
            .body(ByteStream::from(data));

        if let Some(expires) = expires {
            request = request.expires(aws_sdk_s3::primitives::DateTime::from_secs(
                expires.unix_timestamp(),
            ));
        }

        request
            .send()
            .await
            .map_err(|err| Error::store("put-object", err))?;
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<bytes::Bytes> {
        let path = clean_path(path);
        let output = match self
            .client
            .get_object()
            .bucket(bucket)
            .key(&path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(Error::NotFound {
                        bucket: bucket.to_string(),
                        path,
                    });
                }
                return Err(Error::store("get-object", service_err));
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| Error::store("get-object", err))?;
        Ok(body.into_bytes())
    }

    async fn copy(&self, bucket: &str, src_path: &str, dst_path: &str) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(format!("{bucket}/{}", clean_path(src_path)))
            .bucket(bucket)
            .key(clean_path(dst_path))
            .send()
            .await
            .map_err(|err| Error::store("copy-object", err))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(clean_path(path))
            .send()
            .await
            .map_err(|err| Error::store("delete-object", err))?;
        Ok(())
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: std::time::Duration,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|err| Error::store("presign-get", err))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(clean_path(path))
            .presigned(presigning)
            .await
            .map_err(|err| Error::store("presign-get", err))?;

        Ok(request.uri().to_string())
    }
}

fn convert_datetime(
    value: Option<&aws_sdk_s3::primitives::DateTime>,
) -> Option<time::OffsetDateTime> {
    value.and_then(|dt| time::OffsetDateTime::from_unix_timestamp(dt.secs()).ok())
}
