use serde::{Deserialize, Serialize};

/// FileUpload is an intake request: bytes bound for (bucket, file_path).
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bucket: String,
    pub file_path: String,
    pub data: bytes::Bytes,
    /// Optional expiry stamped onto the stored blob.
    pub expires: Option<time::OffsetDateTime>,
}

/// FileEntry is one row of a non-recursive bucket listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    pub file_name: String,
    pub directory: String,
    pub is_directory: bool,
}

/// FileAttributes are the stat() of a stored blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAttributes {
    #[serde(default)]
    pub sha256: String,
    pub content_type: String,
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "time::serde::rfc3339::deserialize"
    )]
    pub last_modified: time::OffsetDateTime,
    pub size: i64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires: Option<time::OffsetDateTime>,
}
