use super::{basename, Task};
use serde::{Deserialize, Serialize};

/// Document is the indexed projection of a processed task: extracted text
/// plus enough file metadata to locate the source blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content: String,
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "time::serde::rfc3339::deserialize"
    )]
    pub created_at: time::OffsetDateTime,
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "time::serde::rfc3339::deserialize"
    )]
    pub modified_at: time::OffsetDateTime,
}

impl Document {
    /// Build the document of `task` from its extracted text.
    /// `file_size` is the downloaded length, which may differ from the
    /// size recorded at upload if the blob was replaced in between.
    pub fn from_task(task: &Task, content: String, file_size: i64) -> Self {
        Self {
            file_name: basename(&task.file_path).to_string(),
            file_path: task.file_path.clone(),
            file_size,
            content,
            created_at: task.created_at,
            modified_at: task.modified_at,
        }
    }
}
