use serde::{de::Error as _, Deserialize, Serialize};

/// TaskStatus is the lifecycle state of an ingestion task.
///
/// The happy path is Received → Pending → Processing → Successful.
/// Any non-terminal state may transition to Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskStatus {
    Failed,
    Received,
    Pending,
    Processing,
    Successful,
}

impl TaskStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Successful | TaskStatus::Failed)
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            TaskStatus::Failed => -1,
            TaskStatus::Received => 0,
            TaskStatus::Pending => 1,
            TaskStatus::Processing => 2,
            TaskStatus::Successful => 3,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(TaskStatus::Failed),
            0 => Some(TaskStatus::Received),
            1 => Some(TaskStatus::Pending),
            2 => Some(TaskStatus::Processing),
            3 => Some(TaskStatus::Successful),
            _ => None,
        }
    }
}

// Task status is an integer on the wire.
impl Serialize for TaskStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i8::deserialize(deserializer)?;
        TaskStatus::from_i8(value)
            .ok_or_else(|| D::Error::custom(format!("invalid task status {value}")))
    }
}

/// Task is one file's ingestion, keyed by (bucket, id) in the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Opaque, globally unique identity. Immutable once assigned.
    pub id: uuid::Uuid,
    /// Bucket holding the task's blob.
    pub bucket: String,
    /// Path of the blob within its bucket.
    pub file_path: String,
    /// Size of the uploaded blob in bytes.
    pub file_size: i64,
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
    pub status: TaskStatus,
    /// Diagnostic text. Meaningful for Failed and Successful tasks.
    #[serde(default)]
    pub status_text: String,
}

impl Task {
    /// Create a new Received task with a random identity.
    pub fn new(bucket: impl Into<String>, file_path: impl Into<String>, file_size: i64) -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4(),
            bucket: bucket.into(),
            file_path: file_path.into(),
            file_size,
            created_at: now,
            modified_at: now,
            status: TaskStatus::Received,
            status_text: String::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance the task to `status`, refreshing its modification time.
    /// Transitions out of a terminal state are refused.
    pub fn transition(&mut self, status: TaskStatus, status_text: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = status;
        self.status_text = status_text.into();
        self.modified_at = time::OffsetDateTime::now_utc();
        true
    }
}

#[cfg(test)]
mod test {
    use super::{Task, TaskStatus};

    #[test]
    fn test_status_wire_values() {
        for (status, value) in [
            (TaskStatus::Failed, -1),
            (TaskStatus::Received, 0),
            (TaskStatus::Pending, 1),
            (TaskStatus::Processing, 2),
            (TaskStatus::Successful, 3),
        ] {
            assert_eq!(status.as_i8(), value);
            assert_eq!(TaskStatus::from_i8(value), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, value.to_string());
            assert_eq!(serde_json::from_str::<TaskStatus>(&json).unwrap(), status);
        }
        assert!(TaskStatus::from_i8(7).is_none());
        assert!(serde_json::from_str::<TaskStatus>("7").is_err());
    }

    #[test]
    fn test_task_wire_shape() {
        let mut task = Task::new("my-bucket", "dir/report.pdf", 1024);
        task.id = uuid::Uuid::nil();
        task.created_at = time::OffsetDateTime::UNIX_EPOCH;
        task.modified_at = time::OffsetDateTime::UNIX_EPOCH;

        insta::assert_json_snapshot!(task, @r###"
        {
          "id": "00000000-0000-0000-0000-000000000000",
          "bucket": "my-bucket",
          "file_path": "dir/report.pdf",
          "file_size": 1024,
          "created_at": "1970-01-01T00:00:00Z",
          "modified_at": "1970-01-01T00:00:00Z",
          "status": 0,
          "status_text": ""
        }
        "###);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut task = Task::new("b", "f", 0);
        assert!(task.transition(TaskStatus::Pending, ""));
        assert!(task.transition(TaskStatus::Processing, ""));
        assert!(task.transition(TaskStatus::Successful, "done"));

        assert!(!task.transition(TaskStatus::Processing, "again"));
        assert_eq!(task.status, TaskStatus::Successful);
        assert_eq!(task.status_text, "done");

        let mut task = Task::new("b", "f", 0);
        assert!(task.transition(TaskStatus::Failed, "boom"));
        assert!(!task.transition(TaskStatus::Successful, ""));
        assert_eq!(task.status, TaskStatus::Failed);
    }
}
