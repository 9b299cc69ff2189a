use super::Task;
use serde::{Deserialize, Serialize};

/// Message is the queue envelope of a single task.
/// Trace context travels in transport headers, not in the body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identity of this envelope (not of the task).
    pub event_id: uuid::Uuid,
    /// Snapshot of the task at publish time.
    pub body: Task,
}

impl Message {
    pub fn for_task(task: &Task) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            body: task.clone(),
        }
    }
}
