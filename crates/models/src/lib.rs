mod documents;
mod messages;
mod objects;
mod tasks;

pub use documents::Document;
pub use messages::Message;
pub use objects::{FileAttributes, FileEntry, FileUpload};
pub use tasks::{Task, TaskStatus};

/// basename returns the final component of a `/`-separated object path.
/// Object-store paths always use `/`, regardless of platform.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
