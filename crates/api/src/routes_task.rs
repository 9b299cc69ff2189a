use super::{ApiContext, ApiError};
use axum::extract::{Path, Query, State};
use axum::Json;
use models::{Task, TaskStatus};

#[derive(Debug, serde::Deserialize)]
pub struct TaskFilter {
    status: Option<i8>,
}

pub async fn get_task(
    State(context): State<ApiContext>,
    Path((bucket, id)): Path<(String, String)>,
) -> Result<Json<Task>, ApiError> {
    let task = context.coordinator.get_task(&bucket, &id).await?;
    Ok(Json(task))
}

pub async fn get_all_tasks(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let status = filter
        .status
        .map(|raw| {
            TaskStatus::from_i8(raw)
                .ok_or_else(|| ApiError::Validation(format!("unknown task status {raw}")))
        })
        .transpose()?;

    let tasks = context.coordinator.get_all_tasks(&bucket, status).await?;
    Ok(Json(tasks))
}
