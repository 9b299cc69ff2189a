use super::{ApiContext, ApiError};
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_buckets(
    State(context): State<ApiContext>,
) -> Result<Json<Vec<String>>, ApiError> {
    let buckets = context.objects.get_buckets().await?;
    Ok(Json(buckets))
}

pub async fn create_bucket(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
) -> Result<(), ApiError> {
    if context.objects.is_bucket_exist(&bucket).await? {
        return Err(ApiError::Validation(format!(
            "bucket {bucket} already exists"
        )));
    }
    context.objects.create_bucket(&bucket).await?;
    Ok(())
}

pub async fn remove_bucket(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
) -> Result<(), ApiError> {
    context.objects.remove_bucket(&bucket).await?;
    Ok(())
}
