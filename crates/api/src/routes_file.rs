use super::{ApiContext, ApiError};
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use models::{FileAttributes, FileEntry, FileUpload, Task};

#[derive(Debug, serde::Deserialize)]
pub struct UploadQuery {
    /// Optional RFC-3339 expiry stamped onto uploaded blobs.
    expires: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    prefix: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct FilePathForm {
    file_path: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct CopyFileForm {
    src_path: String,
    dst_path: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ShareFileForm {
    file_path: String,
    /// Lifetime of the link in seconds.
    #[serde(default = "default_share_ttl")]
    expires_secs: u64,
}

fn default_share_ttl() -> u64 {
    3600
}

/// Accept a multipart upload and create one ingestion task per file part.
pub async fn upload_files(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Task>>, ApiError> {
    let expires = query
        .expires
        .as_deref()
        .map(|raw| {
            time::OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339)
                .map_err(|_| ApiError::Validation(format!("invalid expires timestamp {raw:?}")))
        })
        .transpose()?;

    let mut tasks = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(err.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(err.to_string()))?;

        let task = context
            .coordinator
            .create_task(FileUpload {
                bucket: bucket.clone(),
                file_path: cloud::clean_path(&file_name),
                data,
                expires,
            })
            .await?;
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(ApiError::Validation(
            "multipart upload carries no file parts".to_string(),
        ));
    }
    Ok(Json(tasks))
}

pub async fn get_bucket_files(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let entries = context
        .objects
        .get_bucket_files(&bucket, &query.prefix)
        .await?;
    Ok(Json(entries))
}

pub async fn download_file(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<FilePathForm>,
) -> Result<bytes::Bytes, ApiError> {
    let data = context.objects.download(&bucket, &form.file_path).await?;
    Ok(data)
}

pub async fn copy_file(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<CopyFileForm>,
) -> Result<(), ApiError> {
    context
        .objects
        .copy(&bucket, &form.src_path, &form.dst_path)
        .await?;
    Ok(())
}

pub async fn move_file(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<CopyFileForm>,
) -> Result<(), ApiError> {
    context
        .objects
        .move_file(&bucket, &form.src_path, &form.dst_path)
        .await?;
    Ok(())
}

pub async fn delete_file(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<FilePathForm>,
) -> Result<(), ApiError> {
    context.objects.delete(&bucket, &form.file_path).await?;
    Ok(())
}

pub async fn file_attributes(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<FilePathForm>,
) -> Result<Json<FileAttributes>, ApiError> {
    let attributes = context
        .objects
        .get_file_metadata(&bucket, &form.file_path)
        .await?;
    Ok(Json(attributes))
}

pub async fn share_file(
    State(context): State<ApiContext>,
    Path(bucket): Path<String>,
    Json(form): Json<ShareFileForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let url = context
        .objects
        .presign_get_url(
            &bucket,
            &form.file_path,
            std::time::Duration::from_secs(form.expires_secs),
        )
        .await?;
    Ok(Json(serde_json::json!({ "url": url })))
}
