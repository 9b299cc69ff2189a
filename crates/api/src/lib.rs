mod error;
mod routes_bucket;
mod routes_file;
mod routes_task;

pub use error::ApiError;

use cloud::ObjectStore;
use pipeline::Coordinator;
use std::sync::Arc;

/// Configuration of the intake HTTP server.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:2893".to_string(),
        }
    }
}

/// Shared state of every route handler.
#[derive(Clone)]
pub struct ApiContext {
    pub coordinator: Arc<Coordinator>,
    pub objects: Arc<dyn ObjectStore>,
}

/// Build the intake router: uploads become tasks, task state is queryable,
/// and bucket/file management passes through to the object store.
pub fn build_router(context: ApiContext) -> axum::Router {
    use axum::routing::{get, post, put};

    axum::Router::new()
        .route("/healthz", get(healthz))
        .route("/tasks/:bucket", get(routes_task::get_all_tasks))
        .route("/tasks/:bucket/:id", get(routes_task::get_task))
        .route("/buckets", get(routes_bucket::get_buckets))
        .route(
            "/buckets/:bucket",
            put(routes_bucket::create_bucket).delete(routes_bucket::remove_bucket),
        )
        .route(
            "/buckets/:bucket/files",
            get(routes_file::get_bucket_files).delete(routes_file::delete_file),
        )
        .route("/buckets/:bucket/files/upload", post(routes_file::upload_files))
        .route("/buckets/:bucket/files/download", post(routes_file::download_file))
        .route("/buckets/:bucket/files/copy", post(routes_file::copy_file))
        .route("/buckets/:bucket/files/move", post(routes_file::move_file))
        .route("/buckets/:bucket/files/attributes", post(routes_file::file_attributes))
        .route("/buckets/:bucket/files/share", post(routes_file::share_file))
        .with_state(context)
}

async fn healthz() -> &'static str {
    "OK"
}

#[cfg(test)]
mod test {
    use super::{build_router, ApiContext};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cloud::MemoryStore;
    use indexer::MemoryIndex;
    use models::TaskStatus;
    use pipeline::{Coordinator, PipelineConfig};
    use queue::MemoryQueue;
    use recognizer::ScriptedRecognizer;
    use registry::MemoryRegistry;
    use std::sync::Arc;
    use tower::ServiceExt;

    // The receiver keeps the loopback queue open; tests hold it unread
    // since no listener runs here.
    async fn test_context() -> (ApiContext, tokio::sync::mpsc::Receiver<queue::Delivery>) {
        let objects = Arc::new(MemoryStore::new().with_bucket("inbox").await);
        let (queue, deliveries) = MemoryQueue::new(16);

        let coordinator = Coordinator::new(
            &PipelineConfig::default(),
            Arc::new(MemoryRegistry::new()),
            queue,
            objects.clone(),
            Arc::new(MemoryIndex::new()),
            Arc::new(ScriptedRecognizer::echoing()),
        );

        (
            ApiContext {
                coordinator,
                objects,
            },
            deliveries,
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (context, _deliveries) = test_context().await;
        let app = build_router(context);
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_task_is_404() {
        let (context, _deliveries) = test_context().await;
        let app = build_router(context);
        let response = app
            .oneshot(
                Request::get("/tasks/inbox/4b1c2d76-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_task_queries_and_status_filter() {
        let (context, _deliveries) = test_context().await;
        let task = context
            .coordinator
            .create_task(models::FileUpload {
                bucket: "inbox".to_string(),
                file_path: "a.txt".to_string(),
                data: bytes::Bytes::from_static(b"abc"),
                expires: None,
            })
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let app = build_router(context);

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/tasks/inbox/{}", task.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], task.id.to_string());
        assert_eq!(body["status"], 1);

        // Pending matches the filter, Successful does not.
        let response = app
            .clone()
            .oneshot(
                Request::get("/tasks/inbox?status=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(
                Request::get("/tasks/inbox?status=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().is_empty());

        // An undefined status value is a client error.
        let response = app
            .oneshot(
                Request::get("/tasks/inbox?status=9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bucket_passthrough() {
        let (context, _deliveries) = test_context().await;
        let app = build_router(context);

        let response = app
            .clone()
            .oneshot(Request::put("/buckets/fresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::get("/buckets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let buckets: Vec<String> = serde_json::from_value(body).unwrap();
        assert!(buckets.contains(&"fresh".to_string()));
        assert!(buckets.contains(&"inbox".to_string()));
    }
}
