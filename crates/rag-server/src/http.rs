/// REST front end.
///
/// Prompt endpoints answer failures with `{status: "error", message, query}` so the
/// caller can correlate the error with its request. All other endpoints use
/// `AppError`'s `{detail}` body.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::AppError;
use crate::service::RagService;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub collection_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCollectionParams {
    pub collection_name: String,
}

/// Failure of a prompt endpoint, echoing the query back.
struct PromptError {
    error: AppError,
    query: String,
}

impl IntoResponse for PromptError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            error!(error = %self.error, query = %self.query, "prompt request failed");
        }
        let body = Json(json!({
            "status": "error",
            "message": self.error.to_string(),
            "query": self.query,
        }));
        (status, body).into_response()
    }
}

pub fn router(service: Arc<RagService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/prompt-json", post(prompt_json))
        .route("/prompt-essay", post(prompt_essay))
        .route("/upload-pdf", post(upload_pdf))
        .route("/collection-list", get(collection_list))
        .route("/delete-collection", delete(delete_collection))
        .with_state(service)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` on `addr` until Ctrl-C.
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("http server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn prompt_json(
    State(service): State<Arc<RagService>>,
    Json(request): Json<QueryRequest>,
) -> Result<Response, PromptError> {
    let result = service
        .prompt_json(&request.question, request.collection_name.as_deref())
        .await;
    result
        .map(|r| Json(r).into_response())
        .map_err(|error| PromptError {
            error,
            query: request.question,
        })
}

async fn prompt_essay(
    State(service): State<Arc<RagService>>,
    Json(request): Json<QueryRequest>,
) -> Result<Response, PromptError> {
    let result = service
        .generate_essay(&request.question, request.collection_name.as_deref())
        .await;
    result
        .map(|r| Json(r).into_response())
        .map_err(|error| PromptError {
            error,
            query: request.question,
        })
}

async fn upload_pdf(
    State(service): State<Arc<RagService>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut collection: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                upload = Some((file_name, bytes.to_vec()));
            }
            "collection_name" => {
                collection = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::BadRequest("multipart field 'file' is required".to_string()));
    };
    let (count, collection) = service
        .upload_pdf(&file_name, bytes, collection.as_deref())
        .await?;

    Ok(Json(json!({
        "message": format!("Added {count} chunks to collection '{collection}'")
    })))
}

async fn collection_list(State(service): State<Arc<RagService>>) -> Result<Json<Value>, AppError> {
    let collections = service.list_collections().await?;
    Ok(Json(json!({ "collections": collections })))
}

async fn delete_collection(
    State(service): State<Arc<RagService>>,
    Query(params): Query<DeleteCollectionParams>,
) -> Result<Json<Value>, AppError> {
    service.delete_collection(&params.collection_name).await?;
    Ok(Json(json!({
        "message": format!("Collection '{}' deleted successfully!", params.collection_name)
    })))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {e}"))
}
