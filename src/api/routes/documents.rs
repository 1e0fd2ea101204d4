use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::api::state::AppState;
use crate::domain::{DocumentRef, DomainError};

#[derive(Debug, Serialize)]
pub struct DocumentRefResponse {
    pub collection: String,
    pub name: String,
    pub path: String,
}

impl From<DocumentRef> for DocumentRefResponse {
    fn from(reference: DocumentRef) -> Self {
        Self {
            path: reference.path(),
            collection: reference.collection().to_string(),
            name: reference.name().to_string(),
        }
    }
}

fn error_status(e: &DomainError) -> StatusCode {
    match e {
        DomainError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        DomainError::DataMissing { .. } => StatusCode::NOT_FOUND,
        DomainError::Persistence { .. }
        | DomainError::ExternalService(_)
        | DomainError::Connection(_) => StatusCode::BAD_GATEWAY,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(e: DomainError, action: &str) -> StatusCode {
    let status = error_status(&e);
    if status.is_server_error() {
        tracing::error!(error = %e, "Failed to {action}");
    } else {
        tracing::warn!(error = %e, "Rejected {action}");
    }
    status
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<DocumentRefResponse>>, StatusCode> {
    let references = state
        .store
        .list_documents(&collection)
        .await
        .map_err(|e| reject(e, "list documents"))?;

    Ok(Json(references.map(DocumentRefResponse::from).collect()))
}

pub async fn read_document(
    State(state): State<AppState>,
    Path((collection, document)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    match state.store.read_document(&collection, &document).await {
        Ok(Some(data)) => Ok(Json(data)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(reject(e, "read document")),
    }
}

pub async fn save_document(
    State(state): State<AppState>,
    Path((collection, document)): Path<(String, String)>,
    Json(data): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .save_document(&collection, &document, data)
        .await
        .map_err(|e| reject(e, "save document"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::application::DocumentStoreClient;
    use crate::infrastructure::{AppConfig, InMemoryDocumentDatabase};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use axum::Router;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(database: Arc<InMemoryDocumentDatabase>) -> Router {
        let store = DocumentStoreClient::new("demo", database).unwrap();
        create_router(AppState::new(store, AppConfig::default()))
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let app = app(Arc::new(InMemoryDocumentDatabase::new()));

        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                "/api/v1/collections/alerts/documents/alert-1",
                Some(json!({"severity": "high"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/collections/alerts/documents/alert-1",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"severity": "high"}));
    }

    #[tokio::test]
    async fn test_list_documents() {
        let database = Arc::new(InMemoryDocumentDatabase::new());
        let store = DocumentStoreClient::new("demo", database.clone()).unwrap();
        for name in ["n1", "n2"] {
            store.save_document("notes", name, json!(name)).await.unwrap();
        }

        let response = app(database)
            .oneshot(request(Method::GET, "/api/v1/collections/notes/documents", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([
                {"collection": "notes", "name": "n1", "path": "notes/n1"},
                {"collection": "notes", "name": "n2", "path": "notes/n2"}
            ])
        );
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let response = app(Arc::new(InMemoryDocumentDatabase::new()))
            .oneshot(request(
                Method::GET,
                "/api/v1/collections/alerts/documents/nope",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_collection_is_bad_request() {
        let database = Arc::new(InMemoryDocumentDatabase::new());
        let response = app(database.clone())
            .oneshot(request(Method::GET, "/api/v1/collections/%20/documents", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(database.interactions(), 0);
    }

    #[tokio::test]
    async fn test_failed_save_is_bad_gateway() {
        let database = Arc::new(InMemoryDocumentDatabase::new());
        database.fail_writes("unavailable");

        let response = app(database)
            .oneshot(request(
                Method::PUT,
                "/api/v1/collections/alerts/documents/alert-1",
                Some(json!({"severity": "high"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(InMemoryDocumentDatabase::new()))
            .oneshot(request(Method::GET, "/health", None))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["project_id"], "demo");
    }
}
