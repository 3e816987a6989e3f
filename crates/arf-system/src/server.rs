//! Dashboard HTTP server
//!
//! Small polled JSON API bound to localhost: system status, comments
//! (read and submit), open questions, and the framework source.

use arf_document::DocumentManager;
use arf_state::SystemState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live system state
    pub state: Arc<RwLock<SystemState>>,
    /// Document manager
    pub documents: DocumentManager,
    /// Daemon start time
    pub started_at: Instant,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    last_checkpoint: String,
    framework_version: String,
    processed_exports: usize,
    pending_validations: usize,
    pending_questions: usize,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct CommentsResponse {
    comments: Vec<arf_document::Comment>,
}

#[derive(Debug, Deserialize)]
struct AddCommentBody {
    text: String,
    #[serde(default)]
    section: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddCommentResponse {
    success: bool,
    comment: arf_document::Comment,
}

#[derive(Debug, Serialize)]
struct QuestionsResponse {
    questions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct AppError(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: self.0 }),
        )
            .into_response()
    }
}

impl<E: std::fmt::Display> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.to_string())
    }
}

/// Build the dashboard router
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/comments", get(get_comments).post(post_comment))
        .route("/api/questions", get(get_questions))
        .route("/api/document", get(get_document))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the dashboard until the process exits
pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("dashboard listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_status(State(app): State<AppState>) -> Json<StatusResponse> {
    let state = app.state.read().await;
    Json(StatusResponse {
        last_checkpoint: state.last_checkpoint.to_rfc3339(),
        framework_version: state.current_framework_version.clone(),
        processed_exports: state.processed_exports.len(),
        pending_validations: state.pending_validations.len(),
        pending_questions: state.pending_questions.len(),
        uptime_seconds: app.started_at.elapsed().as_secs(),
    })
}

async fn get_comments(State(app): State<AppState>) -> Result<Json<CommentsResponse>, AppError> {
    let comments = app.documents.all_comments()?;
    Ok(Json(CommentsResponse { comments }))
}

async fn post_comment(
    State(app): State<AppState>,
    Json(body): Json<AddCommentBody>,
) -> Result<Json<AddCommentResponse>, AppError> {
    let comment = app.documents.add_comment(body.text, body.section)?;
    tracing::info!(comment = %comment.id, "dashboard comment received");
    Ok(Json(AddCommentResponse {
        success: true,
        comment,
    }))
}

async fn get_questions(State(app): State<AppState>) -> Result<Json<QuestionsResponse>, AppError> {
    let questions = app
        .documents
        .open_questions()?
        .into_iter()
        .map(|q| q.text)
        .collect();
    Ok(Json(QuestionsResponse { questions }))
}

async fn get_document(State(app): State<AppState>) -> Result<String, AppError> {
    Ok(app.documents.framework_source()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arf_state::SystemState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            state: Arc::new(RwLock::new(SystemState::initial())),
            documents: DocumentManager::new(dir.path().join("output")),
            started_at: Instant::now(),
        };
        (router(state), dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_reports_initial_state() {
        let (app, _dir) = app();
        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["framework_version"], "v1.0");
        assert_eq!(json["pending_validations"], 0);
    }

    #[tokio::test]
    async fn comment_post_then_get() {
        let (app, _dir) = app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/comments")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text": "please validate lemma 2"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["comment"]["section"], "general");

        let response = app
            .oneshot(Request::get("/api/comments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["comments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn questions_empty_when_no_file() {
        let (app, _dir) = app();
        let response = app
            .oneshot(Request::get("/api/questions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["questions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn document_served_as_text() {
        let (app, _dir) = app();
        let response = app
            .oneshot(Request::get("/api/document").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
