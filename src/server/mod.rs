//! HTTP surface: request validation, cascade invocation, and the mapping
//! of classified failures onto responses.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cascade::{metadata, CascadeController, Payload};
use crate::config::Config;
use crate::{utils, Result};

pub mod diagnostics;

use diagnostics::Diagnostics;

pub struct AppState {
    pub config: Config,
    pub cascade: CascadeController,
    pub diagnostics: Diagnostics,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// POST /transcribe - run the extraction cascade for one URL
pub async fn transcribe(
    State(state): State<SharedState>,
    Json(request): Json<TranscribeRequest>,
) -> Response {
    let url = match utils::validate_url(&request.url) {
        Ok(url) => url,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    detail: error.to_string(),
                }),
            )
                .into_response();
        }
    };

    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, url = %url, "processing transcription request");

    match state.cascade.extract(url.as_str()).await {
        Ok(success) => {
            let (transcription, video_url) = match success.payload {
                Payload::Transcript(text) => (Some(text), None),
                Payload::MediaUrl(media_url) => (None, Some(media_url)),
            };

            Json(TranscribeResponse {
                url: url.to_string(),
                title: success.title,
                transcription,
                video_url,
                success: true,
            })
            .into_response()
        }
        Err(classified) => {
            tracing::error!(
                %request_id,
                status = classified.status,
                raw = %classified.raw,
                "extraction failed"
            );

            let status = StatusCode::from_u16(classified.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            (
                status,
                Json(ErrorBody {
                    detail: classified.message,
                }),
            )
                .into_response()
        }
    }
}

/// GET / - static capability listing
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Forkcast Backend API",
        "endpoints": {
            "GET /": "This message",
            "POST /transcribe": "Get a video transcription or a direct media URL",
            "GET /health": "Health check",
            "GET /status": "Operational diagnostics"
        }
    }))
}

/// GET /health - liveness only, no dependencies checked
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET /status - operational diagnostics. Never fails; a broken or
/// missing extractor shows up as `available: false`.
pub async fn status(State(state): State<SharedState>) -> Json<Value> {
    let version = metadata::yt_dlp_version(&state.config.extractor.yt_dlp_path).await;

    Json(json!({
        "status": "ok",
        "uptime_seconds": state.diagnostics.uptime_seconds(),
        "started_at": state.diagnostics.started_at().to_rfc3339(),
        "yt_dlp": {
            "available": version.is_some(),
            "version": version,
        },
        "cascade_stages": state.cascade.strategy_names(),
        "endpoints": ["GET /", "POST /transcribe", "GET /health", "GET /status"],
    }))
}

/// Permissive CORS for browser clients; the service carries no
/// credentials or cookies
async fn cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/transcribe", post(transcribe))
        .layer(axum::middleware::from_fn(cors))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(state: SharedState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{Extraction, ExtractionStrategy};
    use async_trait::async_trait;
    use axum::body::to_bytes;

    /// Deterministic stand-in for a real extraction stage
    struct StubStrategy {
        outcome: std::result::Result<(Option<&'static str>, Payload), &'static str>,
    }

    #[async_trait]
    impl ExtractionStrategy for StubStrategy {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn run(&self, _url: &str) -> crate::Result<Extraction> {
            match self.outcome.clone() {
                Ok((title, payload)) => Ok(Extraction {
                    title: title.map(String::from),
                    payload,
                }),
                Err(message) => Err(anyhow::anyhow!(message)),
            }
        }
    }

    fn state_with(outcome: std::result::Result<(Option<&'static str>, Payload), &'static str>) -> SharedState {
        let mut cascade = CascadeController::new();
        cascade.register(Box::new(StubStrategy { outcome }));

        Arc::new(AppState {
            config: Config::default(),
            cascade,
            diagnostics: Diagnostics::new(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_transcribe_success_with_transcription() {
        let state = state_with(Ok((
            Some("A Talk"),
            Payload::Transcript("hello world".to_string()),
        )));

        let response = transcribe(
            State(state),
            Json(TranscribeRequest {
                url: "https://example.test/watch".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["url"], "https://example.test/watch");
        assert_eq!(body["title"], "A Talk");
        assert_eq!(body["transcription"], "hello world");
        assert_eq!(body["success"], true);
        assert!(body.get("video_url").is_none());
    }

    #[tokio::test]
    async fn test_transcribe_success_with_media_url() {
        let state = state_with(Ok((
            None,
            Payload::MediaUrl("https://cdn.test/v.mp4".to_string()),
        )));

        let response = transcribe(
            State(state),
            Json(TranscribeRequest {
                url: "https://example.test/watch".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Unknown");
        assert_eq!(body["video_url"], "https://cdn.test/v.mp4");
        assert!(body.get("transcription").is_none());
    }

    #[tokio::test]
    async fn test_transcribe_classified_failure() {
        let state = state_with(Err("ERROR: HTTP Error 404: Not Found"));

        let response = transcribe(
            State(state),
            Json(TranscribeRequest {
                url: "https://example.test/watch".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(
            body["detail"],
            "Video not found: The requested video could not be found"
        );
    }

    #[tokio::test]
    async fn test_transcribe_rejects_invalid_url() {
        let state = state_with(Ok((None, Payload::Transcript(String::new()))));

        let response = transcribe(
            State(state),
            Json(TranscribeRequest {
                url: "not-a-url".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid URL format: not-a-url");
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.0["status"], "healthy");
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let response = root().await;
        assert_eq!(response.0["message"], "Forkcast Backend API");
        assert!(response.0["endpoints"]["POST /transcribe"].is_string());
    }

    #[tokio::test]
    async fn test_status_never_fails() {
        let mut state = state_with(Ok((None, Payload::Transcript(String::new()))));
        // Point at an executable that cannot exist
        Arc::get_mut(&mut state).unwrap().config.extractor.yt_dlp_path =
            "/nonexistent/yt-dlp".to_string();

        let response = status(State(state)).await;
        assert_eq!(response.0["status"], "ok");
        assert_eq!(response.0["yt_dlp"]["available"], false);
        assert_eq!(response.0["cascade_stages"][0], "stub");
    }
}
