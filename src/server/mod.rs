//! HTTP endpoint streaming search events

use crate::config::Config;
use crate::http::{create_client, create_page_client};
use crate::llm::OpenAiChat;
use crate::pipeline::{load_system_prompt, PageFetcher, SearchPipeline};
use crate::protocol::StreamEvent;
use crate::search::BingSearch;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Events buffered per request before the pipeline waits for the client
const EVENT_BUFFER: usize = 32;

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

pub struct ApiState {
    pub pipeline: Arc<SearchPipeline>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/websearch", post(websearch))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

/// Run the pipeline and stream its events as newline-delimited JSON
async fn websearch(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            return bad_request(rejection.body_text());
        }
    };

    let query = request.query.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return bad_request("query must not be empty".to_string());
    }

    tracing::info!(query = %query, "received query");

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move { pipeline.run(&query, tx).await });

    let lines =
        ReceiverStream::new(rx).map(|event: StreamEvent| event.to_line().map(Bytes::from));

    (
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}

/// Wire the pipeline from configuration
pub fn build_pipeline(config: &Config) -> Result<SearchPipeline> {
    let credentials = config.credentials()?;
    let api_client = create_client()?;

    let engine = BingSearch::new(
        api_client.clone(),
        config.search.endpoint.clone(),
        credentials.bing_api_key,
        credentials.custom_config_id,
    );
    let model = OpenAiChat::new(
        credentials.openai_api_key,
        config.openai.base_url.clone(),
        api_client,
    );
    let fetcher = PageFetcher::new(
        create_page_client(config.fetch_timeout())?,
        config.fetch.user_agents.clone(),
        config.fetch_timeout(),
        config.fetch.concurrency,
    );
    let system_prompt = load_system_prompt(config.system_prompt_path().as_deref())?;

    Ok(SearchPipeline::new(
        Arc::new(engine),
        Arc::new(model),
        fetcher,
        config.pipeline_settings(),
        system_prompt,
    ))
}

/// Start the server and run until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let settings = pipeline.settings().clone();
    let state = Arc::new(ApiState {
        pipeline: Arc::new(pipeline),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        model = %settings.answer_model,
        deep_search = settings.deep_search,
        "websearch server listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
