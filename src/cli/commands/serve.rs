//! HTTP API server for integration with other systems.
//!
//! Exposes the query engine and the index over REST.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::KursError;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: &str,
    port: u16,
    no_ingest: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    // Index the configured document folder on startup so a fresh server is
    // immediately queryable.
    if !no_ingest {
        let docs_dir = orchestrator.settings().docs_dir();
        if docs_dir.is_dir() {
            let stats = orchestrator.ingest_folder(&docs_dir).await?;
            if stats.courses_added > 0 {
                Output::success(&format!(
                    "Indexed {} new courses ({} chunks)",
                    stats.courses_added, stats.chunks_added
                ));
            }
        } else {
            Output::warning(&format!(
                "Document folder not found, skipping startup ingestion: {}",
                docs_dir.display()
            ));
        }
    }

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/search", post(search))
        .route("/api/courses", get(courses))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Kurs API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query (RAG)", "POST /api/query");
    Output::kv("Search", "POST /api/search");
    Output::kv("Courses", "GET  /api/courses");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceInfo>,
    session_id: String,
}

#[derive(Serialize)]
struct SourceInfo {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    course: Option<String>,
    #[serde(default)]
    lesson: Option<u32>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct SearchHit {
    course_title: String,
    lesson_number: Option<u32>,
    content: String,
    score: f32,
}

#[derive(Serialize)]
struct CoursesResponse {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let engine = state.orchestrator.rag_engine();

    match engine.query(&req.query, req.session_id.as_deref()).await {
        Ok(response) => Json(QueryResponse {
            answer: response.answer,
            sources: response
                .sources
                .into_iter()
                .map(|s| SourceInfo {
                    label: s.label,
                    link: s.link,
                })
                .collect(),
            session_id: response.session_id,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let index = state.orchestrator.index();

    match index
        .search(&req.query, req.course.as_deref(), req.lesson, req.limit)
        .await
    {
        Ok(results) => Json(SearchResponse {
            results: results
                .into_iter()
                .map(|r| SearchHit {
                    course_title: r.record.course_title,
                    lesson_number: r.record.lesson_number,
                    content: r.record.content,
                    score: r.score,
                })
                .collect(),
        })
        .into_response(),
        Err(e @ KursError::CourseNotFound(_)) => error_response(StatusCode::NOT_FOUND, e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let index = state.orchestrator.index();

    match index.list_course_titles().await {
        Ok(titles) => Json(CoursesResponse {
            total_courses: titles.len(),
            course_titles: titles,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
