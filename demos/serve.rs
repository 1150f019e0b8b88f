use std::path::{Component, Path, PathBuf};

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use axum_file_responder::{FileResponder, ResponderConfig};

const ROOT: &str = "test";

#[derive(Debug, Deserialize)]
struct FileRequest {
    path: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // e.g. RESPONDER_CONFIG='{"serve_ranges": false}'
    let config = match std::env::var("RESPONDER_CONFIG") {
        Ok(json) => serde_json::from_str(&json).expect("RESPONDER_CONFIG is not a valid config"),
        Err(_) => ResponderConfig::default(),
    };
    let responder = FileResponder::new(config);

    let router = Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/file", get(get_file))
        .with_state(responder);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, router).await.unwrap();
}

async fn get_file(
    axum::extract::State(responder): axum::extract::State<FileResponder>,
    headers: HeaderMap,
    Query(q): Query<FileRequest>,
) -> Response {
    match resolve(&q.path) {
        Some(path) => responder.serve(path, &headers).await,
        None => (StatusCode::BAD_REQUEST, "bad path").into_response(),
    }
}

// only plain relative paths below ROOT
fn resolve(requested: &str) -> Option<PathBuf> {
    let requested = Path::new(requested);
    if requested.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(Path::new(ROOT).join(requested))
    } else {
        None
    }
}
