// ==============================================================================
// main.rs - VEP REST Gateway Entry Point
// ==============================================================================
// Description: Axum web server exposing the variant annotator over HTTP
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use vep_annotator::logging;

mod handlers;
mod models;
mod state;

use state::AppState;

const DEFAULT_PORT: u16 = 5005;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    logging::init("vep_rest=info,vep_annotator=info,tower_http=info");

    info!("Starting VEP REST Gateway v{}", env!("CARGO_PKG_VERSION"));

    let server_port = match std::env::var("VEP_REST_PORT") {
        Ok(port) => port
            .trim()
            .parse::<u16>()
            .with_context(|| format!("Invalid VEP_REST_PORT: {:?}", port))?,
        Err(_) => DEFAULT_PORT,
    };

    // Initialize application state
    let state = AppState::new().context("Failed to initialize application state")?;

    let app = build_router(state);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    // The query string is read regardless of path
    let mut router = Router::new()
        .route("/", get(handlers::annotate))
        .route("/{*path}", get(handlers::annotate));

    // CORS only when origins are configured
    if let Some(cors) = cors_layer() {
        router = router.layer(cors);
    }

    router
        // Request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS from CORS_ALLOWED_ORIGINS (comma-separated); none when unset
fn cors_layer() -> Option<CorsLayer> {
    let origins = std::env::var("CORS_ALLOWED_ORIGINS").ok()?;
    let allowed_origins: Vec<_> = origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if allowed_origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed_origins))
            .allow_credentials(false)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::ACCEPT])
            .expose_headers([header::CONTENT_TYPE]),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tower::ServiceExt;
    use vep_annotator::AnnotatorConfig;

    fn test_app(program: &Path, tmp_dir: &Path) -> Router {
        let state = AppState::with_config(AnnotatorConfig {
            program: program.to_path_buf(),
            data_dir: PathBuf::from("/opt/vep/.vep"),
            tmp_dir: tmp_dir.to_path_buf(),
            timeout: Duration::from_secs(10),
        });
        build_router(state)
    }

    /// Sends a GET request and returns (status, content type, json)
    async fn get_json(app: &Router, uri: &str) -> (StatusCode, String, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_missing_q_is_404_with_error() {
        let scratch = tempfile::tempdir().unwrap();
        let app = test_app(Path::new("/nonexistent/vep"), scratch.path());

        let (status, content_type, body) = get_json(&app, "/?assembly=GRCh37").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, serde_json::json!({ "error": "param q must be given" }));
    }

    #[tokio::test]
    async fn test_malformed_token_names_token() {
        let scratch = tempfile::tempdir().unwrap();
        let app = test_app(Path::new("/nonexistent/vep"), scratch.path());

        let (status, _, body) = get_json(&app, "/?q=bad_token_only_three").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("bad_token_only_three"));
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_annotator_failure_is_404() {
        let scratch = tempfile::tempdir().unwrap();
        let app = test_app(Path::new("/nonexistent/vep"), scratch.path());

        let (status, _, body) = get_json(&app, "/?q=1_1000000_A_T").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("/nonexistent/vep"));
    }

    #[tokio::test]
    async fn test_non_get_is_rejected() {
        let scratch = tempfile::tempdir().unwrap();
        let app = test_app(Path::new("/nonexistent/vep"), scratch.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/?q=1_1000000_A_T")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[cfg(unix)]
    mod annotator {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Stand-in annotator: writes two records and echoes its argv into
        /// the first one
        const FAKE_VEP: &str = r#"#!/bin/sh
args="$*"
output=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output_file" ]; then output="$2"; fi
  shift
done
printf '{"rank":1,"args":"%s"}\n{"rank":2}\n' "$args" > "$output"
"#;

        fn install_fake(dir: &Path) -> PathBuf {
            let path = dir.join("fake_vep.sh");
            std::fs::write(&path, FAKE_VEP).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_success_returns_records_in_order() {
            let bin = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let app = test_app(&install_fake(bin.path()), scratch.path());

            let (status, content_type, body) = get_json(&app, "/?q=1_1000000_A_T").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type, "application/json");

            let records = body.as_array().unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0]["rank"], 1);
            assert_eq!(records[1]["rank"], 2);

            let args = records[0]["args"].as_str().unwrap();
            assert!(args.contains("--assembly GRCh38"));
            assert!(args.contains(
                "--fasta /opt/vep/.vep/Homo_sapiens.GRCh38.dna.primary_assembly.fa"
            ));
            assert!(!args.contains("--q "));

            assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
        }

        #[tokio::test]
        async fn test_any_path_and_overrides() {
            let bin = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let app = test_app(&install_fake(bin.path()), scratch.path());

            let (status, _, body) =
                get_json(&app, "/vep/annotate?q=1_1000_1000_A_T&assembly=GRCh37&sift=0").await;
            assert_eq!(status, StatusCode::OK);

            let args = body[0]["args"].as_str().unwrap();
            assert!(args.contains("--assembly GRCh37"));
            assert!(args.contains("Homo_sapiens.GRCh37.75.dna.primary_assembly.fa"));
            assert!(!args.contains("--sift"));
        }
    }
}
