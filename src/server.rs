use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

/// `/` is the presentation bundle's index page; every other path is looked
/// up under `static_dir`. There are no other routes.
pub(crate) fn router(static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn run(port: u16, static_dir: &Path) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not listen on {addr}"))?;
    info!("Victory Road is running on http://localhost:{port}");
    info!("Press Ctrl+C to stop the server");

    axum::serve(listener, router(static_dir))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::fs;
    use tower::ServiceExt;

    fn bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Victory Road</h1>").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/style.css"), "body{}").unwrap();
        dir
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn root_serves_the_index_page() {
        let dir = bundle();
        let (status, body) = get(router(dir.path()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Victory Road"));
    }

    #[tokio::test]
    async fn assets_come_from_the_static_dir() {
        let dir = bundle();
        let (status, body) = get(router(dir.path()), "/css/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body{}");
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let dir = bundle();
        let (status, _) = get(router(dir.path()), "/api/state").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
