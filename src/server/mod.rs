//! HTTP server for rendered content

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::helpers::decode_path;
use crate::view::{ContentView, PageResponse};
use crate::Site;

/// Router that answers every path through the content view
pub fn router(view: Arc<ContentView>) -> Router {
    Router::new()
        .fallback(fallback_handler)
        .with_state(view)
        .layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(site: Site, ip: &str, port: u16) -> Result<()> {
    let view = Arc::new(ContentView::new(site)?);
    let app = router(view);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Render the requested path, mapping lookup failures to 404
async fn fallback_handler(
    State(view): State<Arc<ContentView>>,
    request: Request<Body>,
) -> Response {
    let path = decode_path(request.uri().path());

    // markdown and template rendering touch the filesystem
    let render_view = Arc::clone(&view);
    let render_path = path.clone();
    let result = tokio::task::spawn_blocking(move || render_view.respond(&render_path)).await;

    match result {
        Ok(Ok(page)) => page_response(page),
        Ok(Err(e)) if e.is_not_found() => {
            tracing::debug!("Not found: {}", path);
            not_found(&view, &path)
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to render {}: {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
        Err(e) => {
            tracing::error!("Render task failed for {}: {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn page_response(page: PageResponse) -> Response {
    let mut response = Html(page.body).into_response();

    if let Some(cache) = page.cache {
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&cache.cache_control()) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        if let Ok(value) = HeaderValue::from_str(&cache.expires()) {
            headers.insert(header::EXPIRES, value);
        }
    }

    response
}

/// The site's 404 page when it has one
fn not_found(view: &ContentView, path: &str) -> Response {
    match view.render_not_found(path) {
        Ok(Some(body)) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to render 404 page: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}
