//! HTTP surface
//!
//! Routes, edge validation, and error-to-status mapping:
//! - `/img/public/<path>` and `/img/gen/<path>` serve transformed images;
//!   any other path falls through to the router's 404 with no I/O
//! - malformed `w`/`h`/`fit` query parameters produce a 400 with a plain-text
//!   body naming the violated constraint, before the service is invoked
//! - fetch/transform/cache failures map to an empty 500; internal detail
//!   stays in the logs, never in the response body
//!
//! Panics in a handler are converted to 500 by the catch-panic layer so a
//! single bad request can never take the process down.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use imgd_core::cache::{parse_dimension, FitMode, ImageClass, TransformKey};
use imgd_core::errors::{ImgdError, ValidationError};
use imgd_core::service::{TransformService, TransformedImage};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Raw query parameters
///
/// Kept as strings so parsing stays in our hands and a malformed value turns
/// into a 400 with a descriptive body rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TransformParams {
    w: Option<String>,
    h: Option<String>,
    fit: Option<String>,
}

/// Build the application router
pub fn router(service: Arc<TransformService>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/img/public/*source_path", get(serve_public))
        .route("/img/gen/*source_path", get(serve_generated))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(service)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn serve_public(
    State(service): State<Arc<TransformService>>,
    Path(source_path): Path<String>,
    Query(params): Query<TransformParams>,
) -> Response {
    serve_image(service, ImageClass::Public, &source_path, &params).await
}

async fn serve_generated(
    State(service): State<Arc<TransformService>>,
    Path(source_path): Path<String>,
    Query(params): Query<TransformParams>,
) -> Response {
    serve_image(service, ImageClass::Generated, &source_path, &params).await
}

async fn serve_image(
    service: Arc<TransformService>,
    class: ImageClass,
    source_path: &str,
    params: &TransformParams,
) -> Response {
    // Fail fast: no filesystem or network I/O before validation passes
    let key = match build_key(class, source_path, params) {
        Ok(key) => key,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match service.get(&key).await {
        Ok(image) => image_response(image),
        Err(ImgdError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        Err(e) => {
            error!(cache_key = %key.file_name(), error = %e, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn build_key(
    class: ImageClass,
    source_path: &str,
    params: &TransformParams,
) -> Result<TransformKey, ValidationError> {
    let width = parse_dimension("w", params.w.as_deref())?;
    let height = parse_dimension("h", params.h.as_deref())?;
    let fit = FitMode::parse(params.fit.as_deref())?;
    TransformKey::new(class, source_path, width, height, fit)
}

fn image_response(image: TransformedImage) -> Response {
    let headers = [
        (header::CONTENT_TYPE, image.content_type.to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", image.cache_max_age),
        ),
        (SERVER_TIMING, image.timings.header_value()),
    ];
    (headers, image.bytes).into_response()
}
