//! HTTP driver for the watermark compositor.
//!
//! Exposes a single processing route plus a health check:
//!
//! - `POST /process-image` - multipart upload (`file` required; `text`,
//!   `position`, `opacity`, `size`, `rotation`, `color` optional with
//!   defaults). Returns `{"image": "data:image/png;base64,..."}` on
//!   success, `{"error": "..."}` with a 4xx/5xx status on failure.
//! - `GET /health` - liveness probe.
//!
//! CORS is fully permissive: the endpoint is meant to be called straight
//! from browser frontends.

use crate::watermark::config::{parse_font_scale, parse_opacity, parse_rotation};
use crate::watermark::{codec, composite, parse_hex_color, WatermarkConfig, WatermarkError};
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Uploads larger than this are rejected before processing.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router.
///
/// Public so handler tests can drive it with `tower::ServiceExt::oneshot`
/// without binding a socket.
pub fn router() -> Router {
    Router::new()
        .route("/process-image", post(process_image))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(address: &str, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", address, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    tracing::info!(address = %listener.local_addr()?, "Watermark server listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Handle one watermarking request.
///
/// All failures become structured JSON errors; the process never crashes
/// on malformed input.
async fn process_image(mut multipart: Multipart) -> Response {
    match handle_upload(&mut multipart).await {
        Ok(data_url) => (StatusCode::OK, Json(json!({ "image": data_url }))).into_response(),
        Err(err) => {
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            tracing::warn!(error = %err, status = %status, "Watermark request failed");
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

/// Collect the multipart fields, validate parameters, and composite.
///
/// Parameter validation happens while draining the form, so a malformed
/// opacity or color is rejected before the image is decoded.
async fn handle_upload(multipart: &mut Multipart) -> Result<String, WatermarkError> {
    let mut file: Option<Bytes> = None;
    let mut config = WatermarkConfig::default();

    while let Some(field) = next_field(multipart).await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                file = Some(field.bytes().await.map_err(|e| {
                    WatermarkError::invalid_param("file", format!("failed to read upload: {}", e))
                })?);
            }
            "text" => config.text = field_text(field, "text").await?,
            "position" => config.anchor = field_text(field, "position").await?.parse()?,
            "opacity" => config.opacity = parse_opacity(&field_text(field, "opacity").await?)?,
            "size" => config.font_scale = parse_font_scale(&field_text(field, "size").await?)?,
            "rotation" => {
                config.rotation_degrees = parse_rotation(&field_text(field, "rotation").await?)?;
            }
            "color" => config.color = parse_hex_color(&field_text(field, "color").await?)?,
            // Unknown fields are ignored
            _ => {}
        }
    }

    let bytes = file.ok_or_else(|| WatermarkError::invalid_param("file", "no file uploaded"))?;

    let source =
        image::load_from_memory(&bytes).map_err(|e| WatermarkError::DecodeError(e.to_string()))?;

    tracing::debug!(
        width = source.width(),
        height = source.height(),
        text = %config.text,
        position = config.anchor.as_str(),
        "Compositing watermark"
    );

    let result = composite(&source, &config)?;
    codec::to_png_data_url(&result)
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, WatermarkError> {
    multipart
        .next_field()
        .await
        .map_err(|e| WatermarkError::invalid_param("multipart", e.to_string()))
}

async fn field_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, WatermarkError> {
    field.text().await.map_err(|e| {
        WatermarkError::invalid_param(name, format!("failed to read field: {}", e))
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
