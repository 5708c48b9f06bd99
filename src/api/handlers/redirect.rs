//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Reject malformed codes without touching the store
/// 2. Resolve through the engine (cache first, store on miss)
/// 3. Return `302 Found` with framing, sniffing and referrer protection headers
///
/// # Errors
///
/// Returns 400 Bad Request if the code is malformed.
/// Returns 404 Not Found if the code is unknown, inactive or expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&code).await?;

    let location = HeaderValue::try_from(long_url.as_str())
        .map_err(|e| AppError::Internal(format!("Stored URL is not a valid header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, location);
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    Ok((StatusCode::FOUND, headers))
}
