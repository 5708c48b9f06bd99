//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use crate::api::dto::shorten::{ShortenQuery, ShortenRequest, ShortenResponse};
use crate::application::services::ShortenOptions;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::ClientIp;

/// Creates a short link, or returns the existing one for the same URL.
///
/// # Endpoint
///
/// `POST /shorten[?alias=NAME]`
///
/// # Request Body
///
/// ```json
/// { "longUrl": "example.com/a", "expiresIn": 86400 }
/// ```
///
/// # Response
///
/// `201 Created` for a new link, `200 OK` when an active link for the same
/// URL already existed.
///
/// ```json
/// {
///   "success": true,
///   "shortUrl": "http://localhost:3000/Ab3xK9p",
///   "shortCode": "Ab3xK9p",
///   "longUrl": "https://example.com/a",
///   "expiresIn": 86400,
///   "expiresAt": "2026-01-02T00:00:00Z",
///   "customAlias": false
/// }
/// ```
///
/// # Errors
///
/// - 400 for an invalid body, URL or alias, or a reserved alias
/// - 403 for a URL matching the malicious denylist
/// - 409 if the alias is taken
/// - 503 if no free code could be found or the store is unavailable
pub async fn shorten_handler(
    State(state): State<AppState>,
    ClientIp(creator_ip): ClientIp,
    Query(query): Query<ShortenQuery>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let options = ShortenOptions {
        expires_in: payload.expires_in,
        creator_ip,
        custom_alias: query.alias(),
    };

    let shortened = state
        .link_service
        .shorten(&payload.long_url, options)
        .await?;

    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let expires_in = if shortened.created {
        payload.expires_in.and_then(|secs| i64::try_from(secs).ok())
    } else {
        shortened.record.remaining_ttl_at(Utc::now())
    };

    let short_url = state.short_url(&shortened.record.short_code);
    let response = ShortenResponse::from_record(shortened.record, short_url, expires_in);

    Ok((status, Json(response)))
}
