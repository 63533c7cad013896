//! Handlers for reading and queueing word images.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};
use validator::Validate;

use crate::api::dto::images::{EnqueueRequest, EnqueueResponse, PendingResponse};
use crate::domain::entities::{CacheEntry, ImageResult, sources};
use crate::error::AppError;
use crate::state::AppState;

const CACHE_CONTROL_SUCCESS: &str = "public, max-age=86400";

/// Serves the cached image for a word.
///
/// # Endpoint
///
/// `GET /api/images/{word}`
///
/// # Response Codes
///
/// - **200 OK**: JPEG body, attribution in `X-Image-*` headers
/// - **202 Accepted**: Not cached yet; the word was queued with priority
/// - **404 Not Found**: No suitable image was found for this word
/// - **503 Service Unavailable**: Backing store unreachable
///
/// A failure outside its retry window is queued again before the 404 is
/// returned, so a later request can succeed.
pub async fn get_image_handler(
    Path(word): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let cache = state.pipeline.cache();

    match cache.get(&word).await? {
        Some(entry) => {
            let stale = cache.is_retry_eligible(&entry);
            match entry {
                CacheEntry::Success { image, .. } => {
                    debug!(word = %word, "Image cache hit");
                    Ok(image_response(image))
                }
                CacheEntry::Failure {
                    reason, failed_at, ..
                } => {
                    if stale
                        && let Err(e) = state
                            .pipeline
                            .queue()
                            .enqueue(&word, None, sources::PRIORITY, true)
                            .await
                    {
                        warn!(word = %word, error = %e, "Failed to requeue stale failure");
                    }

                    Err(AppError::not_found(
                        "No image available",
                        json!({"word": word, "reason": reason, "failed_at": failed_at}),
                    ))
                }
            }
        }
        None => {
            debug!(word = %word, "Image cache miss, queueing with priority");
            state
                .pipeline
                .queue()
                .enqueue(&word, None, sources::PRIORITY, true)
                .await?;

            Ok((StatusCode::ACCEPTED, Json(PendingResponse::new(word))).into_response())
        }
    }
}

fn image_response(image: ImageResult) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&image.content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_SUCCESS),
    );

    let attribution = [
        ("x-image-query", Some(image.search_query.as_str())),
        ("x-image-photo-id", image.photo_id.as_deref()),
        ("x-image-photographer", image.photographer.as_deref()),
        ("x-image-description", image.description.as_deref()),
    ];
    for (name, value) in attribution {
        // Provider text may contain control characters; such headers are dropped.
        if let Some(value) = value
            && let Ok(value) = HeaderValue::from_bytes(value.as_bytes())
        {
            headers.insert(HeaderName::from_static(name), value);
        }
    }

    (StatusCode::OK, headers, image.image_data).into_response()
}

/// Queues a word for background image acquisition.
///
/// # Endpoint
///
/// `POST /api/images/enqueue`
///
/// # Request Body
///
/// ```json
/// {
///   "word": "pas",
///   "translation": "dog",   // optional
///   "source": "lesson-12",  // optional, defaults to "api"
///   "priority": false       // optional
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "word": "pas", "outcome": "enqueued" }
/// ```
///
/// `outcome` is `duplicate` when the word is already cached or queued.
///
/// # Errors
///
/// - **400 Bad Request**: Validation failed or the word is blank
/// - **503 Service Unavailable**: Backing store unreachable
pub async fn enqueue_handler(
    State(state): State<AppState>,
    Json(payload): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>, AppError> {
    payload.validate()?;

    let source = payload.source.as_deref().unwrap_or(sources::API);
    let outcome = state
        .pipeline
        .queue()
        .enqueue(
            &payload.word,
            payload.translation.as_deref(),
            source,
            payload.priority,
        )
        .await?;

    Ok(Json(EnqueueResponse {
        word: payload.word,
        outcome,
    }))
}
