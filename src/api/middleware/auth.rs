//! Admin bearer token middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Rejects requests whose `Authorization: Bearer <token>` does not match
/// `ADMIN_TOKEN`.
///
/// Failures return `401 Unauthorized` with `WWW-Authenticate: Bearer`
/// (RFC 6750). The missing-header and wrong-token cases share a status but
/// carry different `details.reason` values.
///
/// ```rust,ignore
/// let admin = Router::new()
///     .route("/images/status", get(status_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    st.auth_service.authenticate(&token)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
