//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;
use crate::web::tokens::TokenError;

/// Pulls the credential out of an `Authorization` header value. The scheme
/// is matched case-insensitively.
fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, credential) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("Bearer") {
        Some(credential)
    } else {
        None
    }
}

/// Middleware that validates the bearer access token and extracts the user id.
///
/// If valid, inserts the user id into request extensions for handlers to use.
/// If invalid or missing, returns 401 with a message distinguishing an
/// expired token from an invalid one.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // 1. Extract the bearer credential from the Authorization header. A
    // missing or malformed header is reported as an invalid token.
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid token".to_string()))?;

    // 2. Verify the signature and expiry, resolving to a subject id.
    let user_id = state.tokens.verify_access(token).map_err(|e| {
        warn!("Access token rejected: {:?}", e);
        let message = match e {
            TokenError::Expired => "Token expired",
            TokenError::Invalid => "Invalid token",
        };
        (StatusCode::UNAUTHORIZED, message.to_string())
    })?;

    // 3. Insert the user id into request extensions.
    req.extensions_mut().insert(user_id);

    // 4. Continue to the handler.
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("BEARER abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        assert_eq!(extract_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(extract_bearer("Bearerabc"), None);
        assert_eq!(extract_bearer(""), None);
    }
}
