use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::api::AppState;
use crate::error::AppError;
use crate::session::{read_cookie, AdminSession, SESSION_COOKIE};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Resolves the bearer token through the auth provider and stores the
/// resulting `AuthUser` in the request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let user = state.auth.authenticate(&token).await?.ok_or_else(|| {
        tracing::debug!("Access token rejected by auth provider");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = read_cookie(request.headers(), SESSION_COOKIE);

    match state.admin.session(token, Utc::now()) {
        AdminSession::Authenticated { expires_at } => {
            tracing::debug!("Admin session valid until {}", expires_at);
            Ok(next.run(request).await)
        }
        AdminSession::Unauthenticated => Err(AppError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
