// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

/// Cookie that may carry the access token instead of the Authorization header.
pub const ACCESS_TOKEN_COOKIE: &str = "planny_token";

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    /// ID of the access token that authenticated this request
    pub token_id: Uuid,
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        bearer_token(auth_header)
            .ok_or(AppError::Unauthorized)?
            .to_string()
    };

    let payload = state.tokens.verify(&token)?;

    request.extensions_mut().insert(AuthUser {
        user_id: payload.user_id,
        username: payload.username,
        token_id: payload.id,
    });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let mut fields = value.split_whitespace();
    let scheme = fields.next()?;
    let token = fields.next()?;

    if !scheme.eq_ignore_ascii_case("bearer") || fields.next().is_some() {
        return None;
    }

    Some(token)
}
