// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes: register, login, renew access.

use axum::{
    extract::{connect_info::ConnectInfo, rejection::JsonRejection, State},
    http::{header, Extensions, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::{Credentials, LoginAttempt, Registration};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/renew_access", post(renew_access))
}

// ─── Responses ───────────────────────────────────────────────

/// Public view of a user.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub credentials: Credentials,
    pub user: UserResponse,
}

// ─── Register ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 32))]
    first_name: String,
    #[validate(length(min = 1, max = 32))]
    last_name: String,
    #[validate(length(min = 6, max = 32))]
    password: String,
}

/// Create an account.
async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let Json(req) = payload.map_err(bad_json)?;
    req.validate()?;

    let user = state
        .auth_service
        .register(Registration {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "empty_as_none")]
    username: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email)]
    email: Option<String>,
    #[validate(length(min = 1))]
    password: String,
}

/// Log in with username or email and open a refresh session.
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = payload.map_err(bad_json)?;
    req.validate()?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let outcome = state
        .auth_service
        .login(LoginAttempt {
            username: req.username,
            email: req.email,
            password: req.password,
            user_agent,
            client_ip: client_ip(&headers, peer),
        })
        .await?;

    Ok(Json(LoginResponse {
        credentials: outcome.credentials,
        user: outcome.user.into(),
    }))
}

// ─── Renew Access ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RenewAccessRequest {
    #[validate(length(min = 1))]
    refresh_token: String,
}

/// Exchange a refresh token for a new access token.
async fn renew_access(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RenewAccessRequest>, JsonRejection>,
) -> Result<Json<Credentials>> {
    let Json(req) = payload.map_err(bad_json)?;
    req.validate()?;

    let credentials = state.auth_service.renew_access(&req.refresh_token).await?;
    Ok(Json(credentials))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Treat `""` like a missing field.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

pub(crate) fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Best-effort client address: proxy headers first, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}
