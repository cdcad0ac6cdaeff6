// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and access-token renewal.
//!
//! Handles:
//! - Account creation with hashed passwords
//! - Login by username or email, issuing an access/refresh token pair
//! - Renewal of access tokens against the stored refresh session

use crate::db::Store;
use crate::error::AppError;
use crate::models::{NewSession, NewUser, Session, User};
use crate::services::password;
use crate::services::token::{TokenCodec, TokenPayload};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Input for login. Exactly one of `username`/`email` is normally set;
/// if both are, the username is used.
#[derive(Debug, Clone, Default)]
pub struct LoginAttempt {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub user_agent: String,
    pub client_ip: String,
}

/// Token pair handed to the client after login or renewal.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Credentials {
    pub session_id: Uuid,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub credentials: Credentials,
}

/// Authentication flow over a store and a token codec.
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: Arc<dyn TokenCodec>,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<dyn TokenCodec>,
        access_token_duration: Duration,
        refresh_token_duration: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            access_token_duration,
            refresh_token_duration,
        }
    }

    /// Create a new account.
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let Registration {
            username,
            email,
            first_name,
            last_name,
            password,
        } = registration;

        // Hash on the blocking pool
        let hashed_password =
            tokio::task::spawn_blocking(move || password::hash_password(&password))
                .await
                .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;

        let user = self
            .store
            .create_user(NewUser {
                username,
                email: email.to_lowercase(),
                first_name,
                last_name,
                hashed_password,
            })
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::DuplicateIdentity) {
                    tracing::info!("Registration rejected: username or email taken");
                }
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a new refresh session.
    pub async fn login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AppError> {
        let username = attempt.username.filter(|u| !u.is_empty());
        let email = attempt.email.filter(|e| !e.is_empty());

        let user = match (username, email) {
            (Some(username), _) => self.store.get_user_by_username(&username).await?,
            (None, Some(email)) => {
                self.store
                    .get_user_by_email(&email.to_lowercase())
                    .await?
            }
            (None, None) => {
                return Err(AppError::BadRequest(
                    "username or email is required".to_string(),
                ))
            }
        }
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        let password = attempt.password;
        let hashed = user.hashed_password.clone();
        let matches =
            tokio::task::spawn_blocking(move || password::verify_password(&password, &hashed))
                .await
                .map_err(|e| anyhow::anyhow!("password check task failed: {e}"))?;
        if !matches {
            tracing::warn!(user_id = %user.id, "Login failed: incorrect password");
            return Err(AppError::IncorrectPassword);
        }

        let (access_token, access_payload) =
            self.tokens
                .generate(user.id, &user.username, self.access_token_duration)?;
        let (refresh_token, refresh_payload) =
            self.tokens
                .generate(user.id, &user.username, self.refresh_token_duration)?;

        let session = self
            .store
            .create_session(NewSession {
                id: refresh_payload.id,
                user_id: refresh_payload.user_id,
                username: refresh_payload.username.clone(),
                refresh_token: refresh_token.clone(),
                user_agent: attempt.user_agent,
                client_ip: attempt.client_ip,
                expires_at: refresh_payload.expires_at,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.id,
            client_ip = %session.client_ip,
            "Login successful, session created"
        );

        Ok(LoginOutcome {
            user,
            credentials: Credentials {
                session_id: session.id,
                access_token,
                expires_at: access_payload.expires_at,
                refresh_token,
                refresh_token_expires_at: refresh_payload.expires_at,
            },
        })
    }

    /// Issue a new access token for a still-valid refresh session.
    ///
    /// The refresh token and its session are returned unchanged.
    pub async fn renew_access(&self, refresh_token: &str) -> Result<Credentials, AppError> {
        // Reject forged or expired tokens before touching storage
        let refresh_payload = self.tokens.verify(refresh_token)?;

        let session = self
            .store
            .get_session_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| AppError::NotFound("session not found".to_string()))?;

        check_session(&session, &refresh_payload, refresh_token, Utc::now()).inspect_err(|e| {
            tracing::warn!(
                session_id = %session.id,
                reason = e.code(),
                "Access renewal rejected"
            );
        })?;

        let (access_token, access_payload) = self.tokens.generate(
            refresh_payload.user_id,
            &refresh_payload.username,
            self.access_token_duration,
        )?;

        tracing::debug!(session_id = %session.id, "Access token renewed");

        Ok(Credentials {
            session_id: session.id,
            access_token,
            expires_at: access_payload.expires_at,
            refresh_token: refresh_token.to_string(),
            refresh_token_expires_at: refresh_payload.expires_at,
        })
    }
}

/// Consistency checks between a stored session and the refresh token presented
/// for it, applied in a fixed order.
pub fn check_session(
    session: &Session,
    payload: &TokenPayload,
    presented_token: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if session.username != payload.username {
        return Err(AppError::SessionMismatch);
    }

    let same_token: bool = session
        .refresh_token
        .as_bytes()
        .ct_eq(presented_token.as_bytes())
        .into();
    if !same_token {
        return Err(AppError::TokenMismatch);
    }

    if now > session.expires_at {
        return Err(AppError::SessionExpired);
    }

    Ok(())
}
