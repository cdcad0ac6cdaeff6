// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login session backing a refresh token.
///
/// One record is written per successful login. The record is never updated;
/// renewing an access token reads it and leaves it untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Refresh token payload ID (also used as document ID)
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    /// Signed refresh token, stored verbatim for lookup
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    /// Authoritative end of the session
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub expires_at: DateTime<Utc>,
}
