// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plan-Tracker: personal planning backend
//!
//! This crate provides the backend API for user accounts, login sessions with
//! access/refresh tokens, and per-user plans that must not overlap in time.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Store;
use services::{AuthService, JwtCodec, PlanService, TokenCodec, TokenError};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<dyn TokenCodec>,
    pub auth_service: AuthService,
    pub plan_service: PlanService,
}

impl AppState {
    /// Wire the services around `store` with an HMAC token codec.
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let tokens: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(&config.token_symmetric_key)?);

        let auth_service = AuthService::new(
            store.clone(),
            tokens.clone(),
            config.access_token_duration,
            config.refresh_token_duration,
        );
        let plan_service = PlanService::new(store);

        Ok(Self {
            config,
            tokens,
            auth_service,
            plan_service,
        })
    }
}
