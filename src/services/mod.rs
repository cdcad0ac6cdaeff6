// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod overlap;
pub mod password;
pub mod plans;
pub mod token;

pub use auth::{AuthService, Credentials, LoginAttempt, LoginOutcome, Registration};
pub use plans::PlanService;
pub use token::{JwtCodec, TokenCodec, TokenError, TokenPayload};
