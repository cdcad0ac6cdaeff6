// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod plan;
pub mod session;
pub mod user;

pub use plan::{NewPlan, Plan, PlanChanges, PlanStatus};
pub use session::{NewSession, Session};
pub use user::{NewUser, User};
