// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Plan progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PlanStatus {
    Done,
    InProgress,
    Cancelled,
}

/// Time-bounded plan owned by a single user.
///
/// The interval is half-open: `[start_date, end_date)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID (also used as document ID)
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PlanStatus,
    /// Owner
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a plan.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PlanStatus,
    pub user_id: Uuid,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<PlanStatus>,
}

impl PlanChanges {
    /// Interval the plan would have after applying these changes.
    pub fn merged_interval(&self, plan: &Plan) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_date.unwrap_or(plan.start_date),
            self.end_date.unwrap_or(plan.end_date),
        )
    }

    /// Apply the changes to `plan`, stamping `updated_at`.
    pub fn apply(self, plan: &mut Plan, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            plan.title = title;
        }
        if let Some(description) = self.description {
            plan.description = description;
        }
        if let Some(start_date) = self.start_date {
            plan.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            plan.end_date = end_date;
        }
        if let Some(status) = self.status {
            plan.status = status;
        }
        plan.updated_at = now;
    }
}
