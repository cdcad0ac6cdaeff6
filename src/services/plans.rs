// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan management with scheduling-conflict checks.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{NewPlan, Plan, PlanChanges};
use crate::services::overlap::overlaps;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-user locks serializing plan writes.
pub type PlanLocks = Arc<DashMap<Uuid, Arc<Mutex<()>>>>;

/// Plan CRUD scoped to the owning user.
///
/// Creates and updates for one user run one at a time within this process, so
/// the overlap check and the write that follows it cannot interleave with
/// another write for the same user. Separate server instances do not share
/// these locks.
pub struct PlanService {
    store: Arc<dyn Store>,
    write_locks: PlanLocks,
}

impl PlanService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_locks: Arc::new(DashMap::new()),
        }
    }

    /// Create a plan unless it overlaps one of the user's existing plans.
    pub async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError> {
        validate_interval(plan.start_date, plan.end_date)?;

        let user_id = plan.user_id;
        self.serialized(user_id, async {
            if self
                .has_conflict(plan.user_id, plan.start_date, plan.end_date, None)
                .await?
            {
                tracing::info!(user_id = %plan.user_id, "Plan rejected: date overlap");
                return Err(AppError::PlanOverlap);
            }

            let plan = self.store.create_plan(plan).await?;
            tracing::info!(user_id = %plan.user_id, plan_id = %plan.id, "Plan created");
            Ok(plan)
        })
        .await
    }

    /// All of the user's plans, earliest first.
    pub async fn list_plans(&self, user_id: Uuid) -> Result<Vec<Plan>, AppError> {
        let mut plans = self.store.list_plans_for_user(user_id).await?;
        plans.sort_by_key(|p| (p.start_date, p.end_date));
        Ok(plans)
    }

    /// Fetch one plan owned by `user_id`.
    pub async fn get_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<Plan, AppError> {
        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("plan not found".to_string()))?;

        if plan.user_id != user_id {
            return Err(AppError::Forbidden(
                "plan does not belong to user".to_string(),
            ));
        }

        Ok(plan)
    }

    /// Apply a partial update.
    ///
    /// The plan being updated is left out of the overlap scan, so moving or
    /// shrinking a plan within its own slot is allowed.
    pub async fn update_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        changes: PlanChanges,
    ) -> Result<Plan, AppError> {
        self.serialized(user_id, async {
            let current = self.get_plan(user_id, plan_id).await?;
            let (start, end) = changes.merged_interval(&current);
            validate_interval(start, end)?;

            if self.has_conflict(user_id, start, end, Some(plan_id)).await? {
                tracing::info!(%user_id, %plan_id, "Plan update rejected: date overlap");
                return Err(AppError::PlanOverlap);
            }

            let plan = self
                .store
                .update_plan(plan_id, changes)
                .await?
                .ok_or_else(|| AppError::NotFound("plan not found".to_string()))?;

            tracing::info!(%user_id, %plan_id, "Plan updated");
            Ok(plan)
        })
        .await
    }

    /// Delete a plan owned by `user_id`.
    pub async fn delete_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<(), AppError> {
        self.serialized(user_id, async {
            self.get_plan(user_id, plan_id).await?;

            if !self.store.delete_plan(plan_id).await? {
                return Err(AppError::NotFound("plan not found".to_string()));
            }

            tracing::info!(%user_id, %plan_id, "Plan deleted");
            Ok(())
        })
        .await
    }

    async fn has_conflict(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let mut existing = self.store.list_plans_for_user(user_id).await?;
        if let Some(exclude) = exclude {
            existing.retain(|p| p.id != exclude);
        }
        Ok(overlaps(&existing, start, end))
    }

    /// Run `write` while holding the user's write lock.
    ///
    /// The lock entry is dropped afterwards unless another write for the same
    /// user is holding or waiting on it, so the table only tracks active users.
    async fn serialized<T>(
        &self,
        user_id: Uuid,
        write: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let lock = self
            .write_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            write.await
        };

        drop(lock);
        self.write_locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.write_locks.len()
    }
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::BadRequest(
            "end_date must be after start_date".to_string(),
        ));
    }
    Ok(())
}
