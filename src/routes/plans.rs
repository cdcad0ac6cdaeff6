// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan CRUD routes for the authenticated user.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{NewPlan, Plan, PlanChanges, PlanStatus};
use crate::routes::auth::bad_json;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/{id}",
            get(get_plan).patch(update_plan).delete(delete_plan),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlanResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PlanStatus,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            title: plan.title,
            description: plan.description,
            start_date: plan.start_date,
            end_date: plan.end_date,
            status: plan.status,
            user_id: plan.user_id,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlansResponse {
    pub plans: Vec<PlanResponse>,
}

#[derive(Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: PlanStatus,
}

#[derive(Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 200))]
    title: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    status: Option<PlanStatus>,
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlanResponse>)> {
    let Json(req) = payload.map_err(bad_json)?;
    req.validate()?;

    let plan = state
        .plan_service
        .create_plan(NewPlan {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status,
            user_id: user.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(plan.into())))
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PlansResponse>> {
    let plans = state.plan_service.list_plans(user.user_id).await?;
    Ok(Json(PlansResponse {
        plans: plans.into_iter().map(PlanResponse::from).collect(),
    }))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanResponse>> {
    let plan = state.plan_service.get_plan(user.user_id, plan_id).await?;
    Ok(Json(plan.into()))
}

async fn update_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    payload: std::result::Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> Result<Json<PlanResponse>> {
    let Json(req) = payload.map_err(bad_json)?;
    req.validate()?;

    let changes = PlanChanges {
        title: req.title,
        description: req.description,
        start_date: req.start_date,
        end_date: req.end_date,
        status: req.status,
    };

    let plan = state
        .plan_service
        .update_plan(user.user_id, plan_id, changes)
        .await?;
    Ok(Json(plan.into()))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.plan_service.delete_plan(user.user_id, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
