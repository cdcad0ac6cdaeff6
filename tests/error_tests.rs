// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use plan_tracker::error::AppError;

mod common;
use common::body_json;

#[tokio::test]
async fn test_error_body_carries_code_and_details() {
    let response = AppError::NotFound("plan not found".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "plan not found");
}

#[tokio::test]
async fn test_auth_errors_omit_details() {
    let response = AppError::SessionExpired.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "session_expired");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_internal_errors_hidden() {
    let response = AppError::Internal(anyhow::anyhow!("secret stack detail")).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
    assert!(!body.to_string().contains("secret stack detail"));
}

#[test]
fn test_validation_errors_become_bad_request() {
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1))]
        title: String,
    }

    let err: AppError = Form {
        title: String::new(),
    }
    .validate()
    .unwrap_err()
    .into();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.code(), "bad_request");
}
