// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the repository operations for:
//! - Users (profiles and password hashes)
//! - Sessions (refresh token records)
//! - Plans (per-user time-bounded plans)

use super::{collections, PlanRepository, SessionRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewPlan, NewSession, NewUser, Plan, PlanChanges, Session, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Index document reserving a username or email for one user.
#[derive(Debug, Serialize, Deserialize)]
struct IdentityClaim {
    user_id: Uuid,
}

/// Document ID for an identity claim.
///
/// Encoded so `/` cannot split the path, and prefixed so `.`, `..` and
/// `__name__` keys are still valid IDs.
fn claim_doc_id(key: &str) -> String {
    format!("id_{}", urlencoding::encode(key))
}

/// Whether a commit failed because a must-not-exist document was present.
fn is_already_exists(err: &FirestoreError) -> bool {
    match err {
        FirestoreError::DataConflictError(_) => true,
        FirestoreError::DatabaseError(e) => e.public.code == "FailedPrecondition",
        _ => false,
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// First user whose `field` equals `value`.
    async fn find_user_by(&self, field: &str, value: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserRepository for FirestoreDb {
    /// Create a user, claiming its username and email atomically.
    ///
    /// The user document and one index document per unique field are written
    /// in a single transaction, each with a must-not-exist precondition. A
    /// concurrent registration for the same username or email fails at commit.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let client = self.get_client()?;

        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email.to_lowercase(),
            first_name: user.first_name,
            last_name: user.last_name,
            hashed_password: user.hashed_password,
            created_at: now,
            updated_at: now,
        };
        let claim = IdentityClaim { user_id: user.id };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (collection, key) in [
            (collections::USERNAMES, user.username.as_str()),
            (collections::USER_EMAILS, user.email.as_str()),
        ] {
            client
                .fluent()
                .update()
                .in_col(collection)
                .precondition(FirestoreWritePrecondition::Exists(false))
                .document_id(claim_doc_id(key))
                .object(&claim)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add claim to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(user.id.to_string())
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction.commit().await.map_err(|e| {
            if is_already_exists(&e) {
                AppError::DuplicateIdentity
            } else {
                AppError::Database(format!("Transaction commit failed: {}", e))
            }
        })?;

        tracing::debug!(user_id = %user.id, "User document created");
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_user_by("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_user_by("email", &email.to_lowercase()).await
    }
}

// ─── Session Operations ──────────────────────────────────────

#[async_trait]
impl SessionRepository for FirestoreDb {
    async fn create_session(&self, session: NewSession) -> Result<Session, AppError> {
        let now = chrono::Utc::now();
        let session = Session {
            id: session.id,
            user_id: session.user_id,
            username: session.username,
            refresh_token: session.refresh_token,
            user_agent: session.user_agent,
            client_ip: session.client_ip,
            expires_at: session.expires_at,
            created_at: now,
            updated_at: now,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(session.id.to_string())
            .object(&session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(session)
    }

    async fn get_session_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AppError> {
        let sessions: Vec<Session> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(|q| q.for_all([q.field("refresh_token").eq(refresh_token)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(sessions.into_iter().next())
    }
}

// ─── Plan Operations ─────────────────────────────────────────

#[async_trait]
impl PlanRepository for FirestoreDb {
    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError> {
        let now = chrono::Utc::now();
        let plan = Plan {
            id: Uuid::new_v4(),
            title: plan.title,
            description: plan.description,
            start_date: plan.start_date,
            end_date: plan.end_date,
            status: plan.status,
            user_id: plan.user_id,
            created_at: now,
            updated_at: now,
        };

        self.set_plan(&plan).await?;
        Ok(plan)
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLANS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_plans_for_user(&self, user_id: Uuid) -> Result<Vec<Plan>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PLANS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id.as_str())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> Result<Option<Plan>, AppError> {
        let Some(mut plan) = self.get_plan(id).await? else {
            return Ok(None);
        };

        changes.apply(&mut plan, chrono::Utc::now());
        self.set_plan(&plan).await?;
        Ok(Some(plan))
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool, AppError> {
        if self.get_plan(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PLANS)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }
}

impl FirestoreDb {
    async fn set_plan(&self, plan: &Plan) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLANS)
            .document_id(plan.id.to_string())
            .object(plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
