//! Storage layer.
//!
//! Services depend on the repository traits only; [`MemoryStore`] and
//! [`FirestoreDb`] are the two implementations.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{NewPlan, NewSession, NewUser, Plan, PlanChanges, Session, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Username claims, one document per taken username
    pub const USERNAMES: &str = "usernames";
    /// Email claims, keyed by lowercased email
    pub const USER_EMAILS: &str = "user_emails";
    pub const SESSIONS: &str = "sessions";
    pub const PLANS: &str = "plans";
}

/// User persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user; fails with [`AppError::DuplicateIdentity`] if the
    /// username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Refresh session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: NewSession) -> Result<Session, AppError>;

    /// Look up a session by the literal refresh token string.
    async fn get_session_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AppError>;
}

/// Plan persistence.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, AppError>;

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, AppError>;

    /// All plans owned by `user_id`, in no particular order.
    async fn list_plans_for_user(&self, user_id: Uuid) -> Result<Vec<Plan>, AppError>;

    /// Apply `changes`; `None` if the plan does not exist.
    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> Result<Option<Plan>, AppError>;

    /// Delete a plan; `false` if it did not exist.
    async fn delete_plan(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Full storage backend.
pub trait Store: UserRepository + SessionRepository + PlanRepository {}

impl<T> Store for T where T: UserRepository + SessionRepository + PlanRepository {}
