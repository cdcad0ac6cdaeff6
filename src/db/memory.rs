// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent hash maps.
//!
//! Used for local development (no `GCP_PROJECT_ID`) and tests. Unique indexes
//! are claimed through the `DashMap` entry API so two concurrent registrations
//! cannot both take the same username or email.

use super::{PlanRepository, SessionRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewPlan, NewSession, NewUser, Plan, PlanChanges, Session, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    users_by_username: DashMap<String, Uuid>,
    users_by_email: DashMap<String, Uuid>,
    sessions: DashMap<Uuid, Session>,
    sessions_by_token: DashMap<String, Uuid>,
    plans: DashMap<Uuid, Plan>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4();

        match self.users_by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(AppError::DuplicateIdentity),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.users_by_email.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => {
                // Release the username claimed above
                self.users_by_username.remove(&user.username);
                return Err(AppError::DuplicateIdentity);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = chrono::Utc::now();
        let user = User {
            id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            hashed_password: user.hashed_password,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.users_by_username.get(username).map(|id| *id) else {
            return Ok(None);
        };
        self.get_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self
            .users_by_email
            .get(&email.to_lowercase())
            .map(|id| *id)
        else {
            return Ok(None);
        };
        self.get_user_by_id(id).await
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, session: NewSession) -> Result<Session, AppError> {
        if self.sessions.contains_key(&session.id) {
            return Err(AppError::Database(format!(
                "session {} already exists",
                session.id
            )));
        }

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

        self.sessions_by_token
            .insert(session.refresh_token.clone(), session.id);
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AppError> {
        let Some(id) = self.sessions_by_token.get(refresh_token).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }
}

#[async_trait]
impl PlanRepository for MemoryStore {
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
        self.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, AppError> {
        Ok(self.plans.get(&id).map(|p| p.value().clone()))
    }

    async fn list_plans_for_user(&self, user_id: Uuid) -> Result<Vec<Plan>, AppError> {
        Ok(self
            .plans
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.value().clone())
            .collect())
    }

    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> Result<Option<Plan>, AppError> {
        let Some(mut plan) = self.plans.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(&mut plan, chrono::Utc::now());
        Ok(Some(plan.value().clone()))
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.plans.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStatus;
    use chrono::{Duration, Utc};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            hashed_password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let dup_name = store
            .create_user(new_user("alice", "other@example.com"))
            .await;
        assert!(matches!(dup_name, Err(AppError::DuplicateIdentity)));

        let dup_email = store
            .create_user(new_user("bob", "ALICE@example.com"))
            .await;
        assert!(matches!(dup_email, Err(AppError::DuplicateIdentity)));

        // The failed email claim must not leave "bob" reserved
        store
            .create_user(new_user("bob", "bob@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let by_name = store.get_user_by_username("alice").await.unwrap().unwrap();
        let by_email = store
            .get_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert!(store.get_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_lookup_by_refresh_token() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .create_session(NewSession {
                id,
                user_id: Uuid::new_v4(),
                username: "alice".to_string(),
                refresh_token: "token-a".to_string(),
                user_agent: "test".to_string(),
                client_ip: "127.0.0.1".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();

        let found = store
            .get_session_by_refresh_token("token-a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert!(store
            .get_session_by_refresh_token("token-b")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_plan_crud() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let start = Utc::now();

        let plan = store
            .create_plan(NewPlan {
                title: "Hike".to_string(),
                description: "Windy Hill".to_string(),
                start_date: start,
                end_date: start + Duration::hours(3),
                status: PlanStatus::InProgress,
                user_id: owner,
            })
            .await
            .unwrap();

        assert_eq!(store.list_plans_for_user(owner).await.unwrap().len(), 1);
        assert!(store
            .list_plans_for_user(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());

        let updated = store
            .update_plan(
                plan.id,
                PlanChanges {
                    status: Some(PlanStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PlanStatus::Done);
        assert_eq!(updated.title, "Hike");

        assert!(store.delete_plan(plan.id).await.unwrap());
        assert!(!store.delete_plan(plan.id).await.unwrap());
        assert!(store
            .update_plan(plan.id, PlanChanges::default())
            .await
            .unwrap()
            .is_none());
    }
}
