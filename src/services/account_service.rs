use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{missing_fields, require, ServiceError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::TokenService;
use crate::database::models::user::normalize_email;
use crate::database::models::{User, UserChanges, UserSummary};
use crate::database::{DatabaseError, Store};

/// Token plus the identity it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Registration, login and the caller's own profile.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, input: Registration) -> Result<AuthSession, ServiceError> {
        let mut missing = HashMap::new();
        let name = require(input.name, "name", &mut missing);
        let email = require(input.email, "email", &mut missing);
        let password = require(input.password, "password", &mut missing);
        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(missing_fields("Name, email and password are required", missing));
        };

        if self.store.find_user_by_email(&normalize_email(&email)).await?.is_some() {
            return Err(ServiceError::validation("User already exists with this email"));
        }

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
        let user = self
            .store
            .insert_user(User::new(name, email, password_hash))
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                DatabaseError::Conflict(_) => {
                    ServiceError::validation("User already exists with this email")
                }
                other => other.into(),
            })?;

        info!(user = %user.id, "Registered user");
        self.session_for(&user)
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(
        &self,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<AuthSession, ServiceError> {
        let mut missing = HashMap::new();
        let email = require(email, "email", &mut missing);
        let password = require(password, "password", &mut missing);
        let (Some(email), Some(password)) = (email, password) else {
            return Err(missing_fields("Email and password are required", missing));
        };

        let Some(user) = self.store.find_user_by_email(&normalize_email(&email)).await? else {
            warn!("Login failed: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await??;
        if !matches {
            warn!(user = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user = %user.id, "User logged in");
        self.session_for(&user)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))
    }

    /// Replace name and/or email. Blank values are ignored.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<User, ServiceError> {
        let changes = UserChanges {
            name: changes.name.filter(|n| !n.trim().is_empty()),
            email: changes
                .email
                .filter(|e| !e.trim().is_empty())
                .map(|e| normalize_email(&e)),
        };

        let user = self
            .store
            .update_user(user_id, changes)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ServiceError::validation("Email already in use"),
                other => other.into(),
            })?
            .ok_or(ServiceError::NotFound("User not found"))?;

        info!(user = %user.id, "Updated profile");
        Ok(user)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, ServiceError> {
        Ok(AuthSession {
            token: self.tokens.issue(user.id)?,
            user: user.summary(),
        })
    }
}
