pub mod account_service;
pub mod project_service;
pub mod task_service;

pub use account_service::{AccountService, AuthSession, Registration};
pub use project_service::ProjectService;
pub use task_service::TaskService;

use std::collections::HashMap;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::TokenError;
use crate::database::DatabaseError;

/// Outcome kinds of the access layer. The HTTP layer maps each to a status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }
}

/// Presence check: the value must be given and not blank.
pub(crate) fn require(
    value: Option<String>,
    field: &str,
    missing: &mut HashMap<String, String>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            missing.insert(field.to_string(), "This field is required".to_string());
            None
        }
    }
}

/// Turn collected presence failures into a single validation error.
pub(crate) fn missing_fields(message: &str, missing: HashMap<String, String>) -> ServiceError {
    ServiceError::Validation {
        message: message.to_string(),
        field_errors: Some(missing),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::database::{MemoryStore, Store};

    pub fn store() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }
}
