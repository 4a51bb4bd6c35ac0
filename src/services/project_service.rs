use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{missing_fields, require, ServiceError};
use crate::database::models::{Project, ProjectChanges};
use crate::database::Store;

const PROJECT_NOT_FOUND: &str = "Project not found";

/// Projects visible to a single owner.
///
/// A project that exists but belongs to someone else is reported exactly like
/// one that does not exist, so callers cannot discover other users' ids.
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Project>, ServiceError> {
        Ok(self.store.projects_by_owner(owner).await?)
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<Project, ServiceError> {
        self.store
            .find_owned_project(id, owner)
            .await?
            .ok_or(ServiceError::NotFound(PROJECT_NOT_FOUND))
    }

    pub async fn create(&self, owner: Uuid, input: ProjectChanges) -> Result<Project, ServiceError> {
        let mut missing = HashMap::new();
        let title = require(input.title, "title", &mut missing);
        let Some(title) = title else {
            return Err(missing_fields("Title is required", missing));
        };

        let project = self
            .store
            .insert_project(Project::new(owner, title, input.description))
            .await?;
        info!(project = %project.id, %owner, "Created project");
        Ok(project)
    }

    /// Replace the provided fields of an owned project.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Project, ServiceError> {
        if matches!(&changes.title, Some(t) if t.trim().is_empty()) {
            return Err(ServiceError::validation("Title cannot be empty"));
        }

        self.store
            .update_owned_project(id, owner, changes)
            .await?
            .ok_or(ServiceError::NotFound(PROJECT_NOT_FOUND))
    }

    /// Delete an owned project together with all of its tasks.
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<u64, ServiceError> {
        let removed = self
            .store
            .delete_owned_project(id, owner)
            .await?
            .ok_or(ServiceError::NotFound(PROJECT_NOT_FOUND))?;
        info!(project = %id, %owner, tasks_removed = removed, "Deleted project");
        Ok(removed)
    }
}
