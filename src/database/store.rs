use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Project, ProjectChanges, ScopedTask, Task, TaskPatch, TaskStats, TaskView, User, UserChanges,
};

/// Result of a write that is filtered by ownership of the parent project.
#[derive(Debug, Clone, PartialEq)]
pub enum Scoped<T> {
    /// The record exists, is owned by the caller, and the write happened.
    Applied(T),
    /// The record exists but belongs to another owner; nothing was written.
    NotOwned,
    /// No record with that id.
    Missing,
}

/// Document-style access to the user, project and task collections.
///
/// Every method that takes an `owner` performs the ownership match and the
/// read or write as one operation, so there is no gap between checking and
/// acting.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Users

    /// Fails with `DatabaseError::Conflict` if the email is taken.
    async fn insert_user(&self, user: User) -> Result<User, DatabaseError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` if the new email is taken.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError>;

    // Projects

    /// Newest first.
    async fn projects_by_owner(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError>;

    async fn find_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<Project>, DatabaseError>;

    async fn insert_project(&self, project: Project) -> Result<Project, DatabaseError>;

    async fn update_owned_project(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, DatabaseError>;

    /// Removes the project and all of its tasks. Returns the number of tasks
    /// removed, or `None` when no owned project matched.
    async fn delete_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<u64>, DatabaseError>;

    // Tasks

    /// Every task under a project owned by `owner`, newest first.
    async fn tasks_by_owner(&self, owner: Uuid) -> Result<Vec<TaskView>, DatabaseError>;

    /// Newest first. Callers check project ownership beforehand.
    async fn tasks_by_project(&self, project: Uuid) -> Result<Vec<Task>, DatabaseError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<ScopedTask>, DatabaseError>;

    /// Inserts only if `task.project` is owned by `owner`; `None` otherwise.
    async fn insert_owned_task(&self, owner: Uuid, task: Task) -> Result<Option<Task>, DatabaseError>;

    async fn update_owned_task(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &TaskPatch,
    ) -> Result<Scoped<Task>, DatabaseError>;

    async fn delete_owned_task(&self, id: Uuid, owner: Uuid) -> Result<Scoped<()>, DatabaseError>;

    async fn task_stats(&self, owner: Uuid) -> Result<TaskStats, DatabaseError>;
}
