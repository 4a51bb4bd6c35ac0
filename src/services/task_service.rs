use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{missing_fields, require, ServiceError};
use crate::database::models::{NewTask, Task, TaskPatch, TaskStats, TaskView};
use crate::database::{Scoped, Store};

const PROJECT_NOT_FOUND: &str = "Project not found";
const TASK_NOT_FOUND: &str = "Task not found";
const NOT_AUTHORIZED: &str = "Not authorized";

/// Tasks reachable through projects owned by the caller.
///
/// A task has no owner of its own; access follows its parent project. Unlike
/// projects, a task that exists under someone else's project yields
/// `Forbidden` rather than `NotFound`.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All tasks across the owner's projects, newest first.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<TaskView>, ServiceError> {
        Ok(self.store.tasks_by_owner(owner).await?)
    }

    pub async fn list_for_project(&self, owner: Uuid, project: Uuid) -> Result<Vec<Task>, ServiceError> {
        if self.store.find_owned_project(project, owner).await?.is_none() {
            return Err(ServiceError::NotFound(PROJECT_NOT_FOUND));
        }
        Ok(self.store.tasks_by_project(project).await?)
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<TaskView, ServiceError> {
        let scoped = self
            .store
            .find_task(id)
            .await?
            .ok_or(ServiceError::NotFound(TASK_NOT_FOUND))?;

        if scoped.project_owner != owner {
            warn!(task = %id, caller = %owner, "Rejected read of foreign task");
            return Err(ServiceError::Forbidden(NOT_AUTHORIZED));
        }
        Ok(scoped.into_view())
    }

    /// Create a task in one of the owner's projects, assigned to the owner.
    pub async fn create(&self, owner: Uuid, input: NewTask) -> Result<Task, ServiceError> {
        let mut missing = HashMap::new();
        let Some(title) = require(Some(input.title.clone()), "title", &mut missing) else {
            return Err(missing_fields("Title is required", missing));
        };

        let task = Task::new(NewTask { title, ..input }, owner);
        let task = self
            .store
            .insert_owned_task(owner, task)
            .await?
            .ok_or(ServiceError::NotFound(PROJECT_NOT_FOUND))?;
        info!(task = %task.id, project = %task.project, %owner, "Created task");
        Ok(task)
    }

    pub async fn update(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> Result<Task, ServiceError> {
        match self.store.update_owned_task(id, owner, &patch).await? {
            Scoped::Applied(task) => Ok(task),
            Scoped::NotOwned => {
                warn!(task = %id, caller = %owner, "Rejected update of foreign task");
                Err(ServiceError::Forbidden(NOT_AUTHORIZED))
            }
            Scoped::Missing => Err(ServiceError::NotFound(TASK_NOT_FOUND)),
        }
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), ServiceError> {
        match self.store.delete_owned_task(id, owner).await? {
            Scoped::Applied(()) => {
                info!(task = %id, %owner, "Deleted task");
                Ok(())
            }
            Scoped::NotOwned => {
                warn!(task = %id, caller = %owner, "Rejected delete of foreign task");
                Err(ServiceError::Forbidden(NOT_AUTHORIZED))
            }
            Scoped::Missing => Err(ServiceError::NotFound(TASK_NOT_FOUND)),
        }
    }

    pub async fn stats(&self, owner: Uuid) -> Result<TaskStats, ServiceError> {
        Ok(self.store.task_stats(owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ProjectChanges, TaskPriority, TaskStatus};
    use crate::services::{test_support, ProjectService};
    use crate::types::FieldUpdate;

    struct Fixture {
        projects: ProjectService,
        tasks: TaskService,
    }

    fn fixture() -> Fixture {
        let store = test_support::store();
        Fixture {
            projects: ProjectService::new(store.clone()),
            tasks: TaskService::new(store),
        }
    }

    async fn project_for(f: &Fixture, owner: Uuid, title: &str) -> Uuid {
        f.projects
            .create(owner, ProjectChanges { title: Some(title.into()), description: None })
            .await
            .unwrap()
            .id
    }

    fn new_task(project: Uuid, title: &str) -> NewTask {
        NewTask { title: title.into(), project, ..Default::default() }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_assignment() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;

        let task = f.tasks.create(owner, new_task(project, "T1")).await.unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.assigned_to, owner);
        assert_eq!(task.project, project);
    }

    #[tokio::test]
    async fn create_in_foreign_project_is_not_found() {
        let f = fixture();
        let project = project_for(&f, Uuid::new_v4(), "P").await;
        let err = f.tasks.create(Uuid::new_v4(), new_task(project, "T")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Project not found")));
    }

    #[tokio::test]
    async fn foreign_task_is_forbidden_missing_task_is_not_found() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let project = project_for(&f, alice, "P").await;
        let task = f.tasks.create(alice, new_task(project, "T")).await.unwrap();

        assert!(matches!(f.tasks.get(bob, task.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(
            f.tasks.update(bob, task.id, TaskPatch::default()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(f.tasks.delete(bob, task.id).await, Err(ServiceError::Forbidden(_))));

        let ghost = Uuid::new_v4();
        assert!(matches!(f.tasks.get(alice, ghost).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.tasks.delete(alice, ghost).await, Err(ServiceError::NotFound(_))));

        // Bob's attempts changed nothing
        let view = f.tasks.get(alice, task.id).await.unwrap();
        assert_eq!(view.title, "T");
        assert_eq!(view.project.title, "P");
    }

    #[tokio::test]
    async fn status_only_update_keeps_other_fields() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;
        let task = f
            .tasks
            .create(
                owner,
                NewTask {
                    title: "Write".into(),
                    description: Some("docs".into()),
                    priority: Some(TaskPriority::High),
                    due_date: crate::database::models::task::parse_due_date("2030-01-01"),
                    project,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let patch = TaskPatch { status: Some(TaskStatus::Done), ..Default::default() };
        let updated = f.tasks.update(owner, task.id, patch).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.description, task.description);
        assert_eq!(updated.priority, task.priority);
        assert_eq!(updated.due_date, task.due_date);
    }

    #[tokio::test]
    async fn update_can_clear_due_date() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;
        let task = f
            .tasks
            .create(
                owner,
                NewTask {
                    title: "T".into(),
                    due_date: crate::database::models::task::parse_due_date("2030-01-01"),
                    project,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let patch = TaskPatch { due_date: FieldUpdate::Cleared, ..Default::default() };
        let updated = f.tasks.update(owner, task.id, patch).await.unwrap();
        assert_eq!(updated.due_date, None);
    }

    #[tokio::test]
    async fn deleting_project_removes_its_tasks() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;
        let task = f.tasks.create(owner, new_task(project, "T")).await.unwrap();

        assert_eq!(f.projects.delete(owner, project).await.unwrap(), 1);
        assert!(matches!(f.tasks.get(owner, task.id).await, Err(ServiceError::NotFound(_))));
        assert!(f.tasks.list(owner).await.unwrap().is_empty());
        assert!(matches!(
            f.tasks.list_for_project(owner, project).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stats_follow_status_changes() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;
        let task = f.tasks.create(owner, new_task(project, "T1")).await.unwrap();

        let stats = f.tasks.stats(owner).await.unwrap();
        assert_eq!(stats, TaskStats { total: 1, todo: 1, in_progress: 0, done: 0 });

        f.tasks
            .update(owner, task.id, TaskPatch { status: Some(TaskStatus::Done), ..Default::default() })
            .await
            .unwrap();
        let stats = f.tasks.stats(owner).await.unwrap();
        assert_eq!(stats, TaskStats { total: 1, todo: 0, in_progress: 0, done: 1 });

        assert_eq!(f.tasks.stats(Uuid::new_v4()).await.unwrap(), TaskStats::default());
    }

    #[tokio::test]
    async fn user_without_projects_lists_no_tasks() {
        let f = fixture();
        assert!(f.tasks.list(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_for_project_is_scoped_and_newest_first() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let project = project_for(&f, owner, "P").await;
        let other = project_for(&f, owner, "Q").await;
        f.tasks.create(owner, new_task(project, "first")).await.unwrap();
        f.tasks.create(owner, new_task(project, "second")).await.unwrap();
        f.tasks.create(owner, new_task(other, "elsewhere")).await.unwrap();

        let titles: Vec<_> = f
            .tasks
            .list_for_project(owner, project)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);

        assert!(matches!(
            f.tasks.list_for_project(Uuid::new_v4(), project).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
