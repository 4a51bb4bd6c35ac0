use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Project, ProjectChanges, ProjectRef, ScopedTask, Task, TaskPatch, TaskStats, TaskView, User,
    UserChanges,
};
use super::store::{Scoped, Store};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    // Insertion order is creation order; listings walk these in reverse.
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl Collections {
    fn owned_project(&self, id: Uuid, owner: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id && p.owner == owner)
    }

    fn project_owner(&self, id: Uuid) -> Option<Uuid> {
        self.projects.iter().find(|p| p.id == id).map(|p| p.owner)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    /// Locate a task and decide whether `owner` may write it.
    fn scoped_task_index(&self, id: Uuid, owner: Uuid) -> Scoped<usize> {
        match self.tasks.iter().position(|t| t.id == id) {
            None => Scoped::Missing,
            Some(index) => {
                if self.project_owner(self.tasks[index].project) == Some(owner) {
                    Scoped::Applied(index)
                } else {
                    Scoped::NotOwned
                }
            }
        }
    }
}

/// Process-local store for development and tests.
///
/// All collections sit behind one lock; each trait method is a single
/// critical section, which gives the same atomicity as the filtered
/// statements of the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(DatabaseError::Conflict("email".to_string()));
        }
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &changes.email {
            if inner.email_taken(email, Some(id)) {
                return Err(DatabaseError::Conflict("email".to_string()));
            }
        }

        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn projects_by_owner(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .projects
            .iter()
            .rev()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<Project>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.owned_project(id, owner).cloned())
    }

    async fn insert_project(&self, project: Project) -> Result<Project, DatabaseError> {
        let mut inner = self.inner.write().await;
        inner.projects.push(project.clone());
        Ok(project)
    }

    async fn update_owned_project(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, DatabaseError> {
        let mut inner = self.inner.write().await;
        let Some(project) = inner
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
        else {
            return Ok(None);
        };
        project.apply(changes);
        Ok(Some(project.clone()))
    }

    async fn delete_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<u64>, DatabaseError> {
        let mut inner = self.inner.write().await;
        let Some(index) = inner
            .projects
            .iter()
            .position(|p| p.id == id && p.owner == owner)
        else {
            return Ok(None);
        };
        inner.projects.remove(index);

        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.project != id);
        Ok(Some((before - inner.tasks.len()) as u64))
    }

    async fn tasks_by_owner(&self, owner: Uuid) -> Result<Vec<TaskView>, DatabaseError> {
        let inner = self.inner.read().await;
        let titles: HashMap<Uuid, &str> = inner
            .projects
            .iter()
            .filter(|p| p.owner == owner)
            .map(|p| (p.id, p.title.as_str()))
            .collect();

        Ok(inner
            .tasks
            .iter()
            .rev()
            .filter_map(|t| {
                titles.get(&t.project).map(|title| {
                    t.clone().with_project(ProjectRef {
                        id: t.project,
                        title: title.to_string(),
                    })
                })
            })
            .collect())
    }

    async fn tasks_by_project(&self, project: Uuid) -> Result<Vec<Task>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .rev()
            .filter(|t| t.project == project)
            .cloned()
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<ScopedTask>, DatabaseError> {
        let inner = self.inner.read().await;
        let Some(task) = inner.tasks.iter().find(|t| t.id == id) else {
            return Ok(None);
        };
        let project = inner
            .projects
            .iter()
            .find(|p| p.id == task.project)
            .ok_or_else(|| DatabaseError::Corrupt(format!("task {} has no parent project", id)))?;

        Ok(Some(ScopedTask {
            task: task.clone(),
            project_owner: project.owner,
            project_title: project.title.clone(),
        }))
    }

    async fn insert_owned_task(&self, owner: Uuid, task: Task) -> Result<Option<Task>, DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.owned_project(task.project, owner).is_none() {
            return Ok(None);
        }
        inner.tasks.push(task.clone());
        Ok(Some(task))
    }

    async fn update_owned_task(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &TaskPatch,
    ) -> Result<Scoped<Task>, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(match inner.scoped_task_index(id, owner) {
            Scoped::Applied(index) => {
                let task = &mut inner.tasks[index];
                patch.apply(task);
                Scoped::Applied(task.clone())
            }
            Scoped::NotOwned => Scoped::NotOwned,
            Scoped::Missing => Scoped::Missing,
        })
    }

    async fn delete_owned_task(&self, id: Uuid, owner: Uuid) -> Result<Scoped<()>, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(match inner.scoped_task_index(id, owner) {
            Scoped::Applied(index) => {
                inner.tasks.remove(index);
                Scoped::Applied(())
            }
            Scoped::NotOwned => Scoped::NotOwned,
            Scoped::Missing => Scoped::Missing,
        })
    }

    async fn task_stats(&self, owner: Uuid) -> Result<TaskStats, DatabaseError> {
        let inner = self.inner.read().await;
        let mut stats = TaskStats::default();
        for task in &inner.tasks {
            if inner.project_owner(task.project) == Some(owner) {
                stats.record(task.status);
            }
        }
        Ok(stats)
    }
}
