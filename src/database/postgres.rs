use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Project, ProjectChanges, ScopedTask, Task, TaskPatch, TaskStats, TaskView, User, UserChanges,
};
use super::store::{Scoped, Store};
use crate::types::FieldUpdate;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, title, description, owner_id, created_at, updated_at";
const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.priority, t.due_date, \
                            t.project_id, t.assigned_to, t.created_at, t.updated_at";

/// Task as stored; status and priority are TEXT columns guarded by CHECK constraints.
#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    project_id: Uuid,
    assigned_to: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row
                .status
                .parse()
                .map_err(|e| DatabaseError::Corrupt(format!("task {}: {}", row.id, e)))?,
            priority: row
                .priority
                .parse()
                .map_err(|e| DatabaseError::Corrupt(format!("task {}: {}", row.id, e)))?,
            due_date: row.due_date,
            project: row.project_id,
            assigned_to: row.assigned_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ScopedTaskRow {
    #[sqlx(flatten)]
    task: TaskRow,
    project_owner: Uuid,
    project_title: String,
}

impl TryFrom<ScopedTaskRow> for ScopedTask {
    type Error = DatabaseError;

    fn try_from(row: ScopedTaskRow) -> Result<Self, Self::Error> {
        Ok(ScopedTask {
            task: row.task.try_into()?,
            project_owner: row.project_owner,
            project_title: row.project_title,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total: i64,
    todo: i64,
    in_progress: i64,
    done: i64,
}

fn tasks_from_rows(rows: Vec<TaskRow>) -> Result<Vec<Task>, DatabaseError> {
    rows.into_iter().map(Task::try_from).collect()
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn task_exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, DatabaseError> {
        let query = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, "email"))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), updated_at = now() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, "email"))
    }

    async fn projects_by_owner(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM projects WHERE owner_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn find_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<Project>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM projects WHERE id = $1 AND owner_id = $2",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn insert_project(&self, project: Project) -> Result<Project, DatabaseError> {
        let query = format!(
            "INSERT INTO projects ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.owner)
            .bind(project.created_at)
            .bind(project.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn update_owned_project(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, DatabaseError> {
        let query = format!(
            "UPDATE projects SET title = COALESCE($3, title), description = COALESCE($4, description), \
             updated_at = now() WHERE id = $1 AND owner_id = $2 RETURNING {}",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_owned_project(&self, id: Uuid, owner: Uuid) -> Result<Option<u64>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent task inserts into this project until commit.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 AND owner_id = $2 FOR UPDATE")
                .bind(id)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn tasks_by_owner(&self, owner: Uuid) -> Result<Vec<TaskView>, DatabaseError> {
        let query = format!(
            "SELECT {}, p.owner_id AS project_owner, p.title AS project_title \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE p.owner_id = $1 ORDER BY t.created_at DESC",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, ScopedTaskRow>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| ScopedTask::try_from(row).map(ScopedTask::into_view))
            .collect()
    }

    async fn tasks_by_project(&self, project: Uuid) -> Result<Vec<Task>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM tasks t WHERE t.project_id = $1 ORDER BY t.created_at DESC",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, TaskRow>(&query)
            .bind(project)
            .fetch_all(&self.pool)
            .await?;
        tasks_from_rows(rows)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<ScopedTask>, DatabaseError> {
        let query = format!(
            "SELECT {}, p.owner_id AS project_owner, p.title AS project_title \
             FROM tasks t JOIN projects p ON p.id = t.project_id WHERE t.id = $1",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, ScopedTaskRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ScopedTask::try_from).transpose()
    }

    async fn insert_owned_task(&self, owner: Uuid, task: Task) -> Result<Option<Task>, DatabaseError> {
        let query = format!(
            "INSERT INTO tasks AS t (id, title, description, status, priority, due_date, project_id, \
             assigned_to, created_at, updated_at) \
             SELECT $1, $2, $3, $4, $5, $6, p.id, $8, $9, $9 FROM projects p \
             WHERE p.id = $7 AND p.owner_id = $10 \
             RETURNING {}",
            TASK_COLUMNS
        );
        let result = sqlx::query_as::<_, TaskRow>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.due_date)
            .bind(task.project)
            .bind(task.assigned_to)
            .bind(task.created_at)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => row.map(Task::try_from).transpose(),
            // Project deleted between the SELECT and the foreign key check
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_owned_task(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &TaskPatch,
    ) -> Result<Scoped<Task>, DatabaseError> {
        let query = format!(
            "UPDATE tasks t SET \
                title = COALESCE($3, t.title), \
                description = CASE WHEN $4 THEN $5 ELSE t.description END, \
                status = COALESCE($6, t.status), \
                priority = COALESCE($7, t.priority), \
                due_date = CASE WHEN $8 THEN $9 ELSE t.due_date END, \
                updated_at = now() \
             FROM projects p \
             WHERE t.id = $1 AND p.id = t.project_id AND p.owner_id = $2 \
             RETURNING {}",
            TASK_COLUMNS
        );

        let description = match &patch.description {
            FieldUpdate::Set(value) => Some(value.clone()),
            _ => None,
        };
        let due_date = match &patch.due_date {
            FieldUpdate::Set(value) => Some(*value),
            _ => None,
        };

        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(owner)
            .bind(patch.title.as_deref())
            .bind(!patch.description.is_unchanged())
            .bind(description)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.priority.map(|p| p.as_str()))
            .bind(!patch.due_date.is_unchanged())
            .bind(due_date)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Scoped::Applied(row.try_into()?)),
            None if self.task_exists(id).await? => Ok(Scoped::NotOwned),
            None => Ok(Scoped::Missing),
        }
    }

    async fn delete_owned_task(&self, id: Uuid, owner: Uuid) -> Result<Scoped<()>, DatabaseError> {
        let deleted = sqlx::query(
            "DELETE FROM tasks t USING projects p \
             WHERE t.id = $1 AND p.id = t.project_id AND p.owner_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted > 0 {
            Ok(Scoped::Applied(()))
        } else if self.task_exists(id).await? {
            Ok(Scoped::NotOwned)
        } else {
            Ok(Scoped::Missing)
        }
    }

    async fn task_stats(&self, owner: Uuid) -> Result<TaskStats, DatabaseError> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE t.status = 'todo') AS todo, \
                    COUNT(*) FILTER (WHERE t.status = 'in-progress') AS in_progress, \
                    COUNT(*) FILTER (WHERE t.status = 'done') AS done \
             FROM tasks t JOIN projects p ON p.id = t.project_id \
             WHERE p.owner_id = $1",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaskStats {
            total: row.total as u64,
            todo: row.todo as u64,
            in_progress: row.in_progress as u64,
            done: row.done as u64,
        })
    }
}
