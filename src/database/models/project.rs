use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(owner: Uuid, title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description: description.unwrap_or_default(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: ProjectChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        self.updated_at = Utc::now();
    }
}

/// Replacement values for an owned project. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// The `{id, title}` of a parent project, embedded in task listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: Uuid,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_omitted_fields() {
        let mut project = Project::new(Uuid::new_v4(), "Site".into(), Some("relaunch".into()));
        project.apply(ProjectChanges {
            title: Some("Website".into()),
            description: None,
        });
        assert_eq!(project.title, "Website");
        assert_eq!(project.description, "relaunch");
    }

    #[test]
    fn serializes_owner_in_camel_case_record() {
        let owner = Uuid::new_v4();
        let project = Project::new(owner, "Site".into(), None);
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["owner"], owner.to_string());
        assert_eq!(json["description"], "");
        assert!(json.get("createdAt").is_some());
    }
}
