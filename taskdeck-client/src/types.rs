/// Wire types for the TaskDeck REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Public profile of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of a successful login or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: i64,
    pub tasks: i64,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub message: String,
    pub role: Role,
}

/// `{"message": ...}` acknowledgements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Listing filters; `None` leaves the server default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// `None` means all statuses
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TaskFilter {
    /// Query-string pairs for the set fields
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }

        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; unset fields are left out of the request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_skips_unset_fields() {
        assert!(TaskFilter::default().to_query().is_empty());

        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            search: Some(String::new()),
            page: Some(2),
            limit: None,
        };
        assert_eq!(
            filter.to_query(),
            vec![("status", "completed".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = UpdateTask {
            status: Some(TaskStatus::Todo),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            serde_json::json!({ "status": "todo" })
        );
    }

    #[test]
    fn test_decodes_server_shapes() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"accessToken":"t","user":{"id":1,"email":"a@b.c","name":"A","role":"admin"}}"#,
        )
        .unwrap();
        assert!(auth.user.is_admin());

        let page: TasksPage = serde_json::from_str(
            r#"{"tasks":[{"id":3,"user_id":1,"title":"T","description":"","status":"todo",
                "created_at":"2025-01-01T00:00:00Z"}],"total":1,"page":1,"totalPages":1}"#,
        )
        .unwrap();
        assert_eq!(page.tasks[0].status, TaskStatus::Todo);
        assert_eq!(page.total_pages, 1);

        let stats: AdminStats =
            serde_json::from_str(r#"{"users":2,"tasks":5,"completedTasks":3}"#).unwrap();
        assert_eq!(stats.completed_tasks, 3);
    }
}
