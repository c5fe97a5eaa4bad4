/// Typed calls to the TaskDeck REST API
///
/// Every authenticated call goes through
/// [`SessionController::send_authenticated`], so an expired access token is
/// refreshed and the call retried without the caller noticing. When the
/// refresh itself fails the call returns [`ClientError::SessionExpired`].

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{from_response, ClientError};
use crate::session::SessionController;
use crate::types::{
    AdminStats, Message, NewTask, RegisterResponse, Task, TaskFilter, TasksPage, UpdateTask, User,
};

#[derive(Debug, Clone)]
pub struct TaskDeckClient {
    session: Arc<SessionController>,
}

impl TaskDeckClient {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    /// Client with its own session against `base_url`
    pub fn connect(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(SessionController::new(base_url)?)))
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    /// Creates an account; does not log in
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<RegisterResponse, ClientError> {
        let response = self
            .session
            .request(Method::POST, "/api/auth/register")
            .json(&serde_json::json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?;

        decode(response).await
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<TasksPage, ClientError> {
        let request = self
            .session
            .request(Method::GET, "/api/tasks")
            .query(&filter.to_query());

        self.call(request).await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let request = self.session.request(Method::POST, "/api/tasks").json(task);
        self.call(request).await
    }

    pub async fn update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, ClientError> {
        let request = self
            .session
            .request(Method::PATCH, &format!("/api/tasks/{}", id))
            .json(update);

        self.call(request).await
    }

    pub async fn toggle_task(&self, id: i64) -> Result<Task, ClientError> {
        let request = self
            .session
            .request(Method::PATCH, &format!("/api/tasks/{}/toggle", id));

        self.call(request).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<Message, ClientError> {
        let request = self
            .session
            .request(Method::DELETE, &format!("/api/tasks/{}", id));

        self.call(request).await
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, ClientError> {
        let request = self.session.request(Method::GET, "/api/admin/stats");
        self.call(request).await
    }

    pub async fn admin_users(&self) -> Result<Vec<User>, ClientError> {
        let request = self.session.request(Method::GET, "/api/admin/users");
        self.call(request).await
    }

    pub async fn admin_delete_user(&self, id: i64) -> Result<Message, ClientError> {
        let request = self
            .session
            .request(Method::DELETE, &format!("/api/admin/users/{}", id));

        self.call(request).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.session.send_authenticated(request).await?;

        let status = response.status();
        if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN)
            && !self.session.is_authenticated().await
        {
            return Err(ClientError::SessionExpired);
        }

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(from_response(response).await);
    }

    Ok(response.json().await?)
}
