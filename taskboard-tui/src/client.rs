//! HTTP client for the taskboard API.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use taskboard_core::{
    FieldError, LoginInput, PublicUser, SignupInput, Task, TaskInput, TaskPage, TaskStats,
};

pub const NETWORK_ERROR_MESSAGE: &str = "Could not reach the server. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally before any request was made.
    #[error("{}", join_messages(.0))]
    Invalid(Vec<FieldError>),
    /// The server answered with an error; `message` is its own wording.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),
    #[error("Unexpected response from server")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthReply {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
struct TaskReply {
    task: Task,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}/api{path}", self.base_url));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(ClientError::Network)?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(ClientError::Decode);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn signup(&self, input: &SignupInput) -> Result<AuthReply, ClientError> {
        self.send(self.request(Method::POST, "/auth/signup").json(input))
            .await
    }

    pub async fn login(&self, input: &LoginInput) -> Result<AuthReply, ClientError> {
        self.send(self.request(Method::POST, "/auth/login").json(input))
            .await
    }

    pub async fn list_tasks(&self, params: &[(&str, String)]) -> Result<TaskPage, ClientError> {
        self.send(self.request(Method::GET, "/tasks").query(params))
            .await
    }

    pub async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError> {
        let reply: TaskReply = self
            .send(self.request(Method::POST, "/tasks").json(input))
            .await?;
        Ok(reply.task)
    }

    pub async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError> {
        let reply: TaskReply = self
            .send(self.request(Method::PUT, &format!("/tasks/{id}")).json(input))
            .await?;
        Ok(reply.task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let _: IgnoredAny = self
            .send(self.request(Method::DELETE, &format!("/tasks/{id}")))
            .await?;
        Ok(())
    }

    pub async fn task_stats(&self) -> Result<TaskStats, ClientError> {
        self.send(self.request(Method::GET, "/tasks/stats")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn server_errors_keep_their_message() {
        let error = ClientError::Server {
            status: 404,
            message: "Task not found or unauthorized".into(),
        };
        assert_eq!(error.to_string(), "Task not found or unauthorized");
        assert!(error.is_not_found());
        assert!(!error.is_unauthorized());
    }

    #[test]
    fn local_validation_joins_messages() {
        let error = ClientError::Invalid(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("priority", "Priority is required"),
        ]);
        assert_eq!(error.to_string(), "Title is required; Priority is required");
        assert_eq!(error.status(), None);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let error = client.task_stats().await.unwrap_err();
        assert!(matches!(error, ClientError::Network(_)));
        assert_eq!(error.to_string(), NETWORK_ERROR_MESSAGE);
    }
}
