//! HTTP client for the external agent runtime (OpenClaw gateway).
//!
//! Mission Control never runs agents. It only forwards notices to an agent's
//! session and asks the gateway whether it is up. Every call here can fail
//! softly: callers log the [`GatewayError`] and carry on.

use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("agent runtime unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent runtime rejected request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
}

/// An active session reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_key: String,
    pub kind: String,
    pub label: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayStatus {
    pub running: bool,
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    session_key: &'a str,
    message: &'a str,
}

/// A notice addressed to one agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentNotice {
    TaskAssigned {
        task_id: Uuid,
        task_title: String,
    },
    Mention {
        from_agent: String,
        task_title: Option<String>,
        message: String,
    },
    StatusUpdate {
        task_title: String,
    },
}

impl AgentNotice {
    /// Human-readable text sent to the agent's session.
    pub fn render(&self) -> String {
        match self {
            Self::TaskAssigned {
                task_id,
                task_title,
            } => format!("📋 New task assigned: \"{}\" (ID: {})", task_title, task_id),
            Self::Mention {
                from_agent,
                task_title: Some(title),
                message,
            } => format!("💬 {} mentioned you on \"{}\": \"{}\"", from_agent, title, message),
            Self::Mention {
                from_agent,
                task_title: None,
                message,
            } => format!("💬 {} mentioned you: \"{}\"", from_agent, message),
            Self::StatusUpdate { task_title } => {
                format!("🔄 Task \"{}\" status updated", task_title)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    token: Option<String>,
    timeout: std::time::Duration,
    client: Client,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            timeout: config.timeout,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the bearer token and timeout applied.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url).timeout(self.timeout);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Rejected { status, body })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Deliver a message to a session.
    pub async fn send_to_session(&self, session_key: &str, message: &str) -> Result<(), GatewayError> {
        let response = self
            .request(Method::POST, "/api/sessions/send")
            .json(&SendRequest {
                session_key,
                message,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn notify_agent(&self, session_key: &str, notice: &AgentNotice) -> Result<(), GatewayError> {
        self.send_to_session(session_key, &notice.render()).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, GatewayError> {
        self.get_json("/api/sessions/list").await
    }

    pub async fn status(&self) -> Result<GatewayStatus, GatewayError> {
        self.get_json("/api/status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_mention_with_task_title() {
        let notice = AgentNotice::Mention {
            from_agent: "Friday".to_string(),
            task_title: Some("Fix bug".to_string()),
            message: "@pixel please review".to_string(),
        };
        assert_eq!(
            notice.render(),
            "💬 Friday mentioned you on \"Fix bug\": \"@pixel please review\""
        );
    }

    #[test]
    fn renders_task_assignment_with_id() {
        let id = Uuid::new_v4();
        let notice = AgentNotice::TaskAssigned {
            task_id: id,
            task_title: "Ship it".to_string(),
        };
        assert_eq!(
            notice.render(),
            format!("📋 New task assigned: \"Ship it\" (ID: {})", id)
        );
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = GatewayClient::new(&GatewayConfig {
            base_url: "http://localhost:3765/".to_string(),
            ..GatewayConfig::default()
        });
        assert_eq!(client.base_url(), "http://localhost:3765");
    }

    #[tokio::test]
    async fn unreachable_runtime_is_an_http_error() {
        let client = GatewayClient::new(&GatewayConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..GatewayConfig::default()
        });
        let err = client.send_to_session("agent:main:main", "hi").await.unwrap_err();
        assert!(matches!(err, GatewayError::Http(_)));
    }
}
