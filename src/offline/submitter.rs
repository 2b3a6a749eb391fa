use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::OfflineError;
use crate::rpc::tickets::CreateTicketInput;

/// Transport used by the reconciler to reach the server.
#[async_trait]
pub trait TicketSubmitter: Send + Sync {
    async fn create_ticket(&self, input: &CreateTicketInput) -> Result<(), OfflineError>;
    async fn is_reachable(&self) -> bool;
}

/// Calls `tickets.create` on a Portaria server. Sessions are obtained with
/// the terminal PIN and renewed when the server stops accepting them.
pub struct RpcSubmitter {
    client: reqwest::Client,
    base_url: String,
    pin: String,
    session_token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl RpcSubmitter {
    pub fn new(base_url: &str, pin: &str) -> Result<Self, OfflineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| OfflineError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pin: pin.to_string(),
            session_token: Mutex::new(None),
        })
    }

    /// Start from an existing session instead of logging in on first use.
    pub fn with_session_token(self, token: &str) -> Self {
        Self {
            session_token: Mutex::new(Some(token.to_string())),
            ..self
        }
    }

    async fn login(&self) -> Result<String, OfflineError> {
        let resp = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "pin": self.pin }))
            .send()
            .await
            .map_err(|e| OfflineError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_from(resp).await);
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| OfflineError::Transport(format!("Malformed login response: {e}")))?;
        tracing::info!("Logged in to {}", self.base_url);
        Ok(body.token)
    }

    async fn current_token(&self) -> Result<String, OfflineError> {
        let mut token = self.session_token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Ok(existing.clone());
        }
        let fresh = self.login().await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    /// Log in again unless another call already replaced `stale`.
    async fn renew_token(&self, stale: &str) -> Result<String, OfflineError> {
        let mut token = self.session_token.lock().await;
        if let Some(existing) = token.as_ref().filter(|t| t.as_str() != stale) {
            return Ok(existing.clone());
        }
        let fresh = self.login().await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    async fn post_ticket(
        &self,
        token: &str,
        input: &CreateTicketInput,
    ) -> Result<reqwest::Response, OfflineError> {
        self.client
            .post(format!("{}/api/trpc/tickets.create", self.base_url))
            .bearer_auth(token)
            .json(input)
            .send()
            .await
            .map_err(|e| OfflineError::Transport(e.to_string()))
    }
}

async fn error_from(resp: reqwest::Response) -> OfflineError {
    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    if status.is_server_error() {
        OfflineError::Transport(message)
    } else {
        OfflineError::Rejected(message)
    }
}

#[async_trait]
impl TicketSubmitter for RpcSubmitter {
    async fn create_ticket(&self, input: &CreateTicketInput) -> Result<(), OfflineError> {
        let token = self.current_token().await?;
        let mut resp = self.post_ticket(&token, input).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Session rejected, logging in again");
            let token = self.renew_token(&token).await?;
            resp = self.post_ticket(&token, input).await?;
        }

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from(resp).await)
        }
    }

    async fn is_reachable(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Health probe failed: {e}");
                false
            }
        }
    }
}
