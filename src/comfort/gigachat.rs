//! GigaChat chat backend
//!
//! Opening a session exchanges the authorization key for a short-lived
//! access token; each exchange is a `chat/completions` call carrying that
//! token. Closing drops the token.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Certificate, Client};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{ChatBackend, ChatSession};
use crate::Result;
use crate::error::WeatherError;

/// Connection settings for GigaChat
#[derive(Debug, Clone, PartialEq)]
pub struct GigaChatConfig {
    /// OAuth endpoint issuing access tokens
    pub auth_url: String,
    /// API root; `/chat/completions` is appended
    pub api_url: String,
    /// Base64 authorization key, sent as `Basic`
    pub credentials: String,
    pub scope: String,
    pub model: String,
    pub timeout: Duration,
    /// Extra PEM root certificate, e.g. the Russian Trusted Root CA
    pub ca_cert: Option<PathBuf>,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

pub struct GigaChatBackend {
    client: Client,
    config: GigaChatConfig,
}

impl GigaChatBackend {
    pub fn new(config: GigaChatConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                WeatherError::config(format!("Cannot read CA certificate {}: {e}", path.display()))
            })?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| WeatherError::config(format!("Invalid CA certificate {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the chat backend");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| WeatherError::config(format!("Failed to create chat client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatBackend for GigaChatBackend {
    #[instrument(skip(self))]
    async fn open_session(&self) -> Result<Box<dyn ChatSession>> {
        let response = self
            .client
            .post(&self.config.auth_url)
            .header(AUTHORIZATION, format!("Basic {}", self.config.credentials))
            .header(ACCEPT, "application/json")
            .header("RqUID", Uuid::new_v4().to_string())
            .form(&[("scope", self.config.scope.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::network(format!("token request failed: {e}"), 1))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::http_status(status.as_u16(), &self.config.auth_url));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::parse(format!("invalid token response: {e}")))?;
        debug!("Chat session opened");

        Ok(Box::new(GigaChatSession {
            client: self.client.clone(),
            completions_url: format!("{}/chat/completions", self.config.api_url.trim_end_matches('/')),
            model: self.config.model.clone(),
            token: Some(token.access_token),
        }))
    }
}

struct GigaChatSession {
    client: Client,
    completions_url: String,
    model: String,
    token: Option<String>,
}

#[async_trait]
impl ChatSession for GigaChatSession {
    async fn ask(&mut self, prompt: &str) -> Result<String> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| WeatherError::validation("chat session already closed"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| WeatherError::network(format!("chat request failed: {e}"), 1))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::http_status(status.as_u16(), &self.completions_url));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| WeatherError::parse(format!("invalid chat response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| WeatherError::parse("chat response has no choices"))
    }

    async fn close(mut self: Box<Self>) {
        self.token = None;
        debug!("Chat session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GigaChatConfig {
        GigaChatConfig {
            auth_url: "http://localhost/oauth".to_string(),
            api_url: "http://localhost/api/v1".to_string(),
            credentials: "key".to_string(),
            scope: "GIGACHAT_API_PERS".to_string(),
            model: "GigaChat".to_string(),
            timeout: Duration::from_secs(5),
            ca_cert: None,
            accept_invalid_certs: false,
        }
    }

    #[test]
    fn test_missing_ca_cert_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = GigaChatConfig {
            ca_cert: Some(dir.path().join("absent.pem")),
            ..config()
        };

        let result = GigaChatBackend::new(config);
        assert!(matches!(result, Err(WeatherError::Config { .. })));
    }

    #[test]
    fn test_insecure_mode_builds() {
        let config = GigaChatConfig {
            accept_invalid_certs: true,
            ..config()
        };
        assert!(GigaChatBackend::new(config).is_ok());
    }
}
