//! Login password checks against the auth service.

use std::time::Duration;

use async_trait::async_trait;
use pocketbank_core::{LedgerError, LedgerResult};
use pocketbank_core::ports::CredentialVerifier;
use pocketbank_shared::config::AuthServiceConfig;
use pocketbank_shared::types::UserId;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const VERIFY_PATH: &str = "/internal/credentials/verify";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    user_id: UserId,
    password: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// [`CredentialVerifier`] calling the auth service over HTTP.
///
/// `POST {base_url}/internal/credentials/verify` with `{userId, password}`
/// answers `{valid}`; 401 and 403 also count as a wrong password.
#[derive(Debug, Clone)]
pub struct HttpCredentialVerifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCredentialVerifier {
    /// Builds a client for the configured auth service.
    ///
    /// # Errors
    ///
    /// Returns `ExternalService` if the HTTP client cannot be built.
    pub fn new(config: &AuthServiceConfig) -> LedgerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LedgerError::ExternalService(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}{VERIFY_PATH}", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CredentialVerifier for HttpCredentialVerifier {
    async fn verify_login_password(&self, user: UserId, password: &str) -> LedgerResult<bool> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&VerifyRequest {
                user_id: user,
                password,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "auth service unreachable");
                LedgerError::ExternalService("auth service unreachable".to_string())
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            status if status.is_success() => {
                let body: VerifyResponse = response.json().await.map_err(|e| {
                    LedgerError::ExternalService(format!("malformed auth service reply: {e}"))
                })?;
                debug!(user = %user, valid = body.valid, "login password checked");
                Ok(body.valid)
            }
            status => {
                warn!(%status, "auth service rejected credential check");
                Err(LedgerError::ExternalService(format!(
                    "auth service answered {status}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let verifier = HttpCredentialVerifier::new(&AuthServiceConfig {
            base_url: "http://auth.local:8081/".to_string(),
            timeout_ms: 500,
        })
        .unwrap();
        assert_eq!(
            verifier.endpoint,
            "http://auth.local:8081/internal/credentials/verify"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_external_error() {
        let verifier = HttpCredentialVerifier::new(&AuthServiceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 200,
        })
        .unwrap();
        let result = verifier.verify_login_password(UserId::new(), "pw").await;
        assert!(matches!(result, Err(LedgerError::ExternalService(_))));
    }
}
