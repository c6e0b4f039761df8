use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AuthConfig;
use crate::error::{ProvisionError, StoreError};
use crate::models::AuthUser;
use crate::store::AuthProvider;

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: String,
}

/// Client for a GoTrue-compatible hosted auth API.
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl HostedAuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

// The provider reports errors under different keys depending on the endpoint
fn provider_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn authenticate(&self, access_token: &str) -> Result<Option<AuthUser>, StoreError> {
        let response = self.client
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<AuthUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(StoreError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<String, ProvisionError> {
        tracing::info!("Provisioning account for {}", email);

        let response = self.client
            .post(self.endpoint("admin/users"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true
            }))
            .send()
            .await
            .map_err(StoreError::from)?;

        let status = response.status();
        if status.is_success() {
            let created: CreatedUser = response.json().await.map_err(StoreError::from)?;
            return Ok(created.id);
        }

        if status.is_client_error() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = provider_message(&body)
                .unwrap_or_else(|| format!("Account creation rejected with status {}", status));
            return Err(ProvisionError::Rejected(message));
        }

        Err(StoreError::UnexpectedStatus(status.as_u16()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_keys() {
        assert_eq!(
            provider_message(&json!({ "msg": "A user with this email address has already been registered" })),
            Some("A user with this email address has already been registered".to_string())
        );
        assert_eq!(
            provider_message(&json!({ "error_description": "bad" })),
            Some("bad".to_string())
        );
        assert_eq!(provider_message(&json!({ "code": 422 })), None);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = HostedAuthClient::new(&AuthConfig {
            url: "https://auth.example.com/".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: "service".to_string(),
        });
        assert_eq!(client.endpoint("user"), "https://auth.example.com/auth/v1/user");
    }
}
