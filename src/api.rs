//! HTTP client for the console's user administration API

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::model::User;

/// HTTP client for the user administration REST resources
///
/// Session credentials ride on the cookie store, so every call is sent
/// with credentials the way the console's browser client does.
pub struct UsersApi {
    config: ClientConfig,
    client: Client,
}

impl UsersApi {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let url = format!("{}/users", self.config.base_url);

        let response = self.client.get(&url).send().await?;
        Self::json_response(response).await
    }

    /// Create a user
    pub async fn create_user(&self, user: &User) -> Result<()> {
        let url = format!("{}/users", self.config.base_url);

        let response = self.client.post(&url).json(user).send().await?;
        Self::empty_response(response).await
    }

    /// Update a user, keyed by email
    pub async fn edit_user(&self, user: &User) -> Result<()> {
        let url = format!(
            "{}/users/{}",
            self.config.base_url,
            urlencoding::encode(&user.email)
        );

        let response = self.client.put(&url).json(user).send().await?;
        Self::empty_response(response).await
    }

    /// Delete a user, keyed by email
    pub async fn delete_user(&self, email: &str) -> Result<()> {
        let url = format!(
            "{}/users/{}",
            self.config.base_url,
            urlencoding::encode(email)
        );

        let response = self.client.delete(&url).send().await?;
        Self::empty_response(response).await
    }

    /// Revoke every active session for a user
    pub async fn revoke_sessions(&self, email: &str) -> Result<()> {
        let url = format!(
            "{}/auth/logout-sessions/{}",
            self.config.base_url,
            urlencoding::encode(email)
        );

        let response = self.client.post(&url).json(&json!({})).send().await?;
        Self::empty_response(response).await
    }

    /// Request a registration code for forwarding a user to the remote directory
    pub async fn request_registration_code(&self, email: &str) -> Result<()> {
        let url = format!(
            "{}/users/forward-auth/{}",
            self.config.base_url,
            urlencoding::encode(email)
        );

        let response = self.client.post(&url).json(&json!({})).send().await?;
        Self::empty_response(response).await
    }

    /// Remove a user's registration from the remote directory
    pub async fn remove_remote_registration(&self, email: &str) -> Result<()> {
        let url = format!(
            "{}/users/forward/{}",
            self.config.base_url,
            urlencoding::encode(email)
        );

        let response = self.client.delete(&url).send().await?;
        Self::empty_response(response).await
    }

    /// Submit a registration code for a user
    pub async fn submit_registration_code(&self, email: &str, code: &str) -> Result<()> {
        let url = format!(
            "{}/users/forward/{}",
            self.config.base_url,
            urlencoding::encode(email)
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({ "code": code }))
            .send()
            .await?;
        Self::empty_response(response).await
    }

    /// List identifiers registered in the remote directory
    pub async fn list_remote_registered(&self) -> Result<Vec<String>> {
        let url = format!("{}/users/forward", self.config.base_url);

        let response = self.client.get(&url).send().await?;
        Self::json_response(response).await
    }

    // ==================== Helper Methods ====================

    async fn json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Server { status, message });
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn empty_response(response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Server { status, message });
        }

        Ok(())
    }
}
