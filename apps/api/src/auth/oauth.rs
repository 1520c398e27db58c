//! Google sign-in.
//!
//! The authorization-code handshake itself is done by the `oauth2` crate;
//! this module only wires it to Google's endpoints and fetches the userinfo
//! document with the resulting access token.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, AuthorizationCode,
    ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("userinfo request failed: {0}")]
    UserInfo(#[from] reqwest::Error),

    #[error("identity provider returned no email")]
    MissingEmail,
}

/// Where to send the browser, and the `state` value to check on return.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// The identity asserted by the provider after a successful exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self) -> AuthorizationRequest;

    /// Trades an authorization code for the signed-in user's identity.
    async fn exchange(&self, code: &str) -> Result<ProviderUser, OAuthError>;
}

pub struct GoogleProvider {
    client: BasicClient,
    http: Client,
}

impl GoogleProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.google_client_id.clone()),
            Some(ClientSecret::new(config.google_client_secret.clone())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string()).context("invalid Google auth URL")?,
            Some(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).context("invalid Google token URL")?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(
            RedirectUrl::new(config.oauth_redirect_url()).context("invalid OAuth redirect URL")?,
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, http })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self) -> AuthorizationRequest {
        let (url, state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .url();
        AuthorizationRequest {
            url: url.to_string(),
            state: state.secret().clone(),
        }
    }

    async fn exchange(&self, code: &str) -> Result<ProviderUser, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                warn!(error = %e, "Google token exchange failed");
                OAuthError::Exchange(e.to_string())
            })?;

        let user: ProviderUser = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if user.email.trim().is_empty() {
            return Err(OAuthError::MissingEmail);
        }
        Ok(user)
    }
}
