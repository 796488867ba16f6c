//! OAuth2 authorization-code flow against the Spotify accounts service.
//!
//! The [`OAuthManager`] owns the client credentials and covers the whole token
//! lifecycle of a session:
//!
//! 1. **Authorization**: [`OAuthManager::get_authorize_url`] builds the URL the
//!    browser is redirected to, carrying the session's CSRF `state` nonce
//! 2. **Code Exchange**: [`OAuthManager::exchange_code`] trades the code from the
//!    callback for a [`TokenInfo`]
//! 3. **Validation**: [`OAuthManager::validate_token`] checks the cached token on
//!    every data request and refreshes it when it is about to expire
//!
//! The app is a confidential client, so requests to the token endpoint
//! authenticate with HTTP Basic credentials instead of PKCE.

use reqwest::{Client, Response};

use crate::{
    config::Config,
    error::AuthError,
    session::SessionData,
    types::{OAuthErrorResponse, TokenInfo, TokenResponse},
};

pub struct OAuthManager {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    auth_url: reqwest::Url,
    token_url: String,
    show_dialog: bool,
    http: Client,
}

impl OAuthManager {
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            show_dialog: config.show_dialog,
            http,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Builds the provider URL the browser is sent to for authorization.
    ///
    /// # Arguments
    ///
    /// * `state` - CSRF nonce echoed back by Spotify on the callback. Omitted
    ///   from the URL when `None`.
    ///
    /// # Example
    ///
    /// ```
    /// let url = oauth.get_authorize_url(Some("4f1c..."));
    /// // https://accounts.spotify.com/authorize?client_id=...&response_type=code&...
    /// ```
    pub fn get_authorize_url(&self, state: Option<&str>) -> String {
        let mut url = self.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", &self.redirect_uri);
            if !self.scope.is_empty() {
                query.append_pair("scope", &self.scope);
            }
            if let Some(state) = state {
                query.append_pair("state", state);
            }
            if self.show_dialog {
                query.append_pair("show_dialog", "true");
            }
        }
        url.to_string()
    }

    /// Exchanges an authorization code from the callback for tokens.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Provider`] when Spotify rejects the code (already used,
    ///   expired, redirect URI mismatch) or the client credentials
    /// - [`AuthError::Http`] on network failures or unreadable responses
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let token = read_token_response(response).await?.into_token_info();
        Ok(token)
    }

    /// Trades a refresh token for a new access token.
    ///
    /// Spotify does not always rotate the refresh token. When the response
    /// carries none, the one passed in is kept so the session can refresh
    /// again later.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenInfo, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let mut token = read_token_response(response).await?.into_token_info();
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    /// Decides whether the session holds a usable token.
    ///
    /// Returns `Ok(false)` when there is no token, when its scope does not
    /// cover the configured scope, or when it is expired and cannot be
    /// refreshed. An expired token with a refresh token is refreshed and the
    /// new token is written into `session`.
    ///
    /// # Errors
    ///
    /// A refresh rejected by Spotify or a network failure is returned as
    /// [`AuthError`]. The stale token is removed from `session` first, so the
    /// next request starts a fresh login.
    pub async fn validate_token(&self, session: &mut SessionData) -> Result<bool, AuthError> {
        let Some(token) = session.token_info.as_ref() else {
            return Ok(false);
        };

        if !token.covers_scope(&self.scope) {
            session.token_info = None;
            return Ok(false);
        }

        if !token.is_expired() {
            return Ok(true);
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            session.token_info = None;
            return Ok(false);
        };

        match self.refresh_access_token(&refresh_token).await {
            Ok(mut refreshed) => {
                // Spotify may leave the scope out of refresh responses.
                if refreshed.scope.is_empty() {
                    refreshed.scope = token.scope.clone();
                }
                session.token_info = Some(refreshed);
                Ok(true)
            }
            Err(e) => {
                session.token_info = None;
                Err(e)
            }
        }
    }
}

async fn read_token_response(response: Response) -> Result<TokenResponse, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<TokenResponse>().await?);
    }

    let body = response.text().await?;
    Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
        Ok(err) => AuthError::Provider {
            description: err.error_description.unwrap_or_else(|| err.error.clone()),
            error: err.error,
        },
        Err(_) => AuthError::Provider {
            error: status.as_u16().to_string(),
            description: if body.is_empty() {
                status.canonical_reason().unwrap_or("token request failed").to_string()
            } else {
                body
            },
        },
    })
}
