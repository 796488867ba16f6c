//! Configuration management for the Wrapped web app.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a single [`Config`] value holding the
//! Spotify application credentials, the Spotify endpoints and the server settings.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Only the client credentials are required. Every other value has a default
//! that matches a locally running app registered with Spotify under the
//! redirect URI `http://localhost:5000/callback`.

use std::{env, net::SocketAddr, path::PathBuf};

use chrono::TimeDelta;
use reqwest::Url;

use crate::error::ConfigError;

pub const CLIENT_ID_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "SPOTIFY_API_REDIRECT_URI";
pub const SCOPE_VAR: &str = "SPOTIFY_API_AUTH_SCOPE";
pub const AUTH_URL_VAR: &str = "SPOTIFY_API_AUTH_URL";
pub const TOKEN_URL_VAR: &str = "SPOTIFY_API_TOKEN_URL";
pub const API_URL_VAR: &str = "SPOTIFY_API_URL";
pub const SHOW_DIALOG_VAR: &str = "SPOTIFY_SHOW_DIALOG";
pub const SERVER_ADDRESS_VAR: &str = "SERVER_ADDRESS";
pub const SESSION_IDLE_VAR: &str = "SESSION_IDLE_MINUTES";

const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/callback";
const DEFAULT_SCOPE: &str =
    "user-read-recently-played user-top-read playlist-read-private playlist-modify-public";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
const DEFAULT_SESSION_IDLE_MINUTES: i64 = 60;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory if it doesn't exist and loads environment variables
/// from `wrapped/.env` in the platform-specific local data directory. A
/// missing file is not an error: the process environment alone may hold
/// everything [`Config::from_env`] needs. Variables that are already set are
/// never overwritten by the file.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/wrapped/.env`
/// - macOS: `~/Library/Application Support/wrapped/.env`
/// - Windows: `%LOCALAPPDATA%/wrapped/.env`
///
/// # Errors
///
/// This function will return an error if:
/// - The parent directory cannot be created
/// - The `.env` file exists but cannot be read or parsed
pub async fn load_env() -> Result<(), String> {
    let path = env_file_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Location of the optional `.env` file.
pub fn env_file_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("wrapped/.env");
    path
}

/// Runtime configuration shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Config {
    /// Client ID from the Spotify developer dashboard.
    pub client_id: String,
    /// Client secret from the Spotify developer dashboard. Never logged.
    pub client_secret: String,
    /// Callback URL registered with Spotify; must point at `/callback`.
    pub redirect_uri: String,
    /// Space separated list of scopes requested at authorization.
    pub scope: String,
    /// Spotify's authorization endpoint.
    pub auth_url: Url,
    /// Spotify's token endpoint, used for code exchange and refresh.
    pub token_url: String,
    /// Base URL of the Web API, without trailing slash.
    pub api_url: String,
    /// Forces Spotify to show the consent dialog even for returning users.
    pub show_dialog: bool,
    /// Address the HTTP server binds to.
    pub server_addr: SocketAddr,
    /// Sessions untouched for longer than this are dropped from the store.
    pub session_idle: TimeDelta,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the client ID or secret is not
    /// set and [`ConfigError::Invalid`] when a value cannot be parsed.
    ///
    /// # Example
    ///
    /// ```
    /// let config = Config::from_env()?;
    /// println!("Redirect URI: {}", config.redirect_uri);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `from_env` is this function over `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let client_id = get(CLIENT_ID_VAR).ok_or(ConfigError::Missing(CLIENT_ID_VAR))?;
        let client_secret =
            get(CLIENT_SECRET_VAR).ok_or(ConfigError::Missing(CLIENT_SECRET_VAR))?;

        let redirect_uri = get(REDIRECT_URI_VAR).unwrap_or_else(|| DEFAULT_REDIRECT_URI.into());
        parse_url(REDIRECT_URI_VAR, &redirect_uri)?;

        let auth_url = parse_url(
            AUTH_URL_VAR,
            &get(AUTH_URL_VAR).unwrap_or_else(|| DEFAULT_AUTH_URL.into()),
        )?;

        let token_url = get(TOKEN_URL_VAR).unwrap_or_else(|| DEFAULT_TOKEN_URL.into());
        parse_url(TOKEN_URL_VAR, &token_url)?;

        let api_url = get(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.into());
        parse_url(API_URL_VAR, &api_url)?;
        let api_url = api_url.trim_end_matches('/').to_string();

        let show_dialog = match get(SHOW_DIALOG_VAR) {
            Some(value) => parse_bool(SHOW_DIALOG_VAR, &value)?,
            None => true,
        };

        let server_addr = get(SERVER_ADDRESS_VAR)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.into())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: SERVER_ADDRESS_VAR,
                value: get(SERVER_ADDRESS_VAR).unwrap_or_default(),
                reason: e.to_string(),
            })?;

        let idle_minutes = match get(SESSION_IDLE_VAR) {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: SESSION_IDLE_VAR,
                    value: value.clone(),
                    reason: "expected a positive number of minutes".into(),
                })?,
            None => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            scope: get(SCOPE_VAR).unwrap_or_else(|| DEFAULT_SCOPE.into()),
            auth_url,
            token_url,
            api_url,
            show_dialog,
            server_addr,
            session_idle: TimeDelta::minutes(idle_minutes),
        })
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}
