//! # Spotify Integration Module
//!
//! This module provides the client for the read-only Spotify Web API endpoints
//! the dashboard shows. It handles HTTP communication, bearer authentication and
//! the translation of Spotify's error objects into [`ApiError`].
//!
//! ## Architecture
//!
//! ```text
//! Route Handlers
//!          ↓
//! SpotifyClient
//!     ├── Player (recently played tracks)
//!     ├── Personalization (top tracks, top artists)
//!     └── Browse (recommendations)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! Every call takes the access token explicitly. The client holds no user
//! state, so a single instance is shared by all sessions.
//!
//! ## API Coverage
//!
//! - `GET /me/player/recently-played` - Recently played tracks
//! - `GET /me/top/tracks` - User's top tracks
//! - `GET /me/top/artists` - User's top artists
//! - `GET /recommendations` - Track recommendations from seeds
//!
//! ## Error Handling
//!
//! There is no retry or backoff. A non-success status is returned as
//! [`ApiError::Status`] carrying the message from Spotify's error object, and
//! transport failures as [`ApiError::Http`]. The caller decides how to show
//! them.

mod browse;
mod personalization;
mod player;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::{error::ApiError, types::ApiErrorResponse};

pub use browse::{RECOMMENDATION_LIMIT, RECOMMENDATION_SEED_GENRES};
pub use personalization::{TOP_ARTISTS_LIMIT, TOP_TRACKS_LIMIT};
pub use player::RECENTLY_PLAYED_LIMIT;

/// Thin client over the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Issues an authenticated `GET` and decodes the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(err) if !err.error.message.is_empty() => err.error.message,
        _ if !body.is_empty() => body,
        _ => status.canonical_reason().unwrap_or("request failed").to_string(),
    };

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
