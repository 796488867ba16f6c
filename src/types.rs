use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Seconds before the real expiry at which an access token is treated as expired.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// The token set cached in a session after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    pub expires_in: i64,
    /// Unix timestamp (seconds) at which the access token stops working.
    pub expires_at: i64,
    pub refresh_token: Option<String>,
}

impl TokenInfo {
    pub fn is_expired(&self) -> bool {
        self.expires_at - Utc::now().timestamp() < TOKEN_EXPIRY_MARGIN_SECS
    }

    /// Whether every scope in `requested` was granted to this token.
    pub fn covers_scope(&self, requested: &str) -> bool {
        let granted: Vec<&str> = self.scope.split_whitespace().collect();
        requested
            .split_whitespace()
            .all(|scope| granted.contains(&scope))
    }
}

/// Raw body of a successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

impl TokenResponse {
    /// Stamps the response with its absolute expiry time.
    pub fn into_token_info(self) -> TokenInfo {
        TokenInfo {
            expires_at: Utc::now().timestamp().saturating_add(self.expires_in),
            access_token: self.access_token,
            token_type: self.token_type,
            scope: self.scope,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
        }
    }
}

/// OAuth2 error body returned by the accounts service.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Regular error object returned by the Web API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

/// Period over which Spotify computes a user's top items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Roughly the last four weeks.
    #[default]
    ShortTerm,
    /// Roughly the last six months.
    MediumTerm,
    /// Several years of data.
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    /// `None` for artists of local files.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// `None` for local files.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub popularity: u32,
}

impl Track {
    pub fn first_artist(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or("Unknown artist")
    }

    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single entry of the recently played list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
}

/// Offset-based page, used by the top items endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Cursor-based page, used by the recently played endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPaging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<Track>,
}
