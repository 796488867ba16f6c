use chrono::Utc;

use super::SpotifyClient;
use crate::{
    error::ApiError,
    types::{CursorPaging, PlayHistory},
    utils,
};

/// Maximum page size Spotify accepts for the recently played endpoint.
pub const RECENTLY_PLAYED_LIMIT: u32 = 50;

impl SpotifyClient {
    /// Retrieves the tracks the user played most recently.
    ///
    /// Only plays after `after` (epoch milliseconds) are returned. Spotify
    /// keeps a short history, so in practice this is the last 50 plays.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token with `user-read-recently-played`
    /// * `limit` - Maximum number of items (1-50)
    /// * `after` - Lower bound in epoch milliseconds
    pub async fn current_user_recently_played(
        &self,
        token: &str,
        limit: u32,
        after: Option<i64>,
    ) -> Result<Vec<PlayHistory>, ApiError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let page: CursorPaging<PlayHistory> = self
            .get(token, "/me/player/recently-played", &query)
            .await?;
        Ok(page.items)
    }

    /// Recently played tracks of the last 90 days, the dashboard's default view.
    pub async fn recently_played_tracks(&self, token: &str) -> Result<Vec<PlayHistory>, ApiError> {
        let after = utils::recently_played_after(Utc::now());
        self.current_user_recently_played(token, RECENTLY_PLAYED_LIMIT, Some(after))
            .await
    }
}
