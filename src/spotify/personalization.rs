use super::SpotifyClient;
use crate::{
    error::ApiError,
    types::{Artist, Paging, TimeRange, Track},
};

pub const TOP_TRACKS_LIMIT: u32 = 50;
pub const TOP_ARTISTS_LIMIT: u32 = 20;

impl SpotifyClient {
    /// Retrieves the user's top tracks for the given time range.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token with `user-top-read`
    /// * `limit` - Maximum number of tracks (1-50)
    /// * `time_range` - Period over which affinity is computed
    ///
    /// # Example
    ///
    /// ```
    /// let tracks = client.current_user_top_tracks(&token, 50, TimeRange::ShortTerm).await?;
    /// ```
    pub async fn current_user_top_tracks(
        &self,
        token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Track>, ApiError> {
        let page: Paging<Track> = self
            .get(
                token,
                "/me/top/tracks",
                &[
                    ("limit", limit.to_string()),
                    ("time_range", time_range.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    /// Retrieves the user's top artists for the given time range.
    pub async fn current_user_top_artists(
        &self,
        token: &str,
        limit: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Artist>, ApiError> {
        let page: Paging<Artist> = self
            .get(
                token,
                "/me/top/artists",
                &[
                    ("limit", limit.to_string()),
                    ("time_range", time_range.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }
}
