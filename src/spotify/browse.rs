use super::SpotifyClient;
use crate::{
    error::ApiError,
    types::{RecommendationsResponse, TimeRange, Track},
};

pub const RECOMMENDATION_LIMIT: u32 = 20;
pub const RECOMMENDATION_SEED_GENRES: [&str; 2] = ["pop", "dance"];

// Spotify accepts at most five seeds across artists, genres and tracks.
const MAX_SEEDS: usize = 5;

impl SpotifyClient {
    /// Retrieves track recommendations from artist and genre seeds.
    ///
    /// Seeds beyond Spotify's limit of five are dropped, artists first in
    /// line. Empty seed lists are left out of the query.
    pub async fn recommendations(
        &self,
        token: &str,
        seed_artists: &[String],
        seed_genres: &[&str],
        limit: u32,
    ) -> Result<Vec<Track>, ApiError> {
        let artists: Vec<&str> = seed_artists
            .iter()
            .map(String::as_str)
            .take(MAX_SEEDS)
            .collect();
        let genres: Vec<&str> = seed_genres
            .iter()
            .copied()
            .take(MAX_SEEDS - artists.len())
            .collect();

        let mut query = vec![("limit", limit.to_string())];
        if !artists.is_empty() {
            query.push(("seed_artists", artists.join(",")));
        }
        if !genres.is_empty() {
            query.push(("seed_genres", genres.join(",")));
        }

        let res: RecommendationsResponse = self.get(token, "/recommendations", &query).await?;
        Ok(res.tracks)
    }

    /// Recommendations seeded with the user's favourite artist plus a couple
    /// of fixed genres.
    pub async fn recommendations_for_user(&self, token: &str) -> Result<Vec<Track>, ApiError> {
        let top = self
            .current_user_top_artists(token, 1, TimeRange::MediumTerm)
            .await?;
        let seed_artists: Vec<String> = top.into_iter().map(|a| a.id).take(1).collect();

        self.recommendations(
            token,
            &seed_artists,
            &RECOMMENDATION_SEED_GENRES,
            RECOMMENDATION_LIMIT,
        )
        .await
    }
}
