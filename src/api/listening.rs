use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::{error_response, require_token};
use crate::{
    error::ApiError,
    render,
    server::AppState,
    spotify::{TOP_ARTISTS_LIMIT, TOP_TRACKS_LIMIT},
    types::TimeRange,
    warning,
};

pub async fn recently_played(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = match require_token(&state, jar).await {
        Ok(granted) => granted,
        Err(response) => return response,
    };

    let page = state
        .spotify
        .recently_played_tracks(&token)
        .await
        .map(|items| render::recently_played(&items));
    respond(jar, "Error Getting Recently Played Tracks", page)
}

pub async fn top_tracks(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = match require_token(&state, jar).await {
        Ok(granted) => granted,
        Err(response) => return response,
    };

    let page = state
        .spotify
        .current_user_top_tracks(&token, TOP_TRACKS_LIMIT, TimeRange::ShortTerm)
        .await
        .map(|tracks| render::top_tracks(&tracks));
    respond(jar, "Error Getting Top Tracks", page)
}

pub async fn top_artists(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = match require_token(&state, jar).await {
        Ok(granted) => granted,
        Err(response) => return response,
    };

    let page = state
        .spotify
        .current_user_top_artists(&token, TOP_ARTISTS_LIMIT, TimeRange::ShortTerm)
        .await
        .map(|artists| render::top_artists(&artists));
    respond(jar, "Error Getting Top Artists", page)
}

pub async fn recommendations(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, token) = match require_token(&state, jar).await {
        Ok(granted) => granted,
        Err(response) => return response,
    };

    let page = state
        .spotify
        .recommendations_for_user(&token)
        .await
        .map(|tracks| render::recommendations(&tracks));
    respond(jar, "Error Getting Recommendations", page)
}

fn respond(jar: CookieJar, heading: &str, page: Result<String, ApiError>) -> Response {
    match page {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => {
            warning!("{}: {}", heading, e);
            error_response(StatusCode::BAD_GATEWAY, jar, heading, &e.to_string())
        }
    }
}
