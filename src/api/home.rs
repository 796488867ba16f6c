use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::require_token;
use crate::{render, server::AppState};

pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Response {
    match require_token(&state, jar).await {
        Ok((jar, _)) => (jar, Html(render::dashboard())).into_response(),
        Err(response) => response,
    }
}
