use axum::{extract::State, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::{info, server::AppState};

/// Forgets the session, tokens included, and goes back to the dashboard,
/// which in turn starts a new login.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = state.sessions.destroy(jar).await;
    info!("Session closed");
    (jar, Redirect::to("/"))
}
