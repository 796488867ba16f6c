//! # API Module
//!
//! HTTP route handlers of the Wrapped web app.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`home`] - Dashboard, or a redirect to Spotify's authorization page when
//!   the session has no usable token
//! - [`callback`] - OAuth redirect target; checks the `state` nonce and
//!   exchanges the authorization code for tokens
//! - [`logout`] - Destroys the session and returns to the dashboard
//!
//! ### Listening Data
//!
//! - [`recently_played`], [`top_tracks`], [`top_artists`], [`recommendations`]
//!
//! Each data handler runs the same state machine: without a usable token the
//! browser is redirected to Spotify; with one, the Web API is called and the
//! result rendered. A failed call ends on an inline error page with a link
//! home. Nothing is retried.
//!
//! ### Monitoring
//!
//! - [`health`] - Status, version and number of live sessions as JSON
//!
//! ## Session Handling
//!
//! Handlers resolve the browser's session from the cookie jar, work on a local
//! copy and save it back before responding. The returned jar carries the
//! session cookie whenever a new session was started.

mod callback;
mod health;
mod home;
mod listening;
mod logout;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{render, server::AppState, session::SessionContext, warning};

pub use callback::callback;
pub use health::health;
pub use home::home;
pub use listening::{recently_played, recommendations, top_artists, top_tracks};
pub use logout::logout;

/// Resolves the session and makes sure it holds a usable access token.
///
/// Returns the jar to send back and the access token, or the response that
/// ends the request: a redirect to Spotify when the user has to sign in, or
/// an error page when refreshing the token failed.
async fn require_token(state: &AppState, jar: CookieJar) -> Result<(CookieJar, String), Response> {
    let (jar, mut ctx) = state.sessions.resolve(jar).await;

    let access_token = match state.oauth.validate_token(&mut ctx.data).await {
        Ok(true) => ctx.data.token_info.as_ref().map(|t| t.access_token.clone()),
        Ok(false) => None,
        Err(e) => {
            warning!("Token refresh failed: {}", e);
            state.sessions.save(&ctx).await;
            return Err(error_response(
                e.status(),
                jar,
                "Error During Authentication",
                &e.to_string(),
            ));
        }
    };

    match access_token {
        Some(token) => {
            state.sessions.save(&ctx).await;
            Ok((jar, token))
        }
        None => Err(login_redirect(state, jar, &mut ctx).await),
    }
}

/// Sends the browser to Spotify with the session's state nonce attached.
async fn login_redirect(state: &AppState, jar: CookieJar, ctx: &mut SessionContext) -> Response {
    let nonce = ctx.data.ensure_state();
    state.sessions.save(ctx).await;
    let url = state.oauth.get_authorize_url(Some(&nonce));
    (jar, Redirect::to(&url)).into_response()
}

fn error_response(status: StatusCode, jar: CookieJar, heading: &str, message: &str) -> Response {
    (status, jar, Html(render::error_page(heading, message))).into_response()
}
