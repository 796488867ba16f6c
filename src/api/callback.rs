use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::error_response;
use crate::{error::AuthError, server::AppState, success, utils, warning};

const HEADING: &str = "Error During Authentication";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// OAuth redirect target.
///
/// The pending state nonce is consumed by every callback that carries a code,
/// whether or not it matches, so a nonce is never accepted twice.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let (jar, mut ctx) = state.sessions.resolve(jar).await;

    if let Some(error) = params.error {
        let err = AuthError::Denied(error);
        warning!("Authorization failed: {}", err);
        return error_response(err.status(), jar, HEADING, &err.to_string());
    }

    let Some(code) = params.code else {
        return error_response(
            StatusCode::BAD_REQUEST,
            jar,
            HEADING,
            "Authorization code not found in request.",
        );
    };

    let expected = ctx.data.state.take();
    state.sessions.save(&ctx).await;

    let state_matches = match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) => utils::constant_time_eq(expected, received),
        _ => false,
    };
    if !state_matches {
        warning!("Callback state does not match the session, rejecting");
        return error_response(
            StatusCode::BAD_REQUEST,
            jar,
            HEADING,
            "State mismatch. Please start the login again.",
        );
    }

    match state.oauth.exchange_code(&code).await {
        Ok(token) => {
            ctx.data.token_info = Some(token);
            state.sessions.save(&ctx).await;
            success!("Authentication successful");
            (jar, Redirect::to("/")).into_response()
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            error_response(e.status(), jar, HEADING, &e.to_string())
        }
    }
}
