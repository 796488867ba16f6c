use std::sync::Arc;

use axum::{Router, routing::get};
use reqwest::{Client, Url};

use crate::{
    Res, api,
    config::Config,
    info,
    oauth::OAuthManager,
    session::SessionStore,
    spotify::SpotifyClient,
    warning,
};

/// Everything a request handler needs, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub oauth: Arc<OAuthManager>,
    pub spotify: SpotifyClient,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            oauth: Arc::new(OAuthManager::new(&config, http.clone())),
            spotify: SpotifyClient::new(http, config.api_url.clone()),
            sessions: SessionStore::new(config.session_idle),
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::home))
        .route("/callback", get(api::callback))
        .route("/recently_played", get(api::recently_played))
        .route("/top_tracks", get(api::top_tracks))
        .route("/top_artists", get(api::top_artists))
        .route("/recommendations", get(api::recommendations))
        .route("/logout", get(api::logout))
        .route("/health", get(api::health))
        .with_state(state)
}

/// Binds the configured address and serves the app until Ctrl-C.
///
/// With `open_browser` set, the dashboard is opened in the default browser
/// once the listener is up. The dashboard URL uses the host of the redirect
/// URI so the session cookie is set on the same origin Spotify returns to.
pub async fn start_api_server(config: Config, open_browser: bool) -> Res<()> {
    let addr = config.server_addr;
    let home_url = Url::parse(&config.redirect_uri)?.join("/")?;

    let app = build_router(AppState::new(config)?);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    if open_browser && webbrowser::open(home_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            home_url
        )
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warning!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
