use std::{collections::HashMap, net::SocketAddr};

use axum::{
    Form, Json, Router,
    body::Body,
    extract::Query,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use wrapped::{
    config::Config,
    server::{AppState, build_router},
    session::{SESSION_COOKIE_NAME, SessionContext},
    types::TokenInfo,
};

const CLIENT_ID: &str = "test-client";
const CLIENT_SECRET: &str = "test-secret";
const AUTH_URL: &str = "https://accounts.example.test/authorize";
const SCOPE: &str = "user-read-recently-played user-top-read";

// ============================================================================
// Stub Spotify
// ============================================================================

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "status": status.as_u16(), "message": message } })),
    )
        .into_response()
}

/// Rejects everything but the two access tokens the stub hands out.
fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers) {
        Some("access-1") | Some("refreshed-access") => Ok(()),
        Some("revoked-access") => Err(api_error(StatusCode::FORBIDDEN, "Access revoked")),
        _ => Err(api_error(StatusCode::UNAUTHORIZED, "The access token expired")),
    }
}

async fn token_endpoint(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Response {
    let expected = format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_client", "error_description": "Invalid client" })),
        )
            .into_response();
    }

    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => {
            Json(json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "scope": SCOPE,
                "expires_in": 3600,
                "refresh_token": "refresh-1",
            }))
            .into_response()
        }
        Some("refresh_token")
            if form.get("refresh_token").map(String::as_str) == Some("refresh-1") =>
        {
            Json(json!({
                "access_token": "refreshed-access",
                "token_type": "Bearer",
                "expires_in": 3600,
            }))
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid authorization code" })),
        )
            .into_response(),
    }
}

fn track(id: &str, name: &str, artists: &[&str], popularity: u32) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "popularity": popularity,
        "artists": artists
            .iter()
            .map(|a| json!({ "id": a.to_lowercase(), "name": a }))
            .collect::<Vec<_>>(),
    })
}

async fn recently_played(
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorized(&headers) {
        return r;
    }
    assert_eq!(q.get("limit").map(String::as_str), Some("50"));
    assert!(q.get("after").and_then(|a| a.parse::<i64>().ok()).is_some());

    Json(json!({
        "items": [
            { "track": track("t1", "Hey Jude", &["The Beatles"], 80), "played_at": "2024-05-01T10:00:00Z" }
        ],
        "next": null,
        "cursors": { "after": "1", "before": "0" }
    }))
    .into_response()
}

async fn top_tracks(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Err(r) = authorized(&headers) {
        return r;
    }
    assert_eq!(q.get("time_range").map(String::as_str), Some("short_term"));
    assert_eq!(q.get("limit").map(String::as_str), Some("50"));

    Json(json!({
        "items": [
            track("t1", "Bohemian Rhapsody", &["Queen"], 90),
            track("t2", "Africa", &["Toto"], 85)
        ],
        "total": 2
    }))
    .into_response()
}

async fn top_artists(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Err(r) = authorized(&headers) {
        return r;
    }
    let items = if q.get("limit").map(String::as_str) == Some("1") {
        assert_eq!(q.get("time_range").map(String::as_str), Some("medium_term"));
        vec![json!({ "id": "artist-1", "name": "Daft Punk", "genres": ["french house"], "popularity": 80 })]
    } else {
        assert_eq!(q.get("limit").map(String::as_str), Some("20"));
        vec![
            json!({ "id": "artist-1", "name": "Daft Punk", "genres": ["french house", "electro"], "popularity": 80 }),
            json!({ "id": "artist-2", "name": "Björk", "genres": [], "popularity": 70 }),
        ]
    };
    let total = items.len();
    Json(json!({ "items": items, "total": total })).into_response()
}

async fn recommendations(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Err(r) = authorized(&headers) {
        return r;
    }
    assert_eq!(q.get("seed_artists").map(String::as_str), Some("artist-1"));
    assert_eq!(q.get("seed_genres").map(String::as_str), Some("pop,dance"));
    assert_eq!(q.get("limit").map(String::as_str), Some("20"));

    Json(json!({ "tracks": [track("r1", "Get Lucky", &["Daft Punk", "Pharrell Williams"], 75)] }))
        .into_response()
}

async fn spawn_stub_spotify() -> SocketAddr {
    let app = Router::new()
        .route("/api/token", post(token_endpoint))
        .route("/v1/me/player/recently-played", get(recently_played))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/me/top/artists", get(top_artists))
        .route("/v1/recommendations", get(recommendations));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ============================================================================
// Helpers
// ============================================================================

async fn test_app() -> (Router, AppState) {
    let stub = spawn_stub_spotify().await;
    app_with_token_url(stub, format!("http://{stub}/api/token"))
}

fn app_with_token_url(stub: SocketAddr, token_url: String) -> (Router, AppState) {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SPOTIFY_API_AUTH_CLIENT_ID", CLIENT_ID.to_string()),
        ("SPOTIFY_API_AUTH_CLIENT_SECRET", CLIENT_SECRET.to_string()),
        ("SPOTIFY_API_AUTH_SCOPE", SCOPE.to_string()),
        ("SPOTIFY_API_AUTH_URL", AUTH_URL.to_string()),
        ("SPOTIFY_API_TOKEN_URL", token_url),
        ("SPOTIFY_API_URL", format!("http://{stub}/v1")),
    ]);
    let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
    let state = AppState::new(config).unwrap();
    (build_router(state.clone()), state)
}

async fn get_page(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` of the session cookie set by the response, if any.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
        .next()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Runs the full login and returns the session cookie.
async fn login(app: &Router) -> String {
    let response = get_page(app, "/", None).await;
    let cookie = session_cookie(&response).unwrap();
    let state = query_param(&location(&response), "state").unwrap();

    let response = get_page(
        app,
        &format!("/callback?code=good-code&state={state}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    cookie
}

/// Installs a session holding `token` directly in the store.
async fn session_with_token(state: &AppState, token: TokenInfo) -> String {
    let (_, mut ctx): (CookieJar, SessionContext) = state.sessions.resolve(CookieJar::new()).await;
    ctx.data.token_info = Some(token);
    state.sessions.save(&ctx).await;
    format!("{SESSION_COOKIE_NAME}={}", ctx.id)
}

fn expired_token(access_token: &str, refresh_token: Option<&str>) -> TokenInfo {
    TokenInfo {
        access_token: access_token.into(),
        token_type: "Bearer".into(),
        scope: SCOPE.into(),
        expires_in: 3600,
        expires_at: chrono::Utc::now().timestamp() - 10,
        refresh_token: refresh_token.map(str::to_string),
    }
}

const DATA_ROUTES: [&str; 4] = [
    "/recently_played",
    "/top_tracks",
    "/top_artists",
    "/recommendations",
];

// ============================================================================
// Login flow
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_routes_redirect_to_provider() {
    let (app, _) = test_app().await;

    for uri in ["/"].into_iter().chain(DATA_ROUTES) {
        let response = get_page(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");

        let target = location(&response);
        assert!(target.starts_with(AUTH_URL), "{uri} -> {target}");
        assert_eq!(query_param(&target, "client_id").as_deref(), Some(CLIENT_ID));
        assert_eq!(query_param(&target, "scope").as_deref(), Some(SCOPE));
        assert!(query_param(&target, "state").is_some());
        assert!(session_cookie(&response).is_some());
    }
}

#[tokio::test]
async fn test_state_nonce_round_trips() {
    let (app, state) = test_app().await;

    let response = get_page(&app, "/", None).await;
    let cookie = session_cookie(&response).unwrap();
    let sent = query_param(&location(&response), "state").unwrap();

    let id = cookie.split_once('=').unwrap().1;
    let stored = state.sessions.get(id).await.unwrap();
    assert_eq!(stored.state.as_deref(), Some(sent.as_str()));

    // Redirecting again keeps the same nonce for the same session
    let response = get_page(&app, "/top_tracks", Some(&cookie)).await;
    assert_eq!(query_param(&location(&response), "state"), Some(sent.clone()));

    let response = get_page(
        &app,
        &format!("/callback?code=good-code&state={sent}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let stored = state.sessions.get(id).await.unwrap();
    assert!(stored.state.is_none());
    assert_eq!(stored.token_info.unwrap().access_token, "access-1");
}

#[tokio::test]
async fn test_callback_rejects_wrong_state() {
    let (app, state) = test_app().await;

    let response = get_page(&app, "/", None).await;
    let cookie = session_cookie(&response).unwrap();

    let response = get_page(&app, "/callback?code=good-code&state=forged", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("State mismatch"));

    let id = cookie.split_once('=').unwrap().1;
    assert!(state.sessions.get(id).await.unwrap().token_info.is_none());
}

#[tokio::test]
async fn test_callback_without_session_is_rejected() {
    let (app, _) = test_app().await;

    let response = get_page(&app, "/callback?code=good-code&state=whatever", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let (app, _) = test_app().await;

    let response = get_page(&app, "/callback?state=abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_text(response)
            .await
            .contains("Authorization code not found in request.")
    );
}

#[tokio::test]
async fn test_callback_reports_denied_authorization() {
    let (app, _) = test_app().await;

    let response = get_page(&app, "/callback?error=access_denied&state=abc", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_text(response).await;
    assert!(body.contains("access_denied"));
    assert!(body.contains(r#"<a href="/">Back to Home</a>"#));
}

#[tokio::test]
async fn test_callback_reports_rejected_code() {
    let (app, _) = test_app().await;

    let response = get_page(&app, "/", None).await;
    let cookie = session_cookie(&response).unwrap();
    let sent = query_param(&location(&response), "state").unwrap();

    let response = get_page(
        &app,
        &format!("/callback?code=bad-code&state={sent}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Invalid authorization code"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (app, state) = test_app().await;
    let cookie = login(&app).await;

    let response = get_page(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_page(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let removal = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(removal.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));

    let id = cookie.split_once('=').unwrap().1;
    assert!(state.sessions.get(id).await.is_none());

    // The old cookie no longer grants access
    let response = get_page(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with(AUTH_URL));
    assert_ne!(session_cookie(&response), Some(cookie));
}

// ============================================================================
// Data routes
// ============================================================================

#[tokio::test]
async fn test_dashboard_renders_after_login() {
    let (app, _) = test_app().await;
    let cookie = login(&app).await;

    let response = get_page(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Welcome to Wrapped"));
    assert!(body.contains(r#"href="/logout""#));
}

#[tokio::test]
async fn test_data_routes_render_with_valid_token() {
    let (app, _) = test_app().await;
    let cookie = login(&app).await;

    let expectations = [
        (
            "/recently_played",
            "Hey Jude by The Beatles - Played at: 2024-05-01T10:00:00Z",
        ),
        ("/top_tracks", "2. Africa by Toto - Popularity: 85"),
        ("/top_artists", "1. Daft Punk - Genres: french house, electro"),
        (
            "/recommendations",
            "1. Get Lucky by Daft Punk, Pharrell Williams",
        ),
    ];

    for (uri, expected) in expectations {
        let response = get_page(&app, uri, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_text(response).await;
        assert!(body.contains(expected), "{uri}: {body}");
        assert!(body.contains("Back to Home"));
    }
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let (app, state) = test_app().await;
    let cookie = session_with_token(&state, expired_token("stale", Some("refresh-1"))).await;

    let response = get_page(&app, "/top_tracks", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Bohemian Rhapsody"));

    let id = cookie.split_once('=').unwrap().1;
    let token = state.sessions.get(id).await.unwrap().token_info.unwrap();
    assert_eq!(token.access_token, "refreshed-access");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(token.scope, SCOPE);
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_rejected_refresh_shows_error_and_forgets_token() {
    let (app, state) = test_app().await;
    let cookie = session_with_token(&state, expired_token("stale", Some("revoked"))).await;

    let response = get_page(&app, "/top_artists", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("invalid_grant"));

    let id = cookie.split_once('=').unwrap().1;
    assert!(state.sessions.get(id).await.unwrap().token_info.is_none());

    let response = get_page(&app, "/top_artists", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_bad_gateway() {
    let stub = spawn_stub_spotify().await;
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (app, state) = app_with_token_url(stub, format!("http://{closed}/api/token"));
    let cookie = session_with_token(&state, expired_token("stale", Some("refresh-1"))).await;

    let response = get_page(&app, "/top_tracks", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains(r#"<a href="/">Back to Home</a>"#));

    let id = cookie.split_once('=').unwrap().1;
    assert!(state.sessions.get(id).await.unwrap().token_info.is_none());
}

#[tokio::test]
async fn test_expired_token_without_refresh_redirects() {
    let (app, state) = test_app().await;
    let cookie = session_with_token(&state, expired_token("stale", None)).await;

    let response = get_page(&app, "/recently_played", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with(AUTH_URL));
}

#[tokio::test]
async fn test_api_failure_renders_inline_error() {
    let (app, state) = test_app().await;
    let mut token = expired_token("revoked-access", None);
    token.expires_at = chrono::Utc::now().timestamp() + 3600;
    let cookie = session_with_token(&state, token).await;

    for uri in DATA_ROUTES {
        let response = get_page(&app, uri, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{uri}");
        let body = body_text(response).await;
        assert!(body.contains("Access revoked"), "{uri}: {body}");
        assert!(body.contains(r#"<a href="/">Back to Home</a>"#));
    }
}

#[tokio::test]
async fn test_health_reports_status_and_version() {
    let (app, _) = test_app().await;

    let response = get_page(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (app, state) = test_app().await;
    let cookie = login(&app).await;

    // A second browser without cookie is still sent to login
    let response = get_page(&app, "/top_tracks", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(state.sessions.len().await, 2);
    let id = cookie.split_once('=').unwrap().1;
    assert!(state.sessions.get(id).await.unwrap().token_info.is_some());
}
