//! Server-side session store.
//!
//! A browser is identified by an opaque random id kept in the
//! `wrapped_session` cookie; everything else lives in memory on the server.
//! Handlers resolve a [`SessionContext`] at the start of a request, mutate its
//! [`SessionData`] and write it back with [`SessionStore::save`]. Concurrent
//! requests from the same browser are not serialized: the last save wins.

use std::{collections::HashMap, sync::Arc};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::{types::TokenInfo, utils};

pub const SESSION_COOKIE_NAME: &str = "wrapped_session";

/// Everything the app remembers about one browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// CSRF nonce sent as `state` with the pending authorization request.
    pub state: Option<String>,
    /// Tokens obtained at the callback, refreshed in place.
    pub token_info: Option<TokenInfo>,
}

impl SessionData {
    /// Returns the pending state nonce, creating one if none exists yet.
    pub fn ensure_state(&mut self) -> String {
        self.state
            .get_or_insert_with(utils::generate_state_nonce)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.token_info.is_none()
    }

    pub fn clear(&mut self) {
        self.state = None;
        self.token_info = None;
    }
}

/// A session as seen by a single request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub data: SessionData,
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    last_seen: DateTime<Utc>,
}

/// In-memory map from session id to session data.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    idle_timeout: TimeDelta,
}

impl SessionStore {
    pub fn new(idle_timeout: TimeDelta) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Finds the session named by the cookie jar or starts a new one.
    ///
    /// A fresh session gets a new id and the returned jar carries its cookie.
    /// Unknown or expired ids are replaced rather than reused, so a browser
    /// can never choose its own session id.
    pub async fn resolve(&self, jar: CookieJar) -> (CookieJar, SessionContext) {
        if let Some(id) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) {
            let now = Utc::now();
            let mut sessions = self.inner.write().await;
            if let Some(entry) = sessions.get_mut(&id) {
                if now - entry.last_seen <= self.idle_timeout {
                    entry.last_seen = now;
                    let data = entry.data.clone();
                    return (jar, SessionContext { id, data });
                }
                sessions.remove(&id);
            }
        }

        self.prune().await;

        let id = utils::generate_session_id();
        self.inner.write().await.insert(
            id.clone(),
            Entry {
                data: SessionData::default(),
                last_seen: Utc::now(),
            },
        );

        let jar = jar.add(session_cookie(&id));
        (
            jar,
            SessionContext {
                id,
                data: SessionData::default(),
            },
        )
    }

    /// Looks up a session without creating or touching it.
    pub async fn get(&self, id: &str) -> Option<SessionData> {
        self.inner.read().await.get(id).map(|e| e.data.clone())
    }

    /// Writes the request's view of the session back to the store.
    ///
    /// A session destroyed in the meantime stays gone; returns whether the
    /// write happened.
    pub async fn save(&self, ctx: &SessionContext) -> bool {
        match self.inner.write().await.get_mut(&ctx.id) {
            Some(entry) => {
                entry.data = ctx.data.clone();
                entry.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Removes a session and returns a jar that deletes its cookie.
    pub async fn destroy(&self, jar: CookieJar) -> CookieJar {
        if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
            self.inner.write().await.remove(cookie.value());
        }
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"))
    }

    /// Drops every session idle for longer than the configured timeout.
    pub async fn prune(&self) -> usize {
        let cutoff = Utc::now() - self.idle_timeout;
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen >= cutoff);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}
