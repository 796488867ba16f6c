use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;

/// How far back the recently played view looks.
pub const RECENTLY_PLAYED_WINDOW_DAYS: i64 = 90;

/// Random CSRF nonce sent as the OAuth `state` parameter: 16 bytes, hex encoded.
pub fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Opaque session identifier: 32 random bytes, URL-safe base64 without padding.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lower bound for the recently played query, in epoch milliseconds.
pub fn recently_played_after(now: DateTime<Utc>) -> i64 {
    (now - TimeDelta::days(RECENTLY_PLAYED_WINDOW_DAYS)).timestamp_millis()
}

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Constant-time string comparison for secrets such as the state nonce.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
