//! HTML pages served by the app.
//!
//! Every piece of text coming from Spotify or from the request is escaped
//! with [`escape_html`] before it is placed in a page.

use crate::{
    types::{Artist, PlayHistory, Track},
    utils::escape_html,
};

const BACK_HOME: &str = r#"<a href="/">Back to Home</a>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn listing(heading: &str, lines: &[String]) -> String {
    page(
        heading,
        &format!(
            "<h2>{heading}</h2>\n{lines}\n<br><br>\n{BACK_HOME}",
            heading = escape_html(heading),
            lines = lines.join("<br>\n"),
        ),
    )
}

pub fn dashboard() -> String {
    page(
        "Wrapped",
        r#"<h1>Welcome to Wrapped</h1>
<p>Select an option below:</p>
<ul>
<li><a href="/recently_played">Recently Played Tracks</a></li>
<li><a href="/top_tracks">Top Tracks</a></li>
<li><a href="/top_artists">Top Artists</a></li>
<li><a href="/recommendations">Get Recommendations</a></li>
</ul>
<br>
<a href="/logout">Logout</a>"#,
    )
}

pub fn recently_played(items: &[PlayHistory]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "{} by {} - Played at: {}",
                escape_html(&item.track.name),
                escape_html(item.track.first_artist()),
                escape_html(&item.played_at),
            )
        })
        .collect();
    listing("Recently Played Tracks", &lines)
}

pub fn top_tracks(tracks: &[Track]) -> String {
    let lines: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            format!(
                "{}. {} by {} - Popularity: {}",
                idx + 1,
                escape_html(&track.name),
                escape_html(track.first_artist()),
                track.popularity,
            )
        })
        .collect();
    listing("Top Tracks", &lines)
}

pub fn top_artists(artists: &[Artist]) -> String {
    let lines: Vec<String> = artists
        .iter()
        .enumerate()
        .map(|(idx, artist)| {
            format!(
                "{}. {} - Genres: {}",
                idx + 1,
                escape_html(&artist.name),
                escape_html(&artist.genres.join(", ")),
            )
        })
        .collect();
    listing("Your Top Artists", &lines)
}

pub fn recommendations(tracks: &[Track]) -> String {
    let lines: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            format!(
                "{}. {} by {}",
                idx + 1,
                escape_html(&track.name),
                escape_html(&track.artist_names()),
            )
        })
        .collect();
    listing("Recommended Tracks", &lines)
}

/// Inline error page with a link back to the dashboard.
pub fn error_page(heading: &str, message: &str) -> String {
    page(
        heading,
        &format!(
            "<h2>{}</h2>\n<p>{}</p>\n<br><br>\n{BACK_HOME}",
            escape_html(heading),
            escape_html(message),
        ),
    )
}
