//! Derives canonical web links from catalog track identifiers.
//!
//! Identifiers arrive in three recognized shapes: a scheme-qualified URI
//! (`spotify:track:<id>`), a web URL carrying the track path segment, or a
//! bare 22-character alphanumeric id. The shapes are tried in that order
//! with explicit string predicates; anything unrecognized yields no link.

use std::collections::HashMap;

const TRACK_URI_SCHEME: &str = "spotify:track:";
const TRACK_URL_SEGMENT: &str = "open.spotify.com/track/";
const BARE_ID_LEN: usize = 22;

/// Canonical track URL for a recognized identifier, `None` otherwise
pub fn track_link_from_uri(uri: &str) -> Option<String> {
    scheme_track_id(uri)
        .or_else(|| web_url_track_id(uri))
        .or_else(|| bare_track_id(uri))
        .map(|id| format!("https://open.spotify.com/track/{id}"))
}

/// Link map carried on search results: `{"spotify": url}` or empty
pub fn track_links(uri: &str) -> HashMap<String, String> {
    track_link_from_uri(uri)
        .map(|url| HashMap::from([("spotify".to_string(), url)]))
        .unwrap_or_default()
}

/// Shape 1: `spotify:track:<id>`
fn scheme_track_id(uri: &str) -> Option<&str> {
    leading_id(uri.strip_prefix(TRACK_URI_SCHEME)?)
}

/// Shape 2: an http(s) URL containing the track path segment
fn web_url_track_id(uri: &str) -> Option<&str> {
    if !uri.starts_with("http://") && !uri.starts_with("https://") {
        return None;
    }
    let start = uri.find(TRACK_URL_SEGMENT)? + TRACK_URL_SEGMENT.len();
    leading_id(&uri[start..])
}

/// Shape 3: a bare fixed-length alphanumeric id
fn bare_track_id(uri: &str) -> Option<&str> {
    (uri.len() == BARE_ID_LEN && uri.bytes().all(|b| b.is_ascii_alphanumeric())).then_some(uri)
}

/// Longest leading alphanumeric run, if non-empty
fn leading_id(s: &str) -> Option<&str> {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}
