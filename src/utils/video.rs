//! YouTube and Instagram URL helpers for embedded videos.

use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=|shorts/)([^#&?]*).*")
        .expect("valid youtube regex")
});

const YOUTUBE_ID_LEN: usize = 11;

/// Extract the 11-character YouTube video id from any common URL shape.
pub fn youtube_id(url: &str) -> Option<&str> {
    let id = YOUTUBE_ID_RE.captures(url)?.get(2)?.as_str();
    (id.len() == YOUTUBE_ID_LEN).then_some(id)
}

pub fn youtube_thumbnail(id: &str) -> String {
    format!("https://img.youtube.com/vi/{id}/hqdefault.jpg")
}

pub fn is_instagram_reel(url: &str) -> bool {
    url.contains("instagram.com/reel/")
}

/// Embeddable form of an Instagram reel URL, or `None` for other URLs.
pub fn instagram_embed_url(url: &str) -> Option<String> {
    if !is_instagram_reel(url) {
        return None;
    }
    if url.contains("/embed") {
        return Some(url.to_string());
    }
    let clean = url.split('?').next().unwrap_or(url);
    if clean.ends_with('/') {
        Some(format!("{clean}embed"))
    } else {
        Some(format!("{clean}/embed"))
    }
}

/// Best embeddable URL for a stored video link.
pub fn embed_url(url: &str) -> String {
    if let Some(embed) = instagram_embed_url(url) {
        return embed;
    }
    if url.contains("youtube.com") || url.contains("youtu.be") {
        if let Some(id) = youtube_id(url) {
            return format!("https://www.youtube.com/embed/{id}");
        }
    }
    url.to_string()
}
