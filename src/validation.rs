// src/validation.rs
// YouTube URL checks done before anything touches the network.

use regex::Regex;
use thiserror::Error;
use url::Url;

lazy_static::lazy_static! {
    static ref VIDEO_ID_PATTERN: Regex = Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap();
}

/// Registrable YouTube domains. Subdomains of these (www., m., music.) are
/// accepted too.
const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlValidationError {
    #[error("Please enter a YouTube URL")]
    Empty,
    #[error("Please enter a valid YouTube URL")]
    NotYoutube,
}

/// Validate user input as a YouTube URL and return the parsed form.
pub fn validate_youtube_url(input: &str) -> Result<Url, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let url = Url::parse(trimmed).map_err(|_| UrlValidationError::NotYoutube)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlValidationError::NotYoutube);
    }

    match url.host_str() {
        Some(host) if is_youtube_host(host) => Ok(url),
        _ => Err(UrlValidationError::NotYoutube),
    }
}

pub fn is_youtube_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    YOUTUBE_HOSTS.iter().any(|known| {
        host == *known
            || host
                .strip_suffix(known)
                .map_or(false, |prefix| prefix.ends_with('.'))
    })
}

/// Pull the 11-character video id out of a watch, share, or embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
