//! Video URL recognition
//!
//! Accepted shapes:
//! - `https://www.youtube.com/watch?v=ID` (extra query parameters allowed)
//! - `https://youtu.be/ID`
//! - `https://www.youtube.com/shorts/ID`
//! - `https://www.youtube.com/embed/ID`
//! - `https://www.youtube.com/live/ID`
//! - a bare 11-character video id

use crate::error::{EngineError, EngineResult};
use regex::Regex;
use std::sync::OnceLock;

const URL_PATTERNS: [&str; 3] = [
    r"(?:youtube\.com/watch\?(?:[^#\s]*&)?v=|youtu\.be/)([\w-]+)",
    r"youtube\.com/(?:shorts|embed|live)/([\w-]+)",
    r"^([\w-]{11})$",
];

fn url_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        URL_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Video identifier extracted from a user-entered URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video id from any recognised URL shape
    pub fn parse(url: &str) -> EngineResult<Self> {
        let trimmed = url.trim();
        url_regexes()
            .iter()
            .find_map(|re| re.captures(trimmed))
            .and_then(|caps| caps.get(1))
            .map(|m| VideoId(m.as_str().to_string()))
            .ok_or_else(|| EngineError::InvalidUrl(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `watch?v=` form of the URL; the analysis backend keys its jobs by
    /// video id only for this shape
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_url_shapes() {
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=10", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ?t=42", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/shorts/abc_DEF-123", "abc_DEF-123"),
            ("https://www.youtube.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/live/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("  dQw4w9WgXcQ  ", "dQw4w9WgXcQ"),
        ];
        for (url, expected) in cases {
            assert_eq!(VideoId::parse(url).unwrap().as_str(), expected, "{}", url);
        }
    }

    #[test]
    fn test_unrecognised_url() {
        assert!(matches!(
            VideoId::parse("https://example.com/video/1"),
            Err(EngineError::InvalidUrl(_))
        ));
        assert!(VideoId::parse("").is_err());
    }

    #[test]
    fn test_watch_url_normalizes_embed_and_live() {
        for url in [
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        ] {
            assert_eq!(
                VideoId::parse(url).unwrap().watch_url(),
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            );
        }
    }
}
