//! Timestamp extraction from viewer comments
//!
//! Comments arrive already flattened from the external comment source.
//! This module finds `M:SS` / `MM:SS` / `H:MM:SS` substrings in the text.

use hilite_common::time_codec::timestamp_to_seconds;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const TIMESTAMP_PATTERN: &str = r"\b(?:\d{1,2}:)?\d{1,2}:[0-5]\d\b";

/// One flattened comment from the comment source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentItem {
    pub text: String,
    #[serde(rename = "likeCount", alias = "like_count", default)]
    pub like_count: u64,
}

impl CommentItem {
    pub fn new(text: impl Into<String>, like_count: u64) -> Self {
        Self {
            text: text.into(),
            like_count,
        }
    }
}

/// A timestamp mentioned in a comment, with that comment's like count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentTimestamp {
    pub time: f64,
    pub like_count: u64,
}

fn timestamp_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).ok()).as_ref()
}

/// Find all timestamps in `text`, in order of appearance
///
/// A timestamp repeated within the same comment is reported once.
pub fn extract_timestamps(text: &str) -> Vec<f64> {
    let Some(re) = timestamp_regex() else {
        return Vec::new();
    };

    let mut times: Vec<f64> = Vec::new();
    for m in re.find_iter(text) {
        let seconds = timestamp_to_seconds(m.as_str());
        if !times.contains(&seconds) {
            times.push(seconds);
        }
    }
    times
}

/// Extract timestamps from every comment
pub fn extract_from_comments(comments: &[CommentItem]) -> Vec<CommentTimestamp> {
    comments
        .iter()
        .flat_map(|comment| {
            extract_timestamps(&comment.text)
                .into_iter()
                .map(move |time| CommentTimestamp {
                    time,
                    like_count: comment.like_count,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_second_forms() {
        assert_eq!(extract_timestamps("great at 1:30"), vec![90.0]);
        assert_eq!(extract_timestamps("12:05 is the best"), vec![725.0]);
        assert_eq!(extract_timestamps("see 01:05"), vec![65.0]);
    }

    #[test]
    fn test_hour_form() {
        assert_eq!(extract_timestamps("skip to 1:02:05"), vec![3725.0]);
    }

    #[test]
    fn test_multiple_and_repeated() {
        assert_eq!(
            extract_timestamps("0:45 then 2:10 and again 0:45"),
            vec![45.0, 130.0]
        );
    }

    #[test]
    fn test_rejects_non_timestamps() {
        assert!(extract_timestamps("no times here").is_empty());
        assert!(extract_timestamps("ratio 3:7").is_empty());
        assert!(extract_timestamps("1:75").is_empty());
        assert!(extract_timestamps("123:45").is_empty());
    }

    #[test]
    fn test_extract_from_comments_keeps_likes() {
        let comments = vec![
            CommentItem::new("great at 1:30", 40),
            CommentItem::new("nothing", 99),
            CommentItem::new("love 1:35", 12),
        ];
        let found = extract_from_comments(&comments);
        assert_eq!(
            found,
            vec![
                CommentTimestamp {
                    time: 90.0,
                    like_count: 40
                },
                CommentTimestamp {
                    time: 95.0,
                    like_count: 12
                },
            ]
        );
    }

    #[test]
    fn test_comment_json_shape() {
        let item: CommentItem =
            serde_json::from_str(r#"{"text": "wow 3:00", "likeCount": 7}"#).unwrap();
        assert_eq!(item.like_count, 7);
    }
}
