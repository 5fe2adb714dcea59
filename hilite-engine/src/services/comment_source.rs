//! Comment sources
//!
//! The comment host is reached through [`CommentSource`]. Two sources ship
//! with the engine: a JSON file export and an in-memory list.

use super::ServiceError;
use crate::highlight::CommentItem;
use crate::video_id::VideoId;
use async_trait::async_trait;
use std::path::PathBuf;

/// Provider of top-level comments for a video
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_comments(&self, video: &VideoId) -> Result<Vec<CommentItem>, ServiceError>;
}

/// Comments read from a JSON array of `{text, likeCount}` objects
///
/// The file is re-read on every fetch, whatever video is asked for.
pub struct JsonCommentSource {
    path: PathBuf,
}

impl JsonCommentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CommentSource for JsonCommentSource {
    async fn fetch_comments(&self, video: &VideoId) -> Result<Vec<CommentItem>, ServiceError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let comments: Vec<CommentItem> = serde_json::from_str(&contents)
            .map_err(|e| ServiceError::Parse(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(
            video_id = %video,
            path = %self.path.display(),
            count = comments.len(),
            "Loaded comments from file"
        );
        Ok(comments)
    }
}

/// Fixed comment list
#[derive(Debug, Clone, Default)]
pub struct StaticCommentSource {
    comments: Vec<CommentItem>,
}

impl StaticCommentSource {
    pub fn new(comments: Vec<CommentItem>) -> Self {
        Self { comments }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentSource for StaticCommentSource {
    async fn fetch_comments(&self, _video: &VideoId) -> Result<Vec<CommentItem>, ServiceError> {
        Ok(self.comments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn video() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_json_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"text": "1:30 best part", "likeCount": 50}}, {{"text": "meh", "likeCount": 2}}]"#
        )
        .unwrap();

        let source = JsonCommentSource::new(file.path());
        let comments = source.fetch_comments(&video()).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].like_count, 50);
    }

    #[tokio::test]
    async fn test_json_source_missing_file() {
        let source = JsonCommentSource::new("/nonexistent/comments.json");
        assert!(matches!(
            source.fetch_comments(&video()).await,
            Err(ServiceError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_json_source_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let source = JsonCommentSource::new(file.path());
        assert!(matches!(
            source.fetch_comments(&video()).await,
            Err(ServiceError::Parse(_))
        ));
    }
}
