//! Highlight aggregation: clustering, normalization and priority merge

pub mod clusterer;
pub mod comment_extractor;
pub mod merger;
pub mod normalizer;

pub use clusterer::{Cluster, ProximityClusterer};
pub use comment_extractor::{extract_from_comments, extract_timestamps, CommentItem, CommentTimestamp};
pub use merger::PriorityMerger;
pub use normalizer::SourceNormalizer;
