//! Reference classification

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static YOUTUBE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid regex"));

static ARXIV_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"arxiv\.org/(?:abs|pdf)/([0-9]{4}\.[0-9]{4,5})(?:v[0-9]+)?").expect("valid regex"));

/// What kind of external source a URL points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A YouTube video
    YouTube {
        /// 11-character video id
        video_id: String,
    },
    /// An arXiv paper
    Arxiv {
        /// Paper id, e.g. "2401.00001"
        paper_id: String,
    },
    /// Anything else; skipped
    Other,
}

impl SourceKind {
    /// Classify a URL
    #[must_use]
    pub fn classify(url: &str) -> Self {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            if let Some(cap) = YOUTUBE_ID_RE.captures(url) {
                return Self::YouTube {
                    video_id: cap[1].to_string(),
                };
            }
        }
        if url.contains("arxiv.org") {
            if let Some(cap) = ARXIV_ID_RE.captures(url) {
                return Self::Arxiv {
                    paper_id: cap[1].to_string(),
                };
            }
        }
        Self::Other
    }

    /// Whether the system knows how to ingest this kind
    #[inline]
    #[must_use]
    pub fn is_ingestible(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_watch_url() {
        let kind = SourceKind::classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(
            kind,
            SourceKind::YouTube {
                video_id: "dQw4w9WgXcQ".to_string()
            }
        );
    }

    #[test]
    fn classifies_short_url() {
        let kind = SourceKind::classify("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(
            kind,
            SourceKind::YouTube {
                video_id: "dQw4w9WgXcQ".to_string()
            }
        );
    }

    #[test]
    fn classifies_arxiv_abs_and_pdf() {
        assert_eq!(
            SourceKind::classify("https://arxiv.org/abs/2401.00001"),
            SourceKind::Arxiv {
                paper_id: "2401.00001".to_string()
            }
        );
        assert_eq!(
            SourceKind::classify("https://arxiv.org/pdf/2401.00001v2"),
            SourceKind::Arxiv {
                paper_id: "2401.00001".to_string()
            }
        );
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(
            SourceKind::classify("https://example.com/blog/post"),
            SourceKind::Other
        );
        assert!(!SourceKind::Other.is_ingestible());
    }

    #[test]
    fn youtube_without_id_is_other() {
        // Domain matches but no 11-character id anywhere
        assert_eq!(SourceKind::classify("https://youtube.com"), SourceKind::Other);
    }
}
