//! Comments on the research document
//!
//! Comments arrive two ways: `%% COMMENT: <text>` markers typed into
//! the LaTeX source, and JSON posts from the dashboard. Marker
//! comments get a content-derived id so repeated scans of the same
//! file see the same comment exactly once.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

static LATEX_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%% COMMENT: (.*)").expect("valid regex"));

/// Where a comment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSource {
    /// `%% COMMENT:` marker in framework.tex
    Latex,
    /// Dashboard POST
    Dashboard,
}

/// Lifecycle of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    /// Waiting for an agent response
    Pending,
    /// Answered; response stored alongside
    Answered,
}

/// A user comment awaiting (or holding) an agent response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Stable identifier
    pub id: String,
    /// Comment text
    pub text: String,
    /// Document section the comment targets
    #[serde(default = "default_section")]
    pub section: String,
    /// Origin
    pub source: CommentSource,
    /// When it was first seen
    pub timestamp: DateTime<Utc>,
    /// Lifecycle state
    pub status: CommentStatus,
    /// Agent response once answered
    #[serde(default)]
    pub response: Option<String>,
}

fn default_section() -> String {
    "general".to_string()
}

impl Comment {
    /// Create a dashboard comment
    #[must_use]
    pub fn from_dashboard(text: impl Into<String>, section: Option<String>) -> Self {
        let text = text.into();
        Self {
            id: comment_id(&text),
            section: section.unwrap_or_else(default_section),
            source: CommentSource::Dashboard,
            timestamp: Utc::now(),
            status: CommentStatus::Pending,
            response: None,
            text,
        }
    }

    /// Create a comment from a LaTeX marker
    #[must_use]
    pub fn from_latex(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: comment_id(&text),
            section: default_section(),
            source: CommentSource::Latex,
            timestamp: Utc::now(),
            status: CommentStatus::Pending,
            response: None,
            text,
        }
    }
}

/// Stable content-derived comment id (sha256 prefix)
#[must_use]
pub fn comment_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..8])
}

/// Extract `%% COMMENT:` marker comments from LaTeX source
#[must_use]
pub fn extract_latex_comments(tex: &str) -> Vec<Comment> {
    LATEX_COMMENT_RE
        .captures_iter(tex)
        .filter_map(|cap| {
            let text = cap.get(1)?.as_str().trim();
            if text.is_empty() {
                None
            } else {
                Some(Comment::from_latex(text))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_extraction_finds_markers() {
        let tex = r"\section{Intro}
%% COMMENT: is the pairing forced by symmetry?
Some body text.
%% COMMENT: please validate lemma 2
";
        let comments = extract_latex_comments(tex);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "is the pairing forced by symmetry?");
        assert_eq!(comments[1].source, CommentSource::Latex);
    }

    #[test]
    fn empty_marker_skipped() {
        let comments = extract_latex_comments("%% COMMENT: \n");
        assert!(comments.is_empty());
    }

    #[test]
    fn ids_stable_across_scans() {
        let a = extract_latex_comments("%% COMMENT: same words\n");
        let b = extract_latex_comments("%% COMMENT: same words\n");
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn ids_differ_for_different_text() {
        assert_ne!(comment_id("alpha"), comment_id("beta"));
    }

    #[test]
    fn dashboard_comment_defaults() {
        let c = Comment::from_dashboard("what about torsion?", None);
        assert_eq!(c.section, "general");
        assert_eq!(c.status, CommentStatus::Pending);
        assert!(c.response.is_none());
    }
}
