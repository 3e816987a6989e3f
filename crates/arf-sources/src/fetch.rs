//! Source fetching
//!
//! YouTube transcripts come from the timedtext endpoint; arXiv
//! abstracts from the export API's Atom feed. Fetches are cached so a
//! reference seen on consecutive cycles costs one round trip.

use crate::classify::SourceKind;
use crate::error::SourceError;
use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static ARXIV_ENTRY_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<entry>.*?<title>(.*?)</title>").expect("valid regex"));

static ARXIV_SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<summary>(.*?)</summary>").expect("valid regex"));

/// Ingested content for one reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedSource {
    /// Original URL
    pub url: String,
    /// Classification
    pub kind: SourceKind,
    /// Best-effort title
    pub title: String,
    /// Transcript or abstract text
    pub body: String,
}

/// Fetches and caches external sources
pub struct SourceFetcher {
    http: reqwest::Client,
    cache: Cache<String, FetchedSource>,
    timedtext_base: String,
    arxiv_base: String,
}

impl SourceFetcher {
    /// Create a fetcher with a one-hour cache
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoints(
            "https://video.google.com/timedtext",
            "https://export.arxiv.org/api/query",
        )
    }

    /// Create a fetcher against custom endpoints (tests)
    #[must_use]
    pub fn with_endpoints(timedtext_base: impl Into<String>, arxiv_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: Cache::builder()
                .max_capacity(256)
                .time_to_live(Duration::from_secs(60 * 60))
                .build(),
            timedtext_base: timedtext_base.into(),
            arxiv_base: arxiv_base.into(),
        }
    }

    /// Fetch a reference, hitting the cache first
    ///
    /// # Errors
    /// - `SourceError::Unsupported` for URLs that classify as `Other`
    /// - `SourceError::NoContent` when the source answers with nothing
    pub async fn fetch(&self, url: &str) -> Result<FetchedSource, SourceError> {
        if let Some(hit) = self.cache.get(url).await {
            tracing::debug!(url, "source cache hit");
            return Ok(hit);
        }

        let kind = SourceKind::classify(url);
        let fetched = match &kind {
            SourceKind::YouTube { video_id } => self.fetch_youtube(url, video_id).await?,
            SourceKind::Arxiv { paper_id } => self.fetch_arxiv(url, paper_id).await?,
            SourceKind::Other => {
                return Err(SourceError::Unsupported {
                    url: url.to_string(),
                })
            }
        };

        self.cache.insert(url.to_string(), fetched.clone()).await;
        Ok(fetched)
    }

    async fn fetch_youtube(&self, url: &str, video_id: &str) -> Result<FetchedSource, SourceError> {
        let endpoint = format!("{}?lang=en&v={}", self.timedtext_base, video_id);
        let xml = self.get_text(url, &endpoint).await?;

        let body = strip_transcript_xml(&xml);
        if body.is_empty() {
            return Err(SourceError::NoContent {
                url: url.to_string(),
            });
        }

        Ok(FetchedSource {
            url: url.to_string(),
            kind: SourceKind::YouTube {
                video_id: video_id.to_string(),
            },
            title: format!("YouTube video {video_id}"),
            body,
        })
    }

    async fn fetch_arxiv(&self, url: &str, paper_id: &str) -> Result<FetchedSource, SourceError> {
        let endpoint = format!("{}?id_list={}", self.arxiv_base, paper_id);
        let atom = self.get_text(url, &endpoint).await?;

        let (title, summary) = parse_arxiv_entry(&atom);
        let Some(summary) = summary else {
            return Err(SourceError::NoContent {
                url: url.to_string(),
            });
        };

        Ok(FetchedSource {
            url: url.to_string(),
            kind: SourceKind::Arxiv {
                paper_id: paper_id.to_string(),
            },
            title: title.unwrap_or_else(|| format!("arXiv:{paper_id}")),
            body: summary,
        })
    }

    async fn get_text(&self, url: &str, endpoint: &str) -> Result<String, SourceError> {
        self.http
            .get(endpoint)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SourceError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .text()
            .await
            .map_err(|e| SourceError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for SourceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten timedtext XML into plain transcript text
fn strip_transcript_xml(xml: &str) -> String {
    let text = TAG_RE.replace_all(xml, " ");
    let unescaped = unescape(&text);
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull the entry title and summary out of an arXiv Atom feed
fn parse_arxiv_entry(atom: &str) -> (Option<String>, Option<String>) {
    let title = ARXIV_ENTRY_TITLE_RE
        .captures(atom)
        .map(|cap| normalize_ws(&unescape(&cap[1])));
    let summary = ARXIV_SUMMARY_RE
        .captures(atom)
        .map(|cap| normalize_ws(&unescape(&cap[1])))
        .filter(|s| !s.is_empty());
    (title, summary)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_xml_flattened() {
        let xml = r#"<?xml version="1.0"?>
<transcript>
  <text start="0.0" dur="2.1">the spectral gap</text>
  <text start="2.1" dur="3.0">pairs &amp; cancels</text>
</transcript>"#;

        let body = strip_transcript_xml(xml);
        assert_eq!(body, "the spectral gap pairs & cancels");
    }

    #[test]
    fn arxiv_entry_parsed_past_feed_title() {
        let atom = r#"<feed>
  <title>ArXiv Query: search_query=...</title>
  <entry>
    <title>Spectral Pairing in Random
      Matrices</title>
    <summary>  We show that eigenvalue gaps pair under a natural involution.
    </summary>
  </entry>
</feed>"#;

        let (title, summary) = parse_arxiv_entry(atom);
        assert_eq!(title.as_deref(), Some("Spectral Pairing in Random Matrices"));
        assert_eq!(
            summary.as_deref(),
            Some("We show that eigenvalue gaps pair under a natural involution.")
        );
    }

    #[test]
    fn missing_summary_is_none() {
        let (_, summary) = parse_arxiv_entry("<feed><entry><title>x</title></entry></feed>");
        assert!(summary.is_none());
    }

    #[tokio::test]
    async fn unsupported_url_rejected() {
        let fetcher = SourceFetcher::new();
        let result = fetcher.fetch("https://example.com/post").await;
        assert!(matches!(result, Err(SourceError::Unsupported { .. })));
    }
}
