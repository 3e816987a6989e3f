//! Document manager
//!
//! File layout under the output directory:
//!
//! ```text
//! output/
//!   framework.tex
//!   comments.json
//!   references.json
//!   appendices/appendix_<id>.tex
//!   summary/Technical_Summary.md
//!   questions/Questions_For_You.md
//! ```

use crate::comment::{extract_latex_comments, Comment, CommentStatus};
use crate::error::DocumentError;
use crate::latex::{self, AppendixContent, AppendixRef};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s{}\\%]+").expect("valid regex"));

/// An open question for the human researcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    pub text: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CommentStore {
    comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProcessedReference {
    citation: String,
    processed_at: DateTime<Utc>,
}

/// Manages the LaTeX framework document and its companion files
#[derive(Debug, Clone)]
pub struct DocumentManager {
    output_dir: PathBuf,
}

impl DocumentManager {
    /// Create a manager rooted at the output directory
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path to framework.tex
    #[must_use]
    pub fn framework_path(&self) -> PathBuf {
        self.output_dir.join("framework.tex")
    }

    fn comments_path(&self) -> PathBuf {
        self.output_dir.join("comments.json")
    }

    fn references_path(&self) -> PathBuf {
        self.output_dir.join("references.json")
    }

    fn appendices_dir(&self) -> PathBuf {
        self.output_dir.join("appendices")
    }

    fn summary_path(&self) -> PathBuf {
        self.output_dir.join("summary").join("Technical_Summary.md")
    }

    fn questions_path(&self) -> PathBuf {
        self.output_dir.join("questions").join("Questions_For_You.md")
    }

    /// Write the initial framework document if absent
    ///
    /// Returns true when the seed was written.
    pub fn seed_framework(&self, weights: [(&str, f64); 4]) -> Result<bool, DocumentError> {
        let path = self.framework_path();
        if path.exists() {
            return Ok(false);
        }
        write_atomic(&path, &latex::seed_document(weights))?;
        tracing::info!("seeded framework document at {}", path.display());
        Ok(true)
    }

    /// Current framework source; empty when the document does not exist yet
    pub fn framework_source(&self) -> Result<String, DocumentError> {
        read_or_empty(&self.framework_path())
    }

    /// Append LaTeX to the framework document
    pub fn append_to_framework(&self, tex: &str) -> Result<(), DocumentError> {
        let path = self.framework_path();
        let mut source = read_or_empty(&path)?;
        source.push_str(tex);
        write_atomic(&path, &source)
    }

    /// Comments waiting for a response
    ///
    /// Union of unanswered `%% COMMENT:` markers in the document and
    /// pending dashboard posts. A comment already recorded (answered
    /// or queued) is not yielded twice.
    pub fn pending_comments(&self) -> Result<Vec<Comment>, DocumentError> {
        let store = self.load_comments()?;
        let known: HashMap<&str, CommentStatus> = store
            .comments
            .iter()
            .map(|c| (c.id.as_str(), c.status))
            .collect();

        let mut pending: Vec<Comment> = extract_latex_comments(&self.framework_source()?)
            .into_iter()
            .filter(|c| !known.contains_key(c.id.as_str()))
            .collect();

        pending.extend(
            store
                .comments
                .iter()
                .filter(|c| c.status == CommentStatus::Pending)
                .cloned(),
        );

        Ok(pending)
    }

    /// Every recorded comment, newest last (dashboard listing)
    pub fn all_comments(&self) -> Result<Vec<Comment>, DocumentError> {
        Ok(self.load_comments()?.comments)
    }

    /// Record a dashboard comment
    pub fn add_comment(
        &self,
        text: impl Into<String>,
        section: Option<String>,
    ) -> Result<Comment, DocumentError> {
        let comment = Comment::from_dashboard(text, section);
        let mut store = self.load_comments()?;
        store.comments.push(comment.clone());
        self.save_comments(&store)?;
        Ok(comment)
    }

    /// Store the agent response for a comment and mark it answered
    pub fn record_comment_answer(
        &self,
        comment: &Comment,
        response: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let mut store = self.load_comments()?;
        let response = response.into();

        match store.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => {
                existing.status = CommentStatus::Answered;
                existing.response = Some(response);
            }
            None => {
                let mut answered = comment.clone();
                answered.status = CommentStatus::Answered;
                answered.response = Some(response);
                store.comments.push(answered);
            }
        }

        self.save_comments(&store)
    }

    /// Write a technical appendix for a validation run
    pub fn create_technical_appendix(
        &self,
        validation_id: &str,
        content: &AppendixContent,
    ) -> Result<AppendixRef, DocumentError> {
        let appendix = AppendixRef::for_validation(validation_id);
        let path = self.appendices_dir().join(appendix.file_name());
        write_atomic(&path, &latex::render_appendix(validation_id, content))?;
        Ok(appendix)
    }

    /// Append a validation summary referencing its appendix
    pub fn add_validation_summary(
        &self,
        hypothesis: &str,
        summary: &str,
        appendix: &AppendixRef,
    ) -> Result<(), DocumentError> {
        self.append_to_framework(&latex::render_validation_summary(
            hypothesis, summary, appendix,
        ))
    }

    /// Replace the technical summary markdown
    pub fn update_summary(&self, markdown: &str) -> Result<(), DocumentError> {
        write_atomic(&self.summary_path(), markdown)
    }

    /// Current technical summary; empty when absent
    pub fn summary(&self) -> Result<String, DocumentError> {
        read_or_empty(&self.summary_path())
    }

    /// Append a question for the human researcher
    pub fn push_question(&self, text: &str) -> Result<(), DocumentError> {
        let path = self.questions_path();
        let mut content = read_or_empty(&path)?;
        if content.is_empty() {
            content.push_str("# Questions For You\n\n");
        }
        content.push_str(&format!("- [ ] {text}\n"));
        write_atomic(&path, &content)
    }

    /// Parse open questions out of the questions file
    pub fn open_questions(&self) -> Result<Vec<Question>, DocumentError> {
        let content = read_or_empty(&self.questions_path())?;
        Ok(parse_questions(&content))
    }

    /// URLs referenced in the framework that have not been ingested
    pub fn unprocessed_references(&self) -> Result<Vec<String>, DocumentError> {
        let processed = self.load_references()?;
        let source = self.framework_source()?;

        let mut seen = Vec::new();
        for m in URL_RE.find_iter(&source) {
            let url = m.as_str().trim_end_matches(['.', ',', ')']).to_string();
            if !processed.contains_key(&url) && !seen.contains(&url) {
                seen.push(url);
            }
        }
        Ok(seen)
    }

    /// Record that a reference was ingested, with its citation text
    pub fn mark_reference_processed(
        &self,
        url: &str,
        citation: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let mut processed = self.load_references()?;
        processed.insert(
            url.to_string(),
            ProcessedReference {
                citation: citation.into(),
                processed_at: Utc::now(),
            },
        );

        let path = self.references_path();
        let json = serde_json::to_string_pretty(&processed)
            .map_err(|e| DocumentError::MalformedStore {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        write_atomic(&path, &json)
    }

    fn load_comments(&self) -> Result<CommentStore, DocumentError> {
        let path = self.comments_path();
        let raw = read_or_empty(&path)?;
        if raw.is_empty() {
            return Ok(CommentStore::default());
        }
        serde_json::from_str(&raw).map_err(|e| DocumentError::MalformedStore {
            path,
            reason: e.to_string(),
        })
    }

    fn save_comments(&self, store: &CommentStore) -> Result<(), DocumentError> {
        let path = self.comments_path();
        let json = serde_json::to_string_pretty(store).map_err(|e| {
            DocumentError::MalformedStore {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        write_atomic(&path, &json)
    }

    fn load_references(&self) -> Result<HashMap<String, ProcessedReference>, DocumentError> {
        let path = self.references_path();
        let raw = read_or_empty(&path)?;
        if raw.is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| DocumentError::MalformedStore {
            path,
            reason: e.to_string(),
        })
    }
}

/// Parse markdown task-list items into questions
fn parse_questions(markdown: &str) -> Vec<Question> {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TASKLISTS);

    let mut questions = Vec::new();
    let mut in_item = false;
    let mut current = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Item) => {
                in_item = true;
                current.clear();
            }
            Event::End(TagEnd::Item) => {
                in_item = false;
                let text = current.trim();
                if !text.is_empty() {
                    questions.push(Question {
                        text: text.to_string(),
                    });
                }
            }
            Event::Text(text) if in_item => current.push_str(&text),
            Event::Code(code) if in_item => current.push_str(&code),
            _ => {}
        }
    }

    questions
}

fn read_or_empty(path: &Path) -> Result<String, DocumentError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(DocumentError::io(path, e)),
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocumentError::io(parent, e))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|e| DocumentError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| DocumentError::io(path, e))
}
