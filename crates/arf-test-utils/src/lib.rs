//! Testing utilities for the ARF workspace
//!
//! Shared fixtures: scripted completers, sample chat exports, and
//! temporary workspace layouts.

#![allow(missing_docs)]

use arf_model::{Completer, CompletionRequest, CompletionResponse, ModelError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A completer answering from a fixed script (FIFO)
///
/// Runs dry with `ModelError::NoModelAvailable`, which crews surface
/// as a task failure - useful for abort-path tests too.
pub struct MockCompleter {
    answers: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompleter {
    pub fn new(answers: Vec<&str>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().rev().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many answers remain scripted
    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Completer for MockCompleter {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        self.requests.lock().unwrap().push(request);
        let content = self
            .answers
            .lock()
            .unwrap()
            .pop()
            .ok_or(ModelError::NoModelAvailable)?;
        Ok(CompletionResponse {
            model: "mock".to_string(),
            content,
            tokens_used: 1,
        })
    }
}

/// A temporary ARF workspace with the runtime directory layout
pub struct TempArf {
    dir: tempfile::TempDir,
}

impl TempArf {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp workspace");
        let arf = Self { dir };
        for sub in ["input", "output", "state"] {
            std::fs::create_dir_all(arf.root().join(sub)).expect("create workspace dirs");
        }
        arf
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join("state")
    }

    /// Drop a chat export into the input directory
    pub fn write_export(&self, file_name: &str, json: &str) -> PathBuf {
        let path = self.input_dir().join(file_name);
        std::fs::write(&path, json).expect("write export");
        path
    }
}

impl Default for TempArf {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal ChatGPT-style export with one user/assistant exchange
pub fn sample_export_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "mapping": {
            "msg-1": {
                "message": {
                    "author": {"role": "user"},
                    "content": {"parts": ["Could the eigenvalue gaps pair under an involution?"]},
                    "create_time": 100.0
                }
            },
            "msg-2": {
                "message": {
                    "author": {"role": "assistant"},
                    "content": {"parts": ["Yes - define the dual map and the gaps cancel pairwise."]},
                    "create_time": 160.0
                }
            }
        }
    })
    .to_string()
}

/// Scripted answers driving one export pipeline run to completion:
/// one accepted testable concept, one rejected, a question for the
/// researcher.
pub fn scripted_pipeline_answers() -> Vec<&'static str> {
    vec![
        // analyst
        "CONCEPT|hypothesis|Gap pairing|Eigenvalue gaps pair under the involution|testable\n\
         CONCEPT|conjecture|Weak bound|The constant is at most 2|no",
        // theorist
        "RATING|Gap pairing|0.9|0.8|0.85|0.7\n\
         RATING|Weak bound|0.4|0.3|0.5|0.2",
        // communicator
        "Gap pairing means every spectral gap has a partner of equal size.",
        // scribe
        "\\subsection{Gap pairing}\nEigenvalue gaps pair under the involution.\n\
         QUESTION|Is the involution unique up to conjugation?",
    ]
}
