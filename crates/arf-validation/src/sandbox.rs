//! Experiment sandbox
//!
//! Scripts run under the configured interpreter with a cleared
//! environment (PATH and HOME pass through) and a hard timeout; a run
//! that exceeds the timeout is killed and reported unsuccessful.

use crate::error::ValidationError;
use crate::request::{ScriptSpec, ValidationOutcome, ValidationRequest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Sandbox directories and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Where scripts are materialized
    pub scripts_dir: PathBuf,
    /// Where results land
    pub results_dir: PathBuf,
    /// Dataset cache
    pub data_dir: PathBuf,
    /// Hard per-run timeout in seconds
    pub timeout_secs: u64,
    /// Interpreter binary
    pub interpreter: String,
}

impl SandboxConfig {
    /// Default layout rooted at a base directory
    #[must_use]
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            scripts_dir: base.join("validation_scripts"),
            results_dir: base.join("validation_results"),
            data_dir: base.join("validation_data"),
            timeout_secs: 300,
            interpreter: "python3".to_string(),
        }
    }

    /// With a different timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With a different interpreter
    #[inline]
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }
}

/// A dataset an experiment needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Cache key and file name
    pub name: String,
    /// Where to fetch it from
    pub url: String,
}

/// Runs validation experiments
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: SandboxConfig,
    http: reqwest::Client,
}

impl ValidationEngine {
    /// Create an engine, ensuring the sandbox directories exist
    pub fn new(config: SandboxConfig) -> Result<Self, ValidationError> {
        for dir in [&config.scripts_dir, &config.results_dir, &config.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ValidationError::io(dir, e))?;
        }
        Ok(Self {
            config,
            http: reqwest::Client::new(),
        })
    }

    /// Sandbox configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Write the experiment script for a request
    pub fn materialize_script(
        &self,
        request: &ValidationRequest,
        spec: &ScriptSpec,
    ) -> Result<PathBuf, ValidationError> {
        let path = self
            .config
            .scripts_dir
            .join(format!("validate_{}.py", request.id));
        let script = spec.render(&request.hypothesis.statement);
        std::fs::write(&path, script).map_err(|e| ValidationError::io(&path, e))?;
        tracing::debug!(script = %path.display(), "materialized validation script");
        Ok(path)
    }

    /// Execute a materialized script
    ///
    /// Never outlives the configured timeout: on expiry the child is
    /// killed and the outcome reports `timed_out = true`.
    pub async fn execute(
        &self,
        request: &ValidationRequest,
        script: &Path,
    ) -> Result<ValidationOutcome, ValidationError> {
        let started = Instant::now();

        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(script)
            .current_dir(&self.config.results_dir)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for var in ["PATH", "HOME"] {
            if let Ok(value) = std::env::var(var) {
                command.env(var, value);
            }
        }

        let mut child = command.spawn().map_err(|e| ValidationError::Spawn {
            interpreter: self.config.interpreter.clone(),
            source: e,
        })?;

        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr piped");
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf).await;
            buf
        });

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let (success, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (status.success(), false),
            Ok(Err(e)) => {
                tracing::warn!(id = %request.id, "wait failed: {}", e);
                (false, false)
            }
            Err(_) => {
                tracing::warn!(id = %request.id, "validation timed out, killing");
                let _ = child.kill().await;
                (false, true)
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

        Ok(ValidationOutcome {
            id: request.id,
            success,
            stdout,
            stderr,
            duration_ms: started.elapsed().as_millis() as u64,
            timed_out,
        })
    }

    /// Download and cache a dataset; an existing cache entry wins
    pub async fn cache_dataset(&self, spec: &DatasetSpec) -> Result<PathBuf, ValidationError> {
        let path = self.config.data_dir.join(&spec.name);
        if path.exists() {
            return Ok(path);
        }

        tracing::info!(name = %spec.name, "downloading dataset");
        let response = self
            .http
            .get(&spec.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ValidationError::Fetch {
                url: spec.url.clone(),
                source: e,
            })?;
        let bytes = response.bytes().await.map_err(|e| ValidationError::Fetch {
            url: spec.url.clone(),
            source: e,
        })?;

        std::fs::write(&path, &bytes).map_err(|e| ValidationError::io(&path, e))?;
        Ok(path)
    }

    /// Remove sandbox leftovers older than one day
    pub fn cleanup_stale(&self) -> Result<usize, ValidationError> {
        let cutoff = std::time::SystemTime::now() - Duration::from_secs(24 * 60 * 60);
        let mut removed = 0;

        for dir in [&self.config.scripts_dir, &self.config.results_dir] {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ValidationError::io(dir, e)),
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let stale = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .map(|mtime| mtime < cutoff)
                    .unwrap_or(false);
                if !stale {
                    continue;
                }

                let result = if path.is_dir() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                match result {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!("failed to remove {}: {}", path.display(), e),
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "cleaned stale sandbox entries");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arf_philosophy::{ConceptId, Hypothesis, HypothesisId};
    use chrono::Utc;

    // Execution tests drive the sandbox through `sh` so they do not
    // depend on a Python install; the engine only cares that the
    // configured interpreter runs the script file.
    fn engine(timeout_secs: u64) -> (ValidationEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = SandboxConfig::rooted_at(dir.path())
            .with_timeout_secs(timeout_secs)
            .with_interpreter("sh");
        (ValidationEngine::new(config).unwrap(), dir)
    }

    fn request() -> ValidationRequest {
        ValidationRequest::new(Hypothesis {
            id: HypothesisId::new(),
            statement: "gaps pair".to_string(),
            concept_id: ConceptId::new(),
            proposed_at: Utc::now(),
        })
    }

    #[test]
    fn script_materialized_under_request_id() {
        let (engine, _dir) = engine(300);
        let request = request();
        let path = engine
            .materialize_script(&request, &ScriptSpec::default())
            .unwrap();

        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(&request.id.to_string()));
    }

    #[tokio::test]
    async fn successful_run_captures_stdout() {
        let (engine, _dir) = engine(30);
        let request = request();

        let script = engine.config.scripts_dir.join("ok.sh");
        std::fs::write(&script, "echo 'hello from sandbox'\n").unwrap();

        let outcome = engine.execute(&request, &script).await.unwrap();
        assert!(outcome.success);
        assert!(!outcome.timed_out);
        assert!(outcome.stdout.contains("hello from sandbox"));
    }

    #[tokio::test]
    async fn failing_run_captures_stderr() {
        let (engine, _dir) = engine(30);
        let request = request();

        let script = engine.config.scripts_dir.join("bad.sh");
        std::fs::write(&script, "echo boom >&2\nexit 3\n").unwrap();

        let outcome = engine.execute(&request, &script).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.stderr.contains("boom"));
    }

    #[tokio::test]
    async fn sleeping_run_is_killed_at_timeout() {
        let (engine, _dir) = engine(1);
        let request = request();

        let script = engine.config.scripts_dir.join("sleep.sh");
        std::fs::write(&script, "sleep 60\n").unwrap();

        let started = Instant::now();
        let outcome = engine.execute(&request, &script).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.timed_out);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_interpreter_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = SandboxConfig::rooted_at(dir.path())
            .with_interpreter("arf-no-such-interpreter");
        let engine = ValidationEngine::new(config).unwrap();
        let request = request();

        let script = engine.config.scripts_dir.join("x.sh");
        std::fs::write(&script, "echo hi\n").unwrap();

        let result = engine.execute(&request, &script).await;
        assert!(matches!(result, Err(ValidationError::Spawn { .. })));
    }

    #[test]
    fn cleanup_ignores_fresh_entries() {
        let (engine, _dir) = engine(300);
        std::fs::write(engine.config.scripts_dir.join("fresh.py"), "x = 1\n").unwrap();

        let removed = engine.cleanup_stale().unwrap();
        assert_eq!(removed, 0);
        assert!(engine.config.scripts_dir.join("fresh.py").exists());
    }
}
