//! The ARF daemon
//!
//! Owns every subsystem and drives the cycle loop:
//!
//! 1. process new chat exports through the agent pipeline
//! 2. run pending validation experiments (bounded parallelism)
//! 3. answer document comments
//! 4. ingest external references
//! 5. synthesize the framework when enough material accumulated
//! 6. checkpoint state
//!
//! then sleep adaptively. A cycle error checkpoints and backs off;
//! SIGINT/SIGTERM checkpoint and exit cleanly.

use crate::config::{ArfConfig, ConfigError};
use arf_document::latex::AppendixContent;
use arf_document::{Comment, DocumentError, DocumentManager, Question};
use arf_model::{Completer, ModelRouter, UsageLedger};
use arf_orchestra::pipelines::{
    self, extract_script_body, ExportPipeline,
};
use arf_orchestra::{AgentPool, AgentRole, ChatExport, OrchestraError};
use arf_sources::{SourceFetcher, SourceKind};
use arf_state::{CheckpointStore, StateError, SystemState};
use arf_validation::{
    ScriptSpec, SandboxConfig, ValidationEngine, ValidationError, ValidationId, ValidationRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

/// Top-level daemon error
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Configuration failure
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Checkpoint failure
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Document layer failure
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Validation engine failure
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Orchestra failure
    #[error("orchestra error: {0}")]
    Orchestra(#[from] OrchestraError),

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// What one cycle accomplished
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    /// Exports run through the pipeline
    pub exports_processed: usize,
    /// Validation experiments executed
    pub validations_run: usize,
    /// Comments answered
    pub comments_answered: usize,
    /// External references ingested
    pub references_ingested: usize,
    /// Whether a synthesis cycle ran
    pub synthesis_ran: bool,
}

/// The assembled daemon
pub struct ArfSystem {
    config: ArfConfig,
    state: Arc<RwLock<SystemState>>,
    checkpoint: CheckpointStore,
    completer: Arc<dyn Completer>,
    ledger: Arc<UsageLedger>,
    documents: DocumentManager,
    validation: ValidationEngine,
    sources: SourceFetcher,
    pool: Arc<AgentPool>,
    pipeline: ExportPipeline,
    started_at: Instant,
}

impl ArfSystem {
    /// Assemble the daemon with the production model router
    pub fn bootstrap(config: ArfConfig) -> Result<Self, SystemError> {
        let ledger = Arc::new(UsageLedger::load(config.paths.usage_file()));
        let router = ModelRouter::new(config.model_list(), Arc::clone(&ledger));
        Self::bootstrap_inner(config, ledger, Arc::new(router))
    }

    /// Assemble the daemon around a custom completer (tests, dry runs)
    pub fn bootstrap_with_completer(
        config: ArfConfig,
        completer: Arc<dyn Completer>,
    ) -> Result<Self, SystemError> {
        let ledger = Arc::new(UsageLedger::load(config.paths.usage_file()));
        Self::bootstrap_inner(config, ledger, completer)
    }

    fn bootstrap_inner(
        config: ArfConfig,
        ledger: Arc<UsageLedger>,
        completer: Arc<dyn Completer>,
    ) -> Result<Self, SystemError> {
        config.validate()?;

        for dir in [&config.paths.input, &config.paths.output, &config.paths.state] {
            std::fs::create_dir_all(dir).map_err(|e| SystemError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }

        let checkpoint = CheckpointStore::new(config.paths.checkpoint_file());
        let state = checkpoint.load_or_init();

        let documents = DocumentManager::new(&config.paths.output);
        documents.seed_framework(config.weight_labels())?;

        let sandbox = SandboxConfig::rooted_at(&config.paths.validation)
            .with_timeout_secs(config.validation.timeout_secs)
            .with_interpreter(config.validation.interpreter.clone());
        let validation = ValidationEngine::new(sandbox)?;

        let pipeline = ExportPipeline::new(config.philosophy);

        tracing::info!(
            version = %state.current_framework_version,
            pending_validations = state.pending_validations.len(),
            "ARF system initialized"
        );
        tracing::info!(
            inevitability = config.philosophy.inevitability,
            symmetry = config.philosophy.symmetry,
            parsimony = config.philosophy.parsimony,
            explanatory_power = config.philosophy.explanatory_power,
            "philosophy weights"
        );

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(state)),
            checkpoint,
            completer,
            ledger,
            documents,
            validation,
            sources: SourceFetcher::new(),
            pool: Arc::new(AgentPool::default()),
            pipeline,
            started_at: Instant::now(),
        })
    }

    /// Daemon configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ArfConfig {
        &self.config
    }

    /// Shared system state (dashboard reads this)
    #[inline]
    #[must_use]
    pub fn state_handle(&self) -> Arc<RwLock<SystemState>> {
        Arc::clone(&self.state)
    }

    /// Document manager (dashboard reads this)
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &DocumentManager {
        &self.documents
    }

    /// When the daemon started
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Run cycles until shutdown is signalled
    pub async fn run(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), SystemError> {
        tracing::info!("starting continuous operation");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let sleep = match self.run_once().await {
                Ok(summary) => {
                    tracing::info!(
                        exports = summary.exports_processed,
                        validations = summary.validations_run,
                        comments = summary.comments_answered,
                        references = summary.references_ingested,
                        synthesis = summary.synthesis_ran,
                        "cycle complete"
                    );
                    self.sleep_duration().await
                }
                Err(e) => {
                    tracing::error!("cycle failed: {}", e);
                    if let Err(save_err) = self.save_state().await {
                        tracing::error!("checkpoint after failure also failed: {}", save_err);
                    }
                    Duration::from_secs(self.config.cycle.error_backoff_secs)
                }
            };

            tracing::info!(secs = sleep.as_secs(), "sleeping");
            tokio::select! {
                _ = tokio::time::sleep(sleep) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.shutdown().await
    }

    /// Run exactly one cycle
    pub async fn run_once(&self) -> Result<CycleSummary, SystemError> {
        tracing::info!("cycle started");
        let mut summary = CycleSummary::default();

        summary.exports_processed = self.process_new_exports().await?;

        if self.config.monitoring.active_chats {
            tracing::debug!("web conversation monitoring is not available; skipping");
        }

        summary.validations_run = self.run_validation_batch().await?;
        summary.comments_answered = self.process_comments().await?;
        summary.references_ingested = self.process_references().await?;

        if self.should_run_synthesis().await {
            self.run_synthesis().await?;
            summary.synthesis_ran = true;
        }

        self.save_state().await?;
        Ok(summary)
    }

    /// Checkpoint state and the usage ledger
    pub async fn save_state(&self) -> Result<(), SystemError> {
        let mut state = self.state.write().await;
        self.checkpoint.save(&mut state)?;
        if let Err(e) = self.ledger.save() {
            tracing::warn!("usage ledger save failed: {}", e);
        }
        Ok(())
    }

    /// Graceful shutdown: checkpoint, clean the sandbox, log
    pub async fn shutdown(&self) -> Result<(), SystemError> {
        tracing::info!("gracefully shutting down");
        self.save_state().await?;
        if let Err(e) = self.validation.cleanup_stale() {
            tracing::warn!("sandbox cleanup failed: {}", e);
        }
        tracing::info!("shutdown complete, state saved for resume");
        Ok(())
    }

    /// Adaptive sleep: busy queues poll faster
    pub async fn sleep_duration(&self) -> Duration {
        let state = self.state.read().await;
        let secs = if !state.pending_validations.is_empty() {
            self.config.cycle.validation_sleep_secs
        } else if !state.comment_queue.is_empty() {
            self.config.cycle.comment_sleep_secs
        } else {
            self.config.cycle.idle_sleep_secs
        };
        Duration::from_secs(secs)
    }

    /// Scan the input directory and pipeline every new export
    async fn process_new_exports(&self) -> Result<usize, SystemError> {
        let new_exports = self.find_new_exports().await?;
        let mut processed = 0;

        for path in new_exports {
            let export_path = path.display().to_string();
            tracing::info!(export = %export_path, "found new export");

            let raw = std::fs::read_to_string(&path).map_err(|e| SystemError::Io {
                path: path.clone(),
                source: e,
            })?;

            match ChatExport::from_json_str(&raw) {
                Ok(export) if !export.is_empty() => {
                    let report = self.pipeline.run(&export, &*self.completer).await?;
                    self.apply_pipeline_report(&report).await?;
                    processed += 1;
                }
                Ok(_) => {
                    tracing::warn!(export = %export_path, "export holds no messages, skipping");
                }
                Err(e) => {
                    // An unparseable file will never parse differently;
                    // quarantine it instead of retrying forever
                    tracing::error!(export = %display, "unreadable export: {}", e);
                }
            }

            self.state.write().await.mark_processed(&display);
        }

        Ok(processed)
    }

    async fn find_new_exports(&self) -> Result<Vec<PathBuf>, SystemError> {
        let input = &self.config.paths.input;
        let entries = std::fs::read_dir(input).map_err(|e| SystemError::Io {
            path: input.clone(),
            source: e,
        })?;

        let state = self.state.read().await;
        let mut found: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter(|p| !state.is_processed(&p.display().to_string()))
            .collect();
        found.sort();
        Ok(found)
    }

    async fn apply_pipeline_report(
        &self,
        report: &pipelines::PipelineReport,
    ) -> Result<(), SystemError> {
        if !report.latex_fragment.is_empty() {
            self.documents
                .append_to_framework(&format!("\n{}\n", report.latex_fragment))?;
        }
        for question in &report.questions {
            self.documents.push_question(question)?;
        }

        let mut state = self.state.write().await;
        for question in &report.questions {
            state.pending_questions.push(Question {
                text: question.clone(),
            });
        }
        for hypothesis in &report.hypotheses {
            state
                .pending_validations
                .push(ValidationRequest::new(hypothesis.clone()));
        }

        tracing::info!(
            export = %report.export_title,
            accepted = report.accepted.len(),
            queued = report.hypotheses.len(),
            "pipeline report applied"
        );
        Ok(())
    }

    /// Execute up to `max_parallel` pending validations concurrently
    async fn run_validation_batch(&self) -> Result<usize, SystemError> {
        let batch: Vec<ValidationRequest> = {
            let state = self.state.read().await;
            state
                .pending_validations
                .iter()
                .take(self.config.validation.max_parallel)
                .cloned()
                .collect()
        };

        if batch.is_empty() {
            return Ok(0);
        }
        tracing::info!(count = batch.len(), "running validation batch");

        {
            let mut state = self.state.write().await;
            state.active_experiments = batch.iter().map(|r| r.id.to_string()).collect();
        }

        let mut set: JoinSet<Result<ValidationId, SystemError>> = JoinSet::new();
        for request in batch {
            let completer = Arc::clone(&self.completer);
            let engine = self.validation.clone();
            let documents = self.documents.clone();
            let pool = Arc::clone(&self.pool);

            set.spawn(async move {
                run_single_validation(completer, engine, documents, pool, request).await
            });
        }

        let mut completed: Vec<ValidationId> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(id)) => completed.push(id),
                Ok(Err(e)) => tracing::warn!("validation failed, will retry: {}", e),
                Err(e) => tracing::warn!("validation task panicked: {}", e),
            }
        }

        let mut state = self.state.write().await;
        state
            .pending_validations
            .retain(|r| !completed.contains(&r.id));
        state.active_experiments.clear();

        Ok(completed.len())
    }

    /// Answer pending comments through the appropriate agent
    async fn process_comments(&self) -> Result<usize, SystemError> {
        let pending = self.documents.pending_comments()?;
        if pending.is_empty() {
            self.state.write().await.comment_queue.clear();
            return Ok(0);
        }
        tracing::info!(count = pending.len(), "processing comments");

        let mut answered = 0;
        let mut unanswered: Vec<Comment> = Vec::new();

        for comment in pending {
            let crew = pipelines::comment_crew(&comment.text);
            match crew.kickoff(&*self.completer).await {
                Ok(report) => {
                    let response = report
                        .final_output()
                        .map(|o| o.content.clone())
                        .unwrap_or_default();
                    self.documents.record_comment_answer(&comment, response)?;
                    answered += 1;
                }
                Err(e) => {
                    tracing::warn!(comment = %comment.id, "comment crew failed: {}", e);
                    unanswered.push(comment);
                }
            }
        }

        self.state.write().await.comment_queue = unanswered;
        Ok(answered)
    }

    /// Ingest external references found in the framework
    async fn process_references(&self) -> Result<usize, SystemError> {
        let references = self.documents.unprocessed_references()?;
        let mut ingested = 0;

        for url in references {
            let kind = SourceKind::classify(&url);
            if !kind.is_ingestible() {
                self.documents
                    .mark_reference_processed(&url, "unsupported source; skipped")?;
                continue;
            }

            let fetched = match self.sources.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    // Transient fetch failures retry next cycle
                    tracing::warn!(url = %url, "source fetch failed: {}", e);
                    continue;
                }
            };

            let crew = pipelines::source_summary_crew(&fetched.title, &fetched.body);
            match crew.kickoff(&*self.completer).await {
                Ok(report) => {
                    let citation = report
                        .final_output()
                        .map(|o| o.content.clone())
                        .unwrap_or_default();
                    self.documents.mark_reference_processed(&url, citation)?;
                    ingested += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, "source summary failed: {}", e);
                }
            }
        }

        Ok(ingested)
    }

    /// Whether enough material accumulated for a synthesis cycle
    pub async fn should_run_synthesis(&self) -> bool {
        let state = self.state.read().await;
        state.pending_validations.len() > self.config.synthesis.pending_threshold
            || state.hours_since_synthesis(chrono::Utc::now())
                > self.config.synthesis.max_hours_between
    }

    /// Review the whole framework and bump its version
    async fn run_synthesis(&self) -> Result<(), SystemError> {
        tracing::info!("running framework synthesis cycle");

        let framework = self.documents.framework_source()?;
        let summary = self.documents.summary()?;

        let crew = pipelines::synthesis_crew(&framework, &summary);
        let report = crew.kickoff(&*self.completer).await?;

        if let Some(output) = report.output_of(AgentRole::Scribe) {
            if !output.content.trim().is_empty() {
                self.documents
                    .append_to_framework(&format!("\n{}\n", output.content.trim()))?;
            }
        }
        if let Some(output) = report.output_of(AgentRole::Communicator) {
            if !output.content.trim().is_empty() {
                self.documents.update_summary(&output.content)?;
            }
        }

        let mut state = self.state.write().await;
        state.bump_framework_version();
        state.last_synthesis = chrono::Utc::now();
        tracing::info!(version = %state.current_framework_version, "synthesis complete");
        Ok(())
    }
}

/// One validation experiment, end to end
async fn run_single_validation(
    completer: Arc<dyn Completer>,
    engine: ValidationEngine,
    documents: DocumentManager,
    pool: Arc<AgentPool>,
    request: ValidationRequest,
) -> Result<ValidationId, SystemError> {
    let agent = pool
        .acquire(AgentRole::Validator)
        .await
        .map_err(OrchestraError::from)?;

    let result = validate_inner(completer, engine, documents, &request).await;
    pool.release(agent).await;
    result
}

async fn validate_inner(
    completer: Arc<dyn Completer>,
    engine: ValidationEngine,
    documents: DocumentManager,
    request: &ValidationRequest,
) -> Result<ValidationId, SystemError> {
    tracing::info!(id = %request.id, hypothesis = %request.hypothesis.statement, "validating");

    let crew = pipelines::validation_script_crew(&request.hypothesis);
    let report = crew.kickoff(&*completer).await?;
    let body = report
        .final_output()
        .map(|o| extract_script_body(&o.content))
        .unwrap_or_default();

    let spec = ScriptSpec {
        validation_code: body,
        ..ScriptSpec::default()
    };
    let script = engine.materialize_script(request, &spec)?;
    let outcome = engine.execute(request, &script).await?;

    let content = AppendixContent {
        methodology: format!(
            "Hypothesis: {}\nGenerated experiment script: {}",
            request.hypothesis.statement,
            script.display()
        ),
        raw_output: format!("--- stdout ---\n{}\n--- stderr ---\n{}", outcome.stdout, outcome.stderr),
        statistics: format!(
            "exit success: {}, duration: {} ms{}",
            outcome.success,
            outcome.duration_ms,
            if outcome.timed_out { ", timed out" } else { "" }
        ),
    };
    let appendix = documents.create_technical_appendix(&request.id.to_string(), &content)?;

    let summary = if outcome.success {
        "The experiment completed successfully."
    } else if outcome.timed_out {
        "The experiment exceeded its time budget and was stopped."
    } else {
        "The experiment failed; see the appendix for diagnostics."
    };
    documents.add_validation_summary(&request.hypothesis.statement, summary, &appendix)?;

    Ok(request.id)
}
