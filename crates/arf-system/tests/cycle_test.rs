//! End-to-end cycle tests
//!
//! Drive the whole daemon against a scripted completer and a temp
//! workspace: exports flow through the pipeline, hypotheses get
//! validated, comments answered, synthesis bumps the version.

use arf_model::ModelConfig;
use arf_philosophy::{ConceptId, Hypothesis, HypothesisId};
use arf_system::{ArfConfig, ArfSystem};
use arf_test_utils::{sample_export_json, scripted_pipeline_answers, MockCompleter, TempArf};
use arf_validation::ValidationRequest;
use indexmap::IndexMap;
use std::sync::Arc;

fn test_config(arf: &TempArf) -> ArfConfig {
    let mut models = IndexMap::new();
    models.insert("llama2".to_string(), ModelConfig::local("llama2"));

    let mut config = ArfConfig {
        models,
        ..ArfConfig::default()
    };
    config.paths.input = arf.input_dir();
    config.paths.output = arf.output_dir();
    config.paths.state = arf.state_dir();
    config.paths.validation = arf.root().to_path_buf();
    // Experiment scripts run through sh in tests, no Python required
    config.validation.interpreter = "sh".to_string();
    config.dashboard.enabled = false;
    config
}

fn hypothesis(statement: &str) -> Hypothesis {
    Hypothesis {
        id: HypothesisId::new(),
        statement: statement.to_string(),
        concept_id: ConceptId::new(),
        proposed_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn full_cycle_processes_export_and_validates() {
    let arf = TempArf::new();
    arf.write_export("spectral.json", &sample_export_json("Spectral gaps"));

    let mut answers = scripted_pipeline_answers();
    // validation script for the queued hypothesis
    answers.push("```\necho experiment ok\n```");
    // answer to the seeded %% COMMENT: marker
    answers.push("Comments are picked up every cycle.");

    let completer = Arc::new(MockCompleter::new(answers));
    let system =
        ArfSystem::bootstrap_with_completer(test_config(&arf), completer.clone()).unwrap();

    let summary = system.run_once().await.unwrap();

    assert_eq!(summary.exports_processed, 1);
    assert_eq!(summary.validations_run, 1);
    assert_eq!(summary.comments_answered, 1);
    assert!(!summary.synthesis_ran);
    assert_eq!(completer.remaining(), 0);

    // Export marked processed, hypothesis validated and dequeued
    let state = system.state_handle();
    let state = state.read().await;
    assert_eq!(state.processed_exports.len(), 1);
    assert!(state.pending_validations.is_empty());
    assert_eq!(state.pending_questions.len(), 1);

    // Scribe fragment and the validation summary landed in the document
    let source = system.documents().framework_source().unwrap();
    assert!(source.contains("\\subsection{Gap pairing}"));
    assert!(source.contains("Validation: Eigenvalue gaps pair under the involution"));

    // Appendix written for the run
    let appendices: Vec<_> = std::fs::read_dir(arf.output_dir().join("appendices"))
        .unwrap()
        .flatten()
        .collect();
    assert_eq!(appendices.len(), 1);

    // Question reached the researcher file
    let questions = system.documents().open_questions().unwrap();
    assert_eq!(questions.len(), 1);
    assert!(questions[0].text.contains("involution unique"));
}

#[tokio::test]
async fn second_cycle_resumes_without_reprocessing() {
    let arf = TempArf::new();
    arf.write_export("spectral.json", &sample_export_json("Spectral gaps"));

    let mut answers = scripted_pipeline_answers();
    answers.push("```\necho experiment ok\n```");
    answers.push("Comment answered.");

    let config = test_config(&arf);
    let system = ArfSystem::bootstrap_with_completer(
        config.clone(),
        Arc::new(MockCompleter::new(answers)),
    )
    .unwrap();
    system.run_once().await.unwrap();
    drop(system);

    // A fresh instance over the same workspace resumes the checkpoint;
    // an empty script proves nothing gets re-run
    let completer = Arc::new(MockCompleter::new(Vec::new()));
    let resumed = ArfSystem::bootstrap_with_completer(config, completer.clone()).unwrap();
    let summary = resumed.run_once().await.unwrap();

    assert_eq!(summary.exports_processed, 0);
    assert_eq!(summary.validations_run, 0);
    assert_eq!(summary.comments_answered, 0);
    assert_eq!(completer.remaining(), 0);
}

#[tokio::test]
async fn unreadable_export_quarantined() {
    let arf = TempArf::new();
    arf.write_export("garbage.json", "this is not json");

    // Only the seeded comment marker needs an answer
    let completer = Arc::new(MockCompleter::new(vec!["Comment answered."]));
    let system = ArfSystem::bootstrap_with_completer(test_config(&arf), completer).unwrap();

    let summary = system.run_once().await.unwrap();
    assert_eq!(summary.exports_processed, 0);

    // Quarantined: marked processed so it is not retried forever
    let state = system.state_handle();
    assert_eq!(state.read().await.processed_exports.len(), 1);
}

#[tokio::test]
async fn validation_backlog_triggers_synthesis() {
    let arf = TempArf::new();

    // 3 validation scripts + 1 comment + 3 synthesis stages
    let completer = Arc::new(MockCompleter::new(vec![
        "```\necho a\n```",
        "```\necho b\n```",
        "```\necho c\n```",
        "Comment answered.",
        "Synthesis report: the framework is consistent.",
        "# Framework overview\nEverything pairs.",
        "\\section{Synthesis}\nConsolidated statement.",
    ]));
    let system =
        ArfSystem::bootstrap_with_completer(test_config(&arf), completer.clone()).unwrap();

    {
        let state = system.state_handle();
        let mut state = state.write().await;
        for i in 0..9 {
            state
                .pending_validations
                .push(ValidationRequest::new(hypothesis(&format!("claim {i}"))));
        }
    }

    let summary = system.run_once().await.unwrap();

    // max_parallel (3) ran, 6 remain, which is over the threshold of 5
    assert_eq!(summary.validations_run, 3);
    assert!(summary.synthesis_ran);
    assert_eq!(completer.remaining(), 0);

    let state = system.state_handle();
    let state = state.read().await;
    assert_eq!(state.pending_validations.len(), 6);
    assert_eq!(state.current_framework_version, "v1.1");
    assert!(state.active_experiments.is_empty());

    // Communicator output became the technical summary
    let summary_md = system.documents().summary().unwrap();
    assert!(summary_md.contains("# Framework overview"));

    // Backlog keeps the fast poll cadence
    let sleep = system.sleep_duration().await;
    assert_eq!(sleep.as_secs(), 300);
}
