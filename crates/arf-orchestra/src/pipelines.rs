//! Research pipelines
//!
//! The export pipeline runs a chat export through
//! parse -> extract -> evaluate -> clarify -> document. The parse
//! stage is deterministic (the archivist's consolidation is plain
//! code); the remaining stages are crew tasks.
//!
//! Agents answer in a line protocol the parsers here understand:
//!
//! ```text
//! CONCEPT|category|title|statement|testable
//! RATING|title|inevitability|symmetry|parsimony|explanatory_power
//! QUESTION|text for the human researcher
//! ```
//!
//! Lines that do not parse are skipped with a warning - models drift,
//! the pipeline keeps going.

use crate::agent::AgentRole;
use crate::crew::{Crew, CrewReport};
use crate::error::OrchestraError;
use crate::export::ChatExport;
use crate::task::TaskSpec;
use arf_model::Completer;
use arf_philosophy::{
    Concept, ConceptCategory, EvaluationCriteria, FacetScores, Hypothesis,
};
use std::collections::HashMap;

/// A concept as the analyst reports it, before evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct DraftConcept {
    /// Claimed category
    pub category: ConceptCategory,
    /// Short title (the rating join key)
    pub title: String,
    /// Full statement
    pub statement: String,
    /// Whether the analyst believes it admits a computational test
    pub testable: bool,
}

/// Everything an export run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Title of the processed export
    pub export_title: String,
    /// Raw crew outputs, in task order
    pub crew: CrewReport,
    /// All evaluated concepts
    pub concepts: Vec<Concept>,
    /// Concepts that cleared the acceptance threshold
    pub accepted: Vec<Concept>,
    /// Hypotheses queued for validation
    pub hypotheses: Vec<Hypothesis>,
    /// LaTeX fragment from the scribe
    pub latex_fragment: String,
    /// Open questions for the human researcher
    pub questions: Vec<String>,
}

/// The chat-export processing pipeline
#[derive(Debug, Clone, Default)]
pub struct ExportPipeline {
    criteria: EvaluationCriteria,
}

impl ExportPipeline {
    /// Create a pipeline evaluating with the given criteria
    #[inline]
    #[must_use]
    pub fn new(criteria: EvaluationCriteria) -> Self {
        Self { criteria }
    }

    /// Run an export end to end
    pub async fn run(
        &self,
        export: &ChatExport,
        completer: &dyn Completer,
    ) -> Result<PipelineReport, OrchestraError> {
        // Parse stage: deterministic consolidation
        let transcript = export.transcript();
        tracing::info!(
            title = %export.title,
            messages = export.messages.len(),
            "processing chat export"
        );

        let crew = Crew::sequential(vec![
            TaskSpec::new(
                AgentRole::Analyst,
                format!(
                    "Extract novel mathematical concepts and hypotheses from this conversation.\n\n{transcript}"
                ),
                "One line per concept: CONCEPT|category|title|statement|testable. \
                 Categories: definition, hypothesis, conjecture, technique, connection. \
                 Mark testable only when a computational experiment could check it.",
            ),
            TaskSpec::new(
                AgentRole::Theorist,
                "Rate every extracted concept against the elegance criteria, \
                 each criterion in [0,1].",
                "One line per concept: \
                 RATING|title|inevitability|symmetry|parsimony|explanatory_power",
            ),
            TaskSpec::new(
                AgentRole::Communicator,
                "Write clear, intuitive explanations of the concepts that survive evaluation.",
                "Accessible yet rigorous prose, one paragraph per concept.",
            ),
            TaskSpec::new(
                AgentRole::Scribe,
                "Update the framework documentation with the new material.",
                "A LaTeX fragment for the framework document, then QUESTION| lines \
                 for anything needing the researcher's input.",
            ),
        ]);

        let report = crew.kickoff(completer).await?;

        let drafts = report
            .output_of(AgentRole::Analyst)
            .map(|o| parse_concept_lines(&o.content))
            .unwrap_or_default();
        let ratings = report
            .output_of(AgentRole::Theorist)
            .map(|o| parse_rating_lines(&o.content))
            .unwrap_or_default();

        let concepts = evaluate_concepts(&self.criteria, drafts, &ratings);
        let accepted: Vec<Concept> = concepts
            .iter()
            .filter(|c| c.score.is_accepted())
            .cloned()
            .collect();
        let hypotheses: Vec<Hypothesis> = accepted
            .iter()
            .filter_map(Concept::derive_hypothesis)
            .collect();

        let (latex_fragment, questions) = report
            .output_of(AgentRole::Scribe)
            .map(|o| split_scribe_output(&o.content))
            .unwrap_or_default();

        tracing::info!(
            concepts = concepts.len(),
            accepted = accepted.len(),
            hypotheses = hypotheses.len(),
            "export pipeline complete"
        );

        Ok(PipelineReport {
            export_title: export.title.clone(),
            crew: report,
            concepts,
            accepted,
            hypotheses,
            latex_fragment,
            questions,
        })
    }
}

/// Build the synthesis crew reviewing the whole framework
#[must_use]
pub fn synthesis_crew(framework_source: &str, summary: &str) -> Crew {
    Crew::sequential(vec![
        TaskSpec::new(
            AgentRole::Theorist,
            format!(
                "Review the entire framework for consistency and elegance.\n\n\
                 Current document:\n{framework_source}\n\nCurrent summary:\n{summary}"
            ),
            "Synthesis report with refinements",
        ),
        TaskSpec::new(
            AgentRole::Communicator,
            "Create an intuitive narrative of the framework's current state.",
            "Clear framework overview in markdown",
        ),
        TaskSpec::new(
            AgentRole::Scribe,
            "Update the master documentation to reflect the synthesis.",
            "A LaTeX fragment for the framework document",
        ),
    ])
}

/// Build the crew answering one user comment
///
/// Routing follows the comment's own words: validation requests go to
/// the validator, explanation requests to the communicator, everything
/// else to the theorist.
#[must_use]
pub fn comment_crew(comment_text: &str) -> Crew {
    let lowered = comment_text.to_lowercase();
    let role = if lowered.contains("validate") {
        AgentRole::Validator
    } else if lowered.contains("explain") {
        AgentRole::Communicator
    } else {
        AgentRole::Theorist
    };

    Crew::sequential(vec![TaskSpec::new(
        role,
        format!("Address this comment on the research document: {comment_text}"),
        "Response to the user comment",
    )])
}

/// Build the crew generating a validation script for a hypothesis
#[must_use]
pub fn validation_script_crew(hypothesis: &Hypothesis) -> Crew {
    Crew::sequential(vec![TaskSpec::new(
        AgentRole::Validator,
        format!(
            "Write Python code testing this hypothesis: {}\n\
             Assume pandas, numpy, scipy, and matplotlib are importable.",
            hypothesis.statement
        ),
        "A single fenced python code block",
    )])
}

/// Build the crew summarizing a fetched external source
#[must_use]
pub fn source_summary_crew(title: &str, body: &str) -> Crew {
    Crew::sequential(vec![TaskSpec::new(
        AgentRole::SourceIntegrator,
        format!("Extract the insights relevant to our framework from \"{title}\":\n\n{body}"),
        "Relevant excerpts and a short summary suitable as a citation note",
    )])
}

/// Parse `CONCEPT|...` lines from analyst output
#[must_use]
pub fn parse_concept_lines(text: &str) -> Vec<DraftConcept> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix("CONCEPT|")?;
            let fields: Vec<&str> = rest.splitn(4, '|').collect();
            if fields.len() != 4 {
                tracing::warn!(line, "skipping malformed concept line");
                return None;
            }

            let category = match fields[0].trim().to_lowercase().as_str() {
                "definition" => ConceptCategory::Definition,
                "hypothesis" => ConceptCategory::Hypothesis,
                "conjecture" => ConceptCategory::Conjecture,
                "technique" => ConceptCategory::Technique,
                "connection" => ConceptCategory::Connection,
                other => {
                    tracing::warn!(category = other, "unknown category, treating as conjecture");
                    ConceptCategory::Conjecture
                }
            };

            let title = fields[1].trim();
            let statement = fields[2].trim();
            if title.is_empty() || statement.is_empty() {
                tracing::warn!(line, "skipping concept without title or statement");
                return None;
            }

            let testable = matches!(
                fields[3].trim().to_lowercase().as_str(),
                "testable" | "true" | "yes"
            );

            Some(DraftConcept {
                category,
                title: title.to_string(),
                statement: statement.to_string(),
                testable,
            })
        })
        .collect()
}

/// Parse `RATING|...` lines from theorist output, keyed by title
#[must_use]
pub fn parse_rating_lines(text: &str) -> HashMap<String, FacetScores> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix("RATING|")?;
            let fields: Vec<&str> = rest.split('|').collect();
            if fields.len() != 5 {
                tracing::warn!(line, "skipping malformed rating line");
                return None;
            }

            let values: Option<Vec<f64>> = fields[1..]
                .iter()
                .map(|f| f.trim().parse::<f64>().ok())
                .collect();
            let values = match values {
                Some(v) => v,
                None => {
                    tracing::warn!(line, "skipping rating with non-numeric values");
                    return None;
                }
            };

            Some((
                fields[0].trim().to_string(),
                FacetScores::new(values[0], values[1], values[2], values[3]),
            ))
        })
        .collect()
}

/// Combine drafts with ratings into evaluated concepts
///
/// A draft the theorist never rated defaults to zero facets, which can
/// never clear the acceptance threshold.
fn evaluate_concepts(
    criteria: &EvaluationCriteria,
    drafts: Vec<DraftConcept>,
    ratings: &HashMap<String, FacetScores>,
) -> Vec<Concept> {
    drafts
        .into_iter()
        .map(|draft| {
            let facets = ratings
                .get(&draft.title)
                .copied()
                .unwrap_or_else(|| FacetScores::new(0.0, 0.0, 0.0, 0.0));
            let score = criteria.score(&facets);

            let concept = Concept::new(draft.title, draft.statement, draft.category, facets, score);
            if draft.testable {
                concept.testable()
            } else {
                concept
            }
        })
        .collect()
}

/// Split scribe output into the LaTeX fragment and QUESTION| lines
#[must_use]
pub fn split_scribe_output(text: &str) -> (String, Vec<String>) {
    let mut latex = Vec::new();
    let mut questions = Vec::new();

    for line in text.lines() {
        match line.trim().strip_prefix("QUESTION|") {
            Some(question) if !question.trim().is_empty() => {
                questions.push(question.trim().to_string());
            }
            Some(_) => {}
            None => latex.push(line),
        }
    }

    (latex.join("\n").trim().to_string(), questions)
}

/// Extract the script body from validator output
///
/// Prefers a fenced code block; falls back to the whole answer.
#[must_use]
pub fn extract_script_body(text: &str) -> String {
    let mut in_block = false;
    let mut body = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            if in_block {
                return body.join("\n");
            }
            in_block = true;
            continue;
        }
        if in_block {
            body.push(line);
        }
    }

    // No (closed) fence found
    text.trim().to_string()
}
