//! LaTeX rendering
//!
//! Templates for the framework document: the seed preamble, technical
//! appendices, and validation summaries.

use serde::{Deserialize, Serialize};

/// Reference to a technical appendix (`appendix_<id>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendixRef(pub String);

impl AppendixRef {
    /// Label for a validation id
    #[must_use]
    pub fn for_validation(validation_id: &str) -> Self {
        Self(format!("appendix_{validation_id}"))
    }

    /// File name for this appendix
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.tex", self.0)
    }
}

impl std::fmt::Display for AppendixRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sections of a technical appendix
#[derive(Debug, Clone, Default)]
pub struct AppendixContent {
    /// How the experiment was run
    pub methodology: String,
    /// Raw experiment output, reproduced verbatim
    pub raw_output: String,
    /// Statistical analysis of the results
    pub statistics: String,
}

/// Render a technical appendix for a validation run
#[must_use]
pub fn render_appendix(validation_id: &str, content: &AppendixContent) -> String {
    format!(
        "\\appendix\n\
         \\section{{Validation {validation_id}}}\n\
         \n\
         \\subsection{{Methodology}}\n\
         {methodology}\n\
         \n\
         \\subsection{{Results}}\n\
         \\begin{{verbatim}}\n\
         {raw}\n\
         \\end{{verbatim}}\n\
         \n\
         \\subsection{{Statistical Analysis}}\n\
         {statistics}\n",
        methodology = content.methodology,
        raw = content.raw_output,
        statistics = content.statistics,
    )
}

/// Render the validation summary appended to the main document
///
/// The hypothesis is truncated to 50 characters in the subsection
/// title; the appendix holds the full detail.
#[must_use]
pub fn render_validation_summary(
    hypothesis: &str,
    summary: &str,
    appendix: &AppendixRef,
) -> String {
    format!(
        "\n\\subsection{{Validation: {title}...}}\n\
         {summary}\n\
         \n\
         \\textit{{For technical details, see Appendix \\ref{{{appendix}}}}}\n",
        title = truncate_chars(hypothesis, 50),
    )
}

/// The initial framework document, written once when absent
#[must_use]
pub fn seed_document(weights: [(&str, f64); 4]) -> String {
    let items: String = weights
        .iter()
        .map(|(name, w)| format!("    \\item {} ({:.0}\\%)\n", name, w * 100.0))
        .collect();

    format!(
        "\\documentclass[12pt]{{article}}\n\
         \\usepackage{{amsmath}}\n\
         \\usepackage{{amssymb}}\n\
         \\usepackage{{hyperref}}\n\
         \\usepackage{{listings}}\n\
         \\usepackage{{graphicx}}\n\
         \n\
         \\title{{Mathematical Physics Research Framework}}\n\
         \\author{{Autonomous Research Framework (ARF)}}\n\
         \\date{{\\today}}\n\
         \n\
         \\begin{{document}}\n\
         \n\
         \\maketitle\n\
         \n\
         \\begin{{abstract}}\n\
         This document represents the evolving mathematical framework developed through autonomous research.\n\
         It prioritizes elegant, inevitable structures arising from fundamental principles.\n\
         \\end{{abstract}}\n\
         \n\
         \\section{{Introduction}}\n\
         This framework is guided by the principles of:\n\
         \\begin{{itemize}}\n\
         {items}\\end{{itemize}}\n\
         \n\
         %% COMMENT: Add your comments here for the system to process\n\
         \n\
         \\end{{document}}\n"
    )
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appendix_ref_naming() {
        let r = AppendixRef::for_validation("01J8");
        assert_eq!(r.0, "appendix_01J8");
        assert_eq!(r.file_name(), "appendix_01J8.tex");
    }

    #[test]
    fn appendix_renders_all_sections() {
        let content = AppendixContent {
            methodology: "Monte Carlo over 10^6 samples".to_string(),
            raw_output: "p = 0.003".to_string(),
            statistics: "Two-sided t-test".to_string(),
        };
        let tex = render_appendix("01J8", &content);

        assert!(tex.contains("\\section{Validation 01J8}"));
        assert!(tex.contains("\\subsection{Methodology}"));
        assert!(tex.contains("\\begin{verbatim}\np = 0.003"));
        assert!(tex.contains("\\subsection{Statistical Analysis}"));
    }

    #[test]
    fn summary_truncates_long_hypothesis() {
        let hypothesis = "x".repeat(80);
        let tex = render_validation_summary(
            &hypothesis,
            "Held with p < 0.01.",
            &AppendixRef::for_validation("01J8"),
        );

        assert!(tex.contains(&format!("Validation: {}...", "x".repeat(50))));
        assert!(tex.contains("Appendix \\ref{appendix_01J8}"));
    }

    #[test]
    fn seed_contains_weights_and_comment_marker() {
        let tex = seed_document([
            ("Inevitability and naturalness", 0.30),
            ("Symmetry and invariance", 0.25),
            ("Parsimony - Occam's Razor", 0.25),
            ("Explanatory power", 0.20),
        ]);

        assert!(tex.contains("\\item Inevitability and naturalness (30\\%)"));
        assert!(tex.contains("%% COMMENT:"));
        assert!(tex.contains("\\end{document}"));
    }
}
