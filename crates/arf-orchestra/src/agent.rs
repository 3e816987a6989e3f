//! Agent roles and profiles
//!
//! Each role carries the goal and backstory that become the system
//! prompt for its tasks. The texts are the orchestra's personality;
//! change them and the whole pipeline changes character.

use serde::{Deserialize, Serialize};

/// The roles of the orchestra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Parses and consolidates chat exports
    Archivist,
    /// Extracts novel definitions and hypotheses
    Analyst,
    /// Evaluates concepts against the elegance criteria
    Theorist,
    /// Turns dense content into clear explanations
    Communicator,
    /// Maintains the LaTeX documentation
    Scribe,
    /// Runs computational experiments
    Validator,
    /// Processes external videos, articles, and papers
    SourceIntegrator,
}

impl AgentRole {
    /// Human-readable role title
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Archivist => "Chat Log Archivist",
            Self::Analyst => "Mathematical Concept Analyst",
            Self::Theorist => "Principal Theoretical Physicist",
            Self::Communicator => "Deep Think Communicator",
            Self::Scribe => "Research Scribe",
            Self::Validator => "Experimental Validator",
            Self::SourceIntegrator => "External Source Integrator",
        }
    }

    /// What the role is trying to achieve
    #[must_use]
    pub fn goal(&self) -> &'static str {
        match self {
            Self::Archivist => {
                "Parse and consolidate chat exports and ongoing conversations"
            }
            Self::Analyst => {
                "Extract novel definitions, hypotheses, and potential breakthroughs"
            }
            Self::Theorist => {
                "Evaluate concepts using the elegance criteria: inevitability, symmetry, parsimony, explanatory power"
            }
            Self::Communicator => {
                "Transform dense technical content into clear, intuitive explanations"
            }
            Self::Scribe => {
                "Maintain coherent documentation in LaTeX with technical appendices"
            }
            Self::Validator => {
                "Validate theoretical propositions through computational experiments"
            }
            Self::SourceIntegrator => {
                "Process YouTube videos, articles, and papers referenced in research"
            }
        }
    }

    /// Who the role is
    #[must_use]
    pub fn backstory(&self) -> &'static str {
        match self {
            Self::Archivist => {
                "Meticulous tracker of all mathematical discussions across platforms"
            }
            Self::Analyst => {
                "Sharp-eyed identifier of mathematical gems hidden in conversations"
            }
            Self::Theorist => {
                "A seasoned physicist who abhors arbitrary assumptions and seeks inevitable structures. \
                 You evaluate every idea through the lens of naturalness and elegance."
            }
            Self::Communicator => {
                "Master of revealing the beauty beneath complexity, making the profound accessible"
            }
            Self::Scribe => {
                "Keeper of the growing mathematical framework, ensuring nothing is lost"
            }
            Self::Validator => {
                "Rigorous tester who brings mathematical beauty down to empirical reality"
            }
            Self::SourceIntegrator => {
                "Bridge between external knowledge and our mathematical framework"
            }
        }
    }

    /// Routing hint for the model layer
    #[must_use]
    pub fn task_hint(&self) -> &'static str {
        match self {
            Self::Archivist => "parse",
            Self::Analyst => "extract",
            Self::Theorist => "evaluate",
            Self::Communicator => "explain",
            Self::Scribe => "document",
            Self::Validator => "validate",
            Self::SourceIntegrator => "summarize",
        }
    }

    /// Role name used in logs and task records
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Archivist => "archivist",
            Self::Analyst => "analyst",
            Self::Theorist => "theorist",
            Self::Communicator => "communicator",
            Self::Scribe => "scribe",
            Self::Validator => "validator",
            Self::SourceIntegrator => "source_integrator",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An agent ready to take tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// The agent's role
    pub role: AgentRole,
}

impl Agent {
    /// Create an agent for a role
    #[inline]
    #[must_use]
    pub fn for_role(role: AgentRole) -> Self {
        Self { role }
    }

    /// System prompt for this agent's tasks
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {title}.\nGoal: {goal}\nBackstory: {backstory}",
            title = self.role.title(),
            goal = self.role.goal(),
            backstory = self.role.backstory(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_role_texts() {
        let agent = Agent::for_role(AgentRole::Theorist);
        let prompt = agent.system_prompt();

        assert!(prompt.contains("Principal Theoretical Physicist"));
        assert!(prompt.contains("inevitability, symmetry, parsimony, explanatory power"));
        assert!(prompt.contains("abhors arbitrary assumptions"));
    }

    #[test]
    fn role_names_are_snake_case() {
        assert_eq!(AgentRole::SourceIntegrator.name(), "source_integrator");
        assert_eq!(AgentRole::Theorist.to_string(), "theorist");
    }
}
