//! Crew tasks

use crate::agent::AgentRole;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique task identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Ulid);

impl TaskId {
    /// Generate new task ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of crew work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task identifier
    pub id: TaskId,
    /// Agent role executing the task
    pub role: AgentRole,
    /// What to do
    pub description: String,
    /// What the output should look like
    pub expected_output: String,
}

impl TaskSpec {
    /// Create a new task
    #[must_use]
    pub fn new(
        role: AgentRole,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            role,
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Output of one executed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task that produced this
    pub task_id: TaskId,
    /// Role that executed it
    pub role: AgentRole,
    /// Model answer
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn task_spec_builder() {
        let task = TaskSpec::new(
            AgentRole::Analyst,
            "Extract concepts",
            "One CONCEPT line per idea",
        );
        assert_eq!(task.role, AgentRole::Analyst);
        assert_eq!(task.description, "Extract concepts");
    }
}
