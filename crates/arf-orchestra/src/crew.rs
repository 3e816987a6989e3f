//! Crews
//!
//! A crew is an ordered list of tasks executed sequentially, each
//! task's output threaded into the next task's prompt as context.
//! A failed task aborts the crew.

use crate::agent::Agent;
use crate::error::OrchestraError;
use crate::task::{TaskOutput, TaskSpec};
use arf_model::{Completer, CompletionRequest};

/// How a crew executes its tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrewProcess {
    /// One task after another, outputs fed forward
    #[default]
    Sequential,
}

/// Result of a crew run
#[derive(Debug, Clone)]
pub struct CrewReport {
    /// Outputs in task order
    pub outputs: Vec<TaskOutput>,
}

impl CrewReport {
    /// Output of the task executed by the given role, if any
    #[must_use]
    pub fn output_of(&self, role: crate::agent::AgentRole) -> Option<&TaskOutput> {
        self.outputs.iter().find(|o| o.role == role)
    }

    /// Output of the final task
    #[must_use]
    pub fn final_output(&self) -> Option<&TaskOutput> {
        self.outputs.last()
    }
}

/// An ordered set of tasks for a group of agents
#[derive(Debug, Clone)]
pub struct Crew {
    tasks: Vec<TaskSpec>,
    process: CrewProcess,
}

impl Crew {
    /// Create a sequential crew
    #[must_use]
    pub fn sequential(tasks: Vec<TaskSpec>) -> Self {
        Self {
            tasks,
            process: CrewProcess::Sequential,
        }
    }

    /// The crew's tasks, in execution order
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Execute the crew
    ///
    /// Tasks run strictly in order; the prompt for task N includes the
    /// outputs of tasks 0..N. A task whose completion fails aborts the
    /// crew with `OrchestraError::TaskFailed`.
    pub async fn kickoff(&self, completer: &dyn Completer) -> Result<CrewReport, OrchestraError> {
        debug_assert_eq!(self.process, CrewProcess::Sequential);
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            let agent = Agent::for_role(task.role);
            let prompt = build_prompt(task, &outputs);

            tracing::info!(task = %task.id, role = %task.role, "executing crew task");

            let request = CompletionRequest::new(prompt)
                .with_system(agent.system_prompt())
                .with_task_hint(task.role.task_hint());

            let response =
                completer
                    .complete(request)
                    .await
                    .map_err(|e| OrchestraError::TaskFailed {
                        task_id: task.id,
                        role: task.role.name().to_string(),
                        reason: e.to_string(),
                    })?;

            outputs.push(TaskOutput {
                task_id: task.id,
                role: task.role,
                content: response.content,
            });
        }

        Ok(CrewReport { outputs })
    }
}

/// Assemble the prompt for a task, threading prior outputs forward
fn build_prompt(task: &TaskSpec, prior: &[TaskOutput]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&task.description);
    prompt.push_str("\n\nExpected output: ");
    prompt.push_str(&task.expected_output);

    if !prior.is_empty() {
        prompt.push_str("\n\nContext from previous tasks:");
        for output in prior {
            prompt.push_str(&format!(
                "\n\n--- {} ---\n{}",
                output.role.title(),
                output.content
            ));
        }
    }

    prompt
}
