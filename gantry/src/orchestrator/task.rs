//! Per-package task state.

use std::fmt;

/// Stage of one package's install.
///
/// Tasks move strictly forward through
/// `Pending → Resolving → Fetching → Installing → Installed`. A task may
/// fail from any non-terminal stage; the stage it failed in is kept on the
/// [`InstallTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStage {
    Pending,
    Resolving,
    Fetching,
    Installing,
    Installed,
    Failed,
}

impl TaskStage {
    /// The stage that follows this one on the success path.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Resolving),
            Self::Resolving => Some(Self::Fetching),
            Self::Fetching => Some(Self::Installing),
            Self::Installing => Some(Self::Installed),
            Self::Installed | Self::Failed => None,
        }
    }

    /// Whether the task has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Installed | Self::Failed)
    }

    /// Lowercase stage label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One requested package and where it is in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTask {
    name: String,
    stage: TaskStage,
    failed_during: Option<TaskStage>,
}

impl InstallTask {
    /// A new task in `Pending`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: TaskStage::Pending,
            failed_during: None,
        }
    }

    /// The requested name, as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current stage.
    pub fn stage(&self) -> TaskStage {
        self.stage
    }

    /// The stage the task was in when it failed.
    pub fn failed_during(&self) -> Option<TaskStage> {
        self.failed_during
    }

    /// Move to the next stage. Terminal tasks stay where they are.
    pub fn advance(&mut self) -> TaskStage {
        if let Some(next) = self.stage.next() {
            self.stage = next;
        }
        self.stage
    }

    /// Mark the task failed, returning the stage it failed in.
    ///
    /// Failing an already terminal task changes nothing.
    pub fn fail(&mut self) -> TaskStage {
        if !self.stage.is_terminal() {
            self.failed_during = Some(self.stage);
            self.stage = TaskStage::Failed;
        }
        self.failed_during.unwrap_or(self.stage)
    }

    /// Snapshot for progress reporting.
    pub fn event(&self) -> TaskEvent {
        TaskEvent {
            name: self.name.clone(),
            stage: self.stage,
            failed_during: self.failed_during,
        }
    }
}

/// A stage transition, delivered to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    /// The requested name.
    pub name: String,
    /// The stage just entered.
    pub stage: TaskStage,
    /// Set when `stage` is `Failed`.
    pub failed_during: Option<TaskStage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_visits_every_stage() {
        let mut task = InstallTask::new("lodash");
        let mut seen = vec![task.stage()];
        while !task.stage().is_terminal() {
            seen.push(task.advance());
        }

        assert_eq!(
            seen,
            vec![
                TaskStage::Pending,
                TaskStage::Resolving,
                TaskStage::Fetching,
                TaskStage::Installing,
                TaskStage::Installed,
            ]
        );
    }

    #[test]
    fn test_fail_records_stage() {
        let mut task = InstallTask::new("left-pad");
        task.advance();
        task.advance();
        assert_eq!(task.fail(), TaskStage::Fetching);
        assert_eq!(task.stage(), TaskStage::Failed);
        assert_eq!(task.failed_during(), Some(TaskStage::Fetching));
    }

    #[test]
    fn test_terminal_tasks_do_not_move() {
        let mut task = InstallTask::new("lodash");
        task.fail();
        assert_eq!(task.advance(), TaskStage::Failed);
        assert_eq!(task.fail(), TaskStage::Pending);

        let mut done = InstallTask::new("lodash");
        for _ in 0..4 {
            done.advance();
        }
        assert_eq!(done.stage(), TaskStage::Installed);
        assert_eq!(done.advance(), TaskStage::Installed);
        done.fail();
        assert_eq!(done.stage(), TaskStage::Installed);
    }

    #[test]
    fn test_event_snapshot() {
        let mut task = InstallTask::new("@types/node");
        task.advance();
        task.fail();
        let event = task.event();
        assert_eq!(event.name, "@types/node");
        assert_eq!(event.stage, TaskStage::Failed);
        assert_eq!(event.failed_during, Some(TaskStage::Resolving));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(TaskStage::Installing.to_string(), "installing");
    }
}
