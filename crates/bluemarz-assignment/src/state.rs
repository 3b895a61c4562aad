//! Assignment lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an assignment stands between `run_until_breakpoint` calls.
///
/// ```text
/// Created ──▶ Running ──▶ Completed
///                │
///                └──────▶ AwaitingExternalTool
/// ```
///
/// Both end states are resumable: the next run starts from the stored run id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignmentState {
    #[default]
    Created,
    Running,
    /// Tool calls are pending on an actor outside this process.
    AwaitingExternalTool,
    Completed,
}

impl AssignmentState {
    pub fn is_running(&self) -> bool {
        matches!(self, AssignmentState::Running)
    }

    /// Whether the last run loop has exited.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            AssignmentState::AwaitingExternalTool | AssignmentState::Completed
        )
    }
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssignmentState::Created => "created",
            AssignmentState::Running => "running",
            AssignmentState::AwaitingExternalTool => "awaitingExternalTool",
            AssignmentState::Completed => "completed",
        };
        f.write_str(name)
    }
}
