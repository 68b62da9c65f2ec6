//! Error kinds returned by board operations.

use thiserror::Error;

use crate::model::{BoardId, TaskId};

pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    /// The task id does not exist on the board. Ids from other boards land here too.
    #[error("task {id} not found on board {board}")]
    NotFound { board: BoardId, id: TaskId },

    /// Non-numeric id, missing argument, malformed date.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid priority '{0}': must be high, medium, or low")]
    InvalidPriority(String),

    /// A due date that parsed but lies in the past.
    #[error("invalid due date '{0}': must not be earlier than today")]
    InvalidDate(String),

    #[error("task {task} already depends on task {dep}")]
    DuplicateEdge { task: TaskId, dep: TaskId },

    #[error("making task {task} depend on task {dep} would create a cycle")]
    DependencyCycle { task: TaskId, dep: TaskId },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("corrupt edge set: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl KanbanError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for errors caused by user input, as opposed to storage failures.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Encoding(_))
    }
}
