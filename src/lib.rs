//! Per-chat kanban boards: tasks with a status, a priority, an optional due
//! date and a dependency graph, stored in SQLite.

pub mod board;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod model;
pub mod output;
pub mod query;
pub mod store;
pub mod tree;

pub use board::{DependencyChange, Kanban};
pub use error::{KanbanError, Result};
pub use model::{BoardId, IdSet, Priority, Status, Task, TaskId};
