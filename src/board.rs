//! The board service: one method per user-facing command.
//!
//! A fixed pool of SQLite connections, each behind a mutex. A board always
//! maps to the same slot, so commands for one board serialize while boards in
//! other slots run in parallel. The number of open connections does not grow
//! with the number of boards. Every mutating command runs in a single
//! transaction.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db;
use crate::error::{KanbanError, Result};
use crate::graph::{self, Asymmetry};
use crate::lifecycle::{self, Clock, SystemClock};
use crate::model::{BoardId, Status, Task, TaskId};
use crate::query::{self, BoardListing};
use crate::store;

/// Outcome of the dependency command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyChange {
    Cleared { removed: Vec<TaskId> },
    Added { added: Vec<TaskId> },
}

/// Connections held by one `Kanban`.
pub const POOL_SIZE: usize = 4;

pub struct Kanban {
    settings: Settings,
    clock: Box<dyn Clock>,
    pool: Vec<Mutex<Connection>>,
}

impl Kanban {
    /// Opens (creating if needed) the database at `db_path`.
    pub fn open(db_path: &str, settings: Settings) -> Result<Self> {
        let conn = db::open(db_path)?;
        db::init(&conn)?;
        let mut pool = vec![Mutex::new(conn)];
        for _ in 1..POOL_SIZE {
            pool.push(Mutex::new(db::open(db_path)?));
        }
        debug!(db_path, connections = pool.len(), "opened connection pool");
        Ok(Self {
            settings,
            clock: Box::new(SystemClock),
            pool,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn slot(&self, board: BoardId) -> usize {
        board.0.rem_euclid(self.pool.len() as i64) as usize
    }

    fn lock(&self, board: BoardId) -> MutexGuard<'_, Connection> {
        // A panic mid-command rolled back its transaction; the connection is still usable.
        self.pool[self.slot(board)]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` with the board's connection held.
    fn read<T>(&self, board: BoardId, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock(board);
        f(&conn)
    }

    /// Runs `f` inside a write transaction on the board's connection.
    /// Any error rolls the whole command back.
    fn write<T>(&self, board: BoardId, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock(board);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn logged<T>(op: &str, board: BoardId, res: Result<T>) -> Result<T> {
        if let Err(e) = &res {
            if e.is_user_error() {
                warn!(board = %board, op, error = %e, "command rejected");
            } else {
                tracing::error!(board = %board, op, error = %e, "command failed");
            }
        }
        res
    }

    pub fn create(&self, board: BoardId, name: &str) -> Result<Task> {
        let res = self.write(board, |conn| store::create(conn, board, name));
        if let Ok(task) = &res {
            info!(board = %board, id = task.id, "created task");
        }
        Self::logged("create", board, res)
    }

    pub fn get(&self, board: BoardId, id: TaskId) -> Result<Task> {
        self.read(board, |conn| store::get(conn, board, id))
    }

    /// Returns the previous name with the updated task.
    pub fn rename(&self, board: BoardId, id: TaskId, name: &str) -> Result<(String, Task)> {
        let res = self.write(board, |conn| lifecycle::rename(conn, board, id, name));
        if res.is_ok() {
            info!(board = %board, id, "renamed task");
        }
        Self::logged("rename", board, res)
    }

    /// Copies every field of `id` into a new task. The copy shares the
    /// source's dependencies and starts with no parents.
    pub fn duplicate(&self, board: BoardId, id: TaskId) -> Result<Task> {
        let res = self.write(board, |conn| {
            let mut copy = store::get(conn, board, id)?;
            copy.parents.clear();
            let copy = store::insert_copy(conn, &copy)?;
            graph::relink_on_duplicate(conn, board, id, copy.id)?;
            Ok(copy)
        });
        if let Ok(copy) = &res {
            info!(board = %board, source = id, id = copy.id, "duplicated task");
        }
        Self::logged("duplicate", board, res)
    }

    /// Deletes the task after removing every edge that points at it.
    pub fn delete(&self, board: BoardId, id: TaskId) -> Result<Task> {
        let res = self.write(board, |conn| {
            let task = store::get(conn, board, id)?;
            graph::unlink_on_delete(conn, board, id)?;
            graph::detach_from_parents(conn, board, id)?;
            store::delete(conn, board, id)?;
            Ok(task)
        });
        if res.is_ok() {
            info!(board = %board, id, "deleted task");
        }
        Self::logged("delete", board, res)
    }

    pub fn set_status(&self, board: BoardId, id: TaskId, status: Status) -> Result<Task> {
        let res = self.write(board, |conn| lifecycle::set_status(conn, board, id, status));
        if res.is_ok() {
            info!(board = %board, id, status = %status, "changed status");
        }
        Self::logged("set_status", board, res)
    }

    /// Applies `status` to each id on its own; one failure does not stop the rest.
    pub fn set_status_many(
        &self,
        board: BoardId,
        ids: &[TaskId],
        status: Status,
    ) -> Vec<(TaskId, Result<Task>)> {
        ids.iter()
            .map(|&id| (id, self.set_status(board, id, status)))
            .collect()
    }

    /// Refreshes overdue flags, then builds all list views.
    pub fn list(&self, board: BoardId) -> Result<BoardListing> {
        let today = self.clock.today();
        let max_depth = self.settings.max_tree_depth;
        let res = self.write(board, |conn| query::list_board(conn, board, today, max_depth));
        Self::logged("list", board, res)
    }

    pub fn clear_dependencies(&self, board: BoardId, id: TaskId) -> Result<DependencyChange> {
        let res = self.write(board, |conn| graph::remove_all_dependencies(conn, board, id));
        if res.is_ok() {
            info!(board = %board, id, "cleared dependencies");
        }
        Self::logged("clear_dependencies", board, res).map(|removed| DependencyChange::Cleared { removed })
    }

    /// Adds every dependency or none of them.
    pub fn add_dependencies(&self, board: BoardId, id: TaskId, deps: &[TaskId]) -> Result<DependencyChange> {
        if deps.is_empty() {
            return Err(KanbanError::invalid("no dependency ids given"));
        }
        let policy = self.settings.cycle_policy;
        let res = self.write(board, |conn| graph::add_dependencies(conn, board, id, deps, policy));
        if res.is_ok() {
            info!(board = %board, id, deps = ?deps, "added dependencies");
        }
        Self::logged("add_dependencies", board, res).map(|()| DependencyChange::Added {
            added: deps.to_vec(),
        })
    }

    /// An empty `deps` clears; otherwise adds all of them.
    pub fn set_dependencies(&self, board: BoardId, id: TaskId, deps: &[TaskId]) -> Result<DependencyChange> {
        if deps.is_empty() {
            self.clear_dependencies(board, id)
        } else {
            self.add_dependencies(board, id, deps)
        }
    }

    pub fn set_priority(&self, board: BoardId, id: TaskId, value: &str) -> Result<Task> {
        let res = self.write(board, |conn| lifecycle::set_priority(conn, board, id, value));
        if let Ok(task) = &res {
            info!(board = %board, id, priority = %task.priority, "changed priority");
        }
        Self::logged("set_priority", board, res)
    }

    /// `input` is `dd/mm/yyyy`, or empty to clear.
    pub fn set_due_date(&self, board: BoardId, id: TaskId, input: &str) -> Result<Task> {
        let today = self.clock.today();
        let res = self.write(board, |conn| lifecycle::set_due_date(conn, board, id, input, today));
        if let Ok(task) = &res {
            info!(board = %board, id, due = ?task.due_date, "changed due date");
        }
        Self::logged("set_due_date", board, res)
    }

    /// Every task on the board as stored. Overdue flags are not refreshed.
    pub fn tasks(&self, board: BoardId) -> Result<Vec<Task>> {
        self.read(board, |conn| store::list(conn, board, |_| true))
    }

    /// Lists every edge on the board whose mirror is missing.
    pub fn check(&self, board: BoardId) -> Result<Vec<Asymmetry>> {
        self.read(board, |conn| graph::find_asymmetries(conn, board))
    }
}
