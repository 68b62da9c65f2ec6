//! Keeps `dependencies` and `parents` mirrored.
//!
//! For tasks A and B on one board, `B ∈ A.dependencies` iff `A ∈ B.parents`.
//! Every mutating function here writes both sides of an edge inside a
//! savepoint, so an edge is either fully recorded or not at all.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{KanbanError, Result};
use crate::model::{BoardId, Task, TaskId};
use crate::store;

/// What `add_dependency` does with an edge that would close a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Accept it. Rendering stays bounded regardless.
    #[default]
    Allow,
    /// Fail with `DependencyCycle`.
    Reject,
}

impl CyclePolicy {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            _ => Err(KanbanError::invalid(format!(
                "invalid cycle policy '{s}': must be allow or reject"
            ))),
        }
    }
}

/// Runs `f` inside a SQL savepoint: released on success, rolled back on error.
/// Nests inside an enclosing transaction.
fn with_savepoint<T>(conn: &Connection, f: impl FnOnce() -> Result<T>) -> Result<T> {
    conn.execute_batch("SAVEPOINT graph_edit")?;
    match f() {
        Ok(v) => {
            conn.execute_batch("RELEASE graph_edit")?;
            Ok(v)
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK TO graph_edit; RELEASE graph_edit")?;
            Err(e)
        }
    }
}

pub fn add_dependency(
    conn: &Connection,
    board: BoardId,
    task_id: TaskId,
    dep_id: TaskId,
    policy: CyclePolicy,
) -> Result<()> {
    with_savepoint(conn, || {
        let mut task = store::get(conn, board, task_id)?;
        let mut dep = store::get(conn, board, dep_id)?;
        if task.dependencies.contains(dep_id) {
            return Err(KanbanError::DuplicateEdge {
                task: task_id,
                dep: dep_id,
            });
        }
        if policy == CyclePolicy::Reject && would_create_cycle(conn, board, task_id, dep_id)? {
            return Err(KanbanError::DependencyCycle {
                task: task_id,
                dep: dep_id,
            });
        }

        if task_id == dep_id {
            task.dependencies.insert(dep_id);
            task.parents.insert(task_id);
            store::update(conn, &task)?;
        } else {
            task.dependencies.insert(dep_id);
            dep.parents.insert(task_id);
            store::update(conn, &task)?;
            store::update(conn, &dep)?;
        }
        debug!(board = %board, task = task_id, dep = dep_id, "added dependency");
        Ok(())
    })
}

/// Adds each id in order. Stops at the first failure; edges added before it
/// stay unless the caller rolls back its transaction.
pub fn add_dependencies(
    conn: &Connection,
    board: BoardId,
    task_id: TaskId,
    dep_ids: &[TaskId],
    policy: CyclePolicy,
) -> Result<()> {
    for &dep_id in dep_ids {
        add_dependency(conn, board, task_id, dep_id, policy)?;
    }
    Ok(())
}

/// Clears `task.dependencies` and drops `task_id` from each dependency's parents.
/// Returns the ids that were removed.
pub fn remove_all_dependencies(
    conn: &Connection,
    board: BoardId,
    task_id: TaskId,
) -> Result<Vec<TaskId>> {
    with_savepoint(conn, || {
        let mut task = store::get(conn, board, task_id)?;
        let removed = task.dependencies.to_vec();
        for &dep_id in &removed {
            if dep_id == task_id {
                task.parents.remove(task_id);
                continue;
            }
            drop_parent(conn, board, dep_id, task_id)?;
        }
        task.dependencies.clear();
        store::update(conn, &task)?;
        debug!(board = %board, task = task_id, count = removed.len(), "cleared dependencies");
        Ok(removed)
    })
}

/// Drops `task_id` from the parents of everything it depends on. Run before
/// deleting the task; its own `parents` are left alone.
pub fn unlink_on_delete(conn: &Connection, board: BoardId, task_id: TaskId) -> Result<()> {
    with_savepoint(conn, || {
        let task = store::get(conn, board, task_id)?;
        for dep_id in task.dependencies.iter().filter(|&d| d != task_id) {
            drop_parent(conn, board, dep_id, task_id)?;
        }
        Ok(())
    })
}

/// Drops `task_id` from the dependencies of every task that lists it as a
/// dependency. Run before deleting the task so parents keep no dangling ids.
pub fn detach_from_parents(conn: &Connection, board: BoardId, task_id: TaskId) -> Result<()> {
    with_savepoint(conn, || {
        let task = store::get(conn, board, task_id)?;
        for parent_id in task.parents.iter().filter(|&p| p != task_id) {
            let Some(mut parent) = store::find(conn, board, parent_id)? else {
                continue;
            };
            if parent.dependencies.remove(task_id) {
                store::update(conn, &parent)?;
            }
        }
        Ok(())
    })
}

/// Adds `new_id` to the parents of every dependency of `source_id`. The new
/// task is expected to already carry a copy of the source's dependencies.
pub fn relink_on_duplicate(
    conn: &Connection,
    board: BoardId,
    source_id: TaskId,
    new_id: TaskId,
) -> Result<()> {
    with_savepoint(conn, || {
        let source = store::get(conn, board, source_id)?;
        for dep_id in source.dependencies.iter() {
            let Some(mut dep) = store::find(conn, board, dep_id)? else {
                continue;
            };
            if dep.parents.insert(new_id) {
                store::update(conn, &dep)?;
            }
        }
        Ok(())
    })
}

fn drop_parent(conn: &Connection, board: BoardId, dep_id: TaskId, parent_id: TaskId) -> Result<()> {
    // A dependency may already be gone; nothing to mirror then.
    let Some(mut dep) = store::find(conn, board, dep_id)? else {
        return Ok(());
    };
    if dep.parents.remove(parent_id) {
        store::update(conn, &dep)?;
    }
    Ok(())
}

/// True if making `task_id` depend on `dep_id` would close a cycle, i.e.
/// `task_id` is reachable from `dep_id` by following dependencies.
pub fn would_create_cycle(
    conn: &Connection,
    board: BoardId,
    task_id: TaskId,
    dep_id: TaskId,
) -> Result<bool> {
    if task_id == dep_id {
        return Ok(true);
    }
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(dep_id);
    visited.insert(dep_id);

    while let Some(current) = queue.pop_front() {
        let Some(task) = store::find(conn, board, current)? else {
            continue;
        };
        for next in task.dependencies.iter() {
            if next == task_id {
                return Ok(true);
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    Ok(false)
}

/// One broken or dangling edge found by [`find_asymmetries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asymmetry {
    /// `task` lists `dep` as a dependency, but `dep.parents` lacks `task`.
    MissingParent { task: TaskId, dep: TaskId },
    /// `task` lists `parent` as a parent, but `parent.dependencies` lacks `task`.
    MissingDependency { task: TaskId, parent: TaskId },
    /// `task.dependencies` names an id that is not on the board.
    DanglingDependency { task: TaskId, dep: TaskId },
    /// `task.parents` names an id that is not on the board.
    DanglingParent { task: TaskId, parent: TaskId },
}

impl fmt::Display for Asymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParent { task, dep } => {
                write!(f, "task {task} depends on {dep}, but {dep} does not list {task} as parent")
            }
            Self::MissingDependency { task, parent } => write!(
                f,
                "task {task} lists parent {parent}, but {parent} does not depend on {task}"
            ),
            Self::DanglingDependency { task, dep } => {
                write!(f, "task {task} depends on missing task {dep}")
            }
            Self::DanglingParent { task, parent } => {
                write!(f, "task {task} lists missing parent {parent}")
            }
        }
    }
}

/// Audits the whole board and reports every edge whose mirror is absent.
pub fn find_asymmetries(conn: &Connection, board: BoardId) -> Result<Vec<Asymmetry>> {
    let tasks = store::list(conn, board, |_| true)?;
    Ok(asymmetries_in(&tasks))
}

fn asymmetries_in(tasks: &[Task]) -> Vec<Asymmetry> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let mut found = Vec::new();
    for task in tasks {
        for dep in task.dependencies.iter() {
            match by_id.get(&dep) {
                Some(d) if !d.parents.contains(task.id) => found.push(Asymmetry::MissingParent {
                    task: task.id,
                    dep,
                }),
                Some(_) => {}
                None => found.push(Asymmetry::DanglingDependency { task: task.id, dep }),
            }
        }
        for parent in task.parents.iter() {
            match by_id.get(&parent) {
                Some(p) if !p.dependencies.contains(task.id) => {
                    found.push(Asymmetry::MissingDependency {
                        task: task.id,
                        parent,
                    })
                }
                Some(_) => {}
                None => found.push(Asymmetry::DanglingParent {
                    task: task.id,
                    parent,
                }),
            }
        }
    }
    found
}
