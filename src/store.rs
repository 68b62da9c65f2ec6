//! Board-scoped task storage.
//!
//! Every function filters by board, so an id that belongs to another board
//! is indistinguishable from a missing one.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{KanbanError, Result};
use crate::model::{BoardId, IdSet, Priority, Status, Task, TaskId};

const TASK_COLUMNS: &str =
    "id, board, name, status, dependencies, parents, priority, due_date, overdue";

const INSERT_TASK: &str = "
INSERT INTO tasks (board, name, status, dependencies, parents, priority, due_date, overdue)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
";

const UPDATE_TASK: &str = "
UPDATE tasks
SET name = ?1, status = ?2, dependencies = ?3, parents = ?4,
    priority = ?5, due_date = ?6, overdue = ?7
WHERE board = ?8 AND id = ?9
";

/// Raw column values; decoding the JSON edge sets happens outside the row closure
/// so serde errors keep their own error kind.
struct TaskRow {
    id: TaskId,
    board: i64,
    name: String,
    status: String,
    dependencies: String,
    parents: String,
    priority: String,
    due_date: Option<NaiveDate>,
    overdue: bool,
}

fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        board: row.get(1)?,
        name: row.get(2)?,
        status: row.get(3)?,
        dependencies: row.get(4)?,
        parents: row.get(5)?,
        priority: row.get(6)?,
        due_date: row.get(7)?,
        overdue: row.get(8)?,
    })
}

impl TaskRow {
    fn decode(self) -> Result<Task> {
        Ok(Task {
            id: self.id,
            board: BoardId(self.board),
            name: self.name,
            status: Status::parse(&self.status)?,
            dependencies: serde_json::from_str::<IdSet>(&self.dependencies)?,
            parents: serde_json::from_str::<IdSet>(&self.parents)?,
            priority: Priority::parse(&self.priority)?,
            due_date: self.due_date,
            overdue: self.overdue,
        })
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KanbanError::invalid("task name must not be empty"));
    }
    Ok(name)
}

/// Creates a fresh TODO task with no edges.
pub fn create(conn: &Connection, board: BoardId, name: &str) -> Result<Task> {
    let name = validate_name(name)?;
    let task = Task {
        id: 0,
        board,
        name: name.to_string(),
        status: Status::Todo,
        dependencies: IdSet::new(),
        parents: IdSet::new(),
        priority: Priority::None,
        due_date: None,
        overdue: false,
    };
    insert_copy(conn, &task)
}

/// Inserts `task` as a new record. The store assigns the id; `task.id` is ignored.
pub fn insert_copy(conn: &Connection, task: &Task) -> Result<Task> {
    let name = validate_name(&task.name)?;
    conn.execute(
        INSERT_TASK,
        rusqlite::params![
            task.board.0,
            name,
            task.status.as_str(),
            serde_json::to_string(&task.dependencies)?,
            serde_json::to_string(&task.parents)?,
            task.priority.as_str(),
            task.due_date,
            task.overdue && task.due_date.is_some(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, task.board, id)
}

pub fn find(conn: &Connection, board: BoardId, id: TaskId) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE board = ?1 AND id = ?2");
    let row = conn
        .query_row(&sql, rusqlite::params![board.0, id], read_task_row)
        .optional()?;
    row.map(TaskRow::decode).transpose()
}

pub fn get(conn: &Connection, board: BoardId, id: TaskId) -> Result<Task> {
    find(conn, board, id)?.ok_or(KanbanError::NotFound { board, id })
}

/// All tasks on the board matching `pred`, ordered by id.
pub fn list<F>(conn: &Connection, board: BoardId, pred: F) -> Result<Vec<Task>>
where
    F: Fn(&Task) -> bool,
{
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE board = ?1 ORDER BY id");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt
        .query_map([board.0], read_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        let task = row.decode()?;
        if pred(&task) {
            tasks.push(task);
        }
    }
    Ok(tasks)
}

pub fn update(conn: &Connection, task: &Task) -> Result<()> {
    let name = validate_name(&task.name)?;
    let changed = conn.execute(
        UPDATE_TASK,
        rusqlite::params![
            name,
            task.status.as_str(),
            serde_json::to_string(&task.dependencies)?,
            serde_json::to_string(&task.parents)?,
            task.priority.as_str(),
            task.due_date,
            task.overdue && task.due_date.is_some(),
            task.board.0,
            task.id,
        ],
    )?;
    if changed == 0 {
        return Err(KanbanError::NotFound {
            board: task.board,
            id: task.id,
        });
    }
    Ok(())
}

pub fn delete(conn: &Connection, board: BoardId, id: TaskId) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM tasks WHERE board = ?1 AND id = ?2",
        rusqlite::params![board.0, id],
    )?;
    if changed == 0 {
        return Err(KanbanError::NotFound { board, id });
    }
    Ok(())
}
