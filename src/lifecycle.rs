//! Status, priority and due-date changes, plus overdue derivation.
//!
//! None of these touch dependency edges.

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use tracing::debug;

use crate::error::{KanbanError, Result};
use crate::model::{BoardId, Priority, Status, Task, TaskId};
use crate::store;

/// Source of "today" for due-date checks.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn rename(conn: &Connection, board: BoardId, id: TaskId, name: &str) -> Result<(String, Task)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KanbanError::invalid(format!(
            "no new name given for task {id}"
        )));
    }
    let mut task = store::get(conn, board, id)?;
    let old = std::mem::replace(&mut task.name, name.to_string());
    store::update(conn, &task)?;
    Ok((old, task))
}

/// Any status may follow any other, including itself.
pub fn set_status(conn: &Connection, board: BoardId, id: TaskId, status: Status) -> Result<Task> {
    let mut task = store::get(conn, board, id)?;
    task.status = status;
    store::update(conn, &task)?;
    Ok(task)
}

/// Accepts high/medium/low in any case; empty clears.
pub fn set_priority(conn: &Connection, board: BoardId, id: TaskId, value: &str) -> Result<Task> {
    let mut task = store::get(conn, board, id)?;
    task.priority = Priority::parse(value)?;
    store::update(conn, &task)?;
    Ok(task)
}

/// Parses `day/month/year`.
pub fn parse_due_date(input: &str) -> Result<NaiveDate> {
    let bad = || KanbanError::invalid(format!("invalid date '{input}': expected dd/mm/yyyy"));
    let parts: Vec<&str> = input.trim().split('/').map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(bad());
    };
    let day: u32 = day.parse().map_err(|_| bad())?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

/// Empty input clears the date. A date before `today` is rejected.
pub fn set_due_date(
    conn: &Connection,
    board: BoardId,
    id: TaskId,
    input: &str,
    today: NaiveDate,
) -> Result<Task> {
    let mut task = store::get(conn, board, id)?;
    let input = input.trim();
    if input.is_empty() {
        task.due_date = None;
    } else {
        let date = parse_due_date(input)?;
        if date < today {
            return Err(KanbanError::InvalidDate(input.to_string()));
        }
        task.due_date = Some(date);
    }
    task.overdue = false;
    store::update(conn, &task)?;
    Ok(task)
}

pub fn recompute_overdue(task: &Task, today: NaiveDate) -> bool {
    task.due_date.is_some_and(|due| due < today)
}

/// Recomputes `overdue` for every task on the board and persists the ones
/// that changed. Only listing calls this.
pub fn refresh_overdue(conn: &Connection, board: BoardId, today: NaiveDate) -> Result<usize> {
    let mut changed = 0;
    for mut task in store::list(conn, board, |_| true)? {
        let overdue = recompute_overdue(&task, today);
        if overdue != task.overdue {
            task.overdue = overdue;
            store::update(conn, &task)?;
            changed += 1;
        }
    }
    if changed > 0 {
        debug!(board = %board, changed, "refreshed overdue flags");
    }
    Ok(changed)
}
