//! Read-only board views. `top_level` and `list_board` refresh overdue flags
//! before reading; the other views report whatever is stored.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;
use crate::lifecycle;
use crate::model::{BoardId, Priority, Status, Task};
use crate::store;
use crate::tree;

/// A task with no parents and its rendered dependency tree.
#[derive(Debug, Clone, Serialize)]
pub struct TopLevelEntry {
    #[serde(flatten)]
    pub task: Task,
    pub tree: String,
}

/// Everything the list command shows, in one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BoardListing {
    pub top_level: Vec<TopLevelEntry>,
    pub by_status: Vec<(Status, Vec<Task>)>,
    pub overdue: Vec<Task>,
    pub by_priority: Vec<(Priority, Vec<Task>)>,
}

fn top_level_in(tasks: &[Task], max_depth: usize) -> Vec<TopLevelEntry> {
    let idx = tree::index(tasks);
    tasks
        .iter()
        .filter(|t| t.is_top_level())
        .map(|t| TopLevelEntry {
            task: t.clone(),
            tree: tree::render(t, &idx, "", max_depth),
        })
        .collect()
}

fn with_status(tasks: &[Task], status: Status) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.status == status && !t.overdue)
        .cloned()
        .collect()
}

fn with_priority(tasks: &[Task], priority: Priority) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.priority == priority)
        .cloned()
        .collect()
}

pub fn top_level(
    conn: &Connection,
    board: BoardId,
    today: NaiveDate,
    max_depth: usize,
) -> Result<Vec<TopLevelEntry>> {
    lifecycle::refresh_overdue(conn, board, today)?;
    let tasks = store::list(conn, board, |_| true)?;
    Ok(top_level_in(&tasks, max_depth))
}

/// Tasks in `status` that are not overdue. Overdue tasks are listed separately.
pub fn by_status(conn: &Connection, board: BoardId, status: Status) -> Result<Vec<Task>> {
    store::list(conn, board, |t| t.status == status && !t.overdue)
}

pub fn overdue(conn: &Connection, board: BoardId) -> Result<Vec<Task>> {
    store::list(conn, board, |t| t.overdue)
}

pub fn by_priority(conn: &Connection, board: BoardId, priority: Priority) -> Result<Vec<Task>> {
    store::list(conn, board, |t| t.priority == priority)
}

/// Refreshes overdue flags, then builds every view from one read of the board.
pub fn list_board(
    conn: &Connection,
    board: BoardId,
    today: NaiveDate,
    max_depth: usize,
) -> Result<BoardListing> {
    lifecycle::refresh_overdue(conn, board, today)?;
    let tasks = store::list(conn, board, |_| true)?;
    Ok(BoardListing {
        top_level: top_level_in(&tasks, max_depth),
        by_status: Status::ALL
            .into_iter()
            .map(|s| (s, with_status(&tasks, s)))
            .collect(),
        overdue: tasks.iter().filter(|t| t.overdue).cloned().collect(),
        by_priority: Priority::RANKED
            .into_iter()
            .map(|p| (p, with_priority(&tasks, p)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::graph::{self, CyclePolicy};

    const BOARD: BoardId = BoardId(1);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn top_level_excludes_tasks_with_parents() {
        let conn = db::open_memory().unwrap();
        let n = store::create(&conn, BOARD, "Write report").unwrap().id;
        let m = store::create(&conn, BOARD, "Collect data").unwrap().id;
        graph::add_dependency(&conn, BOARD, n, m, CyclePolicy::Allow).unwrap();

        let entries = top_level(&conn, BOARD, date(2024, 1, 1), tree::DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task.id, n);
        assert_eq!(entries[0].tree, format!("└── [[{m}]] \u{1F195} Collect data\n"));
    }

    #[test]
    fn status_view_hides_overdue_tasks() {
        let conn = db::open_memory().unwrap();
        let today = date(2024, 5, 10);
        let a = store::create(&conn, BOARD, "a").unwrap().id;
        let b = store::create(&conn, BOARD, "b").unwrap().id;
        lifecycle::set_due_date(&conn, BOARD, b, "10/05/2024", today).unwrap();
        lifecycle::refresh_overdue(&conn, BOARD, date(2024, 5, 20)).unwrap();

        assert_eq!(ids(&by_status(&conn, BOARD, Status::Todo).unwrap()), vec![a]);
        assert_eq!(ids(&overdue(&conn, BOARD).unwrap()), vec![b]);
    }

    #[test]
    fn priority_view_groups_by_value() {
        let conn = db::open_memory().unwrap();
        let a = store::create(&conn, BOARD, "a").unwrap().id;
        let b = store::create(&conn, BOARD, "b").unwrap().id;
        let c = store::create(&conn, BOARD, "c").unwrap().id;
        lifecycle::set_priority(&conn, BOARD, a, "high").unwrap();
        lifecycle::set_priority(&conn, BOARD, c, "HIGH").unwrap();
        lifecycle::set_priority(&conn, BOARD, b, "low").unwrap();

        assert_eq!(ids(&by_priority(&conn, BOARD, Priority::High).unwrap()), vec![a, c]);
        assert_eq!(ids(&by_priority(&conn, BOARD, Priority::Low).unwrap()), vec![b]);
        assert!(by_priority(&conn, BOARD, Priority::Medium).unwrap().is_empty());
    }

    #[test]
    fn listing_refreshes_overdue_first() {
        let conn = db::open_memory().unwrap();
        let a = store::create(&conn, BOARD, "a").unwrap().id;
        lifecycle::set_due_date(&conn, BOARD, a, "10/05/2024", date(2024, 5, 10)).unwrap();

        let listing = list_board(&conn, BOARD, date(2024, 5, 11), tree::DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(ids(&listing.overdue), vec![a]);
        assert!(listing.by_status.iter().all(|(_, tasks)| tasks.is_empty()));
        assert!(store::get(&conn, BOARD, a).unwrap().overdue);

        // Pushing the date out clears the flag immediately.
        lifecycle::set_due_date(&conn, BOARD, a, "1/1/2025", date(2024, 5, 11)).unwrap();
        let listing = list_board(&conn, BOARD, date(2024, 5, 11), tree::DEFAULT_MAX_DEPTH).unwrap();
        assert!(listing.overdue.is_empty());
        assert_eq!(ids(&listing.by_status[0].1), vec![a]);
    }

    #[test]
    fn listing_orders_groups() {
        let conn = db::open_memory().unwrap();
        store::create(&conn, BOARD, "a").unwrap();
        let listing = list_board(&conn, BOARD, date(2024, 1, 1), tree::DEFAULT_MAX_DEPTH).unwrap();
        let statuses: Vec<_> = listing.by_status.iter().map(|(s, _)| *s).collect();
        assert_eq!(statuses, vec![Status::Todo, Status::Doing, Status::Done]);
        let priorities: Vec<_> = listing.by_priority.iter().map(|(p, _)| *p).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }
}
