use rusqlite::Connection;

use crate::error::Result;

// AUTOINCREMENT keeps ids from being reused after the highest task is deleted.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    board        INTEGER NOT NULL,
    name         TEXT NOT NULL CHECK(length(trim(name)) > 0),
    status       TEXT NOT NULL DEFAULT 'TODO' CHECK(status IN ('TODO', 'DOING', 'DONE')),
    dependencies TEXT NOT NULL DEFAULT '[]',
    parents      TEXT NOT NULL DEFAULT '[]',
    priority     TEXT NOT NULL DEFAULT '' CHECK(priority IN ('', 'low', 'medium', 'high')),
    due_date     TEXT,
    overdue      INTEGER NOT NULL DEFAULT 0 CHECK(overdue IN (0, 1)),
    CHECK (due_date IS NOT NULL OR overdue = 0)
);

CREATE INDEX IF NOT EXISTS tasks_board ON tasks(board, id);
";

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    init(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = open_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
    }

    #[test]
    fn schema_rejects_unknown_status() {
        let conn = open_memory().unwrap();
        let res = conn.execute(
            "INSERT INTO tasks (board, name, status) VALUES (1, 'x', 'BLOCKED')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn schema_rejects_overdue_without_date() {
        let conn = open_memory().unwrap();
        let res = conn.execute(
            "INSERT INTO tasks (board, name, overdue) VALUES (1, 'x', 1)",
            [],
        );
        assert!(res.is_err());
    }
}
