use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use kanbot::{BoardId, Kanban};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

/// Signals on every filesystem event in the directory holding the database.
/// Keep the returned watcher alive for as long as events are wanted.
fn watch_db_dir(db_path: &str) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    })
    .context("failed to create file watcher")?;

    // SQLite writes through -wal and -journal siblings, so watch the directory.
    let dir = match Path::new(db_path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    Ok((watcher, rx))
}

/// Blocks until a task on `board` is created, edited or removed.
///
/// Filesystem events only wake the loop; the board's tasks are re-read and
/// compared with the state at entry, so writes to other boards are ignored.
/// Returns false when `timeout` passes first; `None` waits indefinitely.
pub fn wait_for_board_change(
    kanban: &Kanban,
    board: BoardId,
    db_path: &str,
    timeout: Option<Duration>,
) -> Result<bool> {
    let (_watcher, rx) = watch_db_dir(db_path)?;
    let baseline = kanban.tasks(board)?;
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        let event = match deadline {
            Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match event {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => return Ok(false),
            Err(RecvTimeoutError::Disconnected) => anyhow::bail!("file watcher stopped"),
        }
        while rx.try_recv().is_ok() {}

        if kanban.tasks(board)? != baseline {
            debug!(board = %board, "board changed");
            return Ok(true);
        }
    }
}
