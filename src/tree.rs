//! Box-drawing rendering of a task's dependency subtree.

use std::collections::{HashMap, HashSet};

use crate::model::{Task, TaskId};

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Appended to a dependency that already appears on the path above it.
pub const CYCLE_MARKER: &str = " \u{21BB}";

/// Appended to a dependency whose subtree was already drawn earlier in the
/// same tree.
pub const SHOWN_MARKER: &str = " \u{2026}";

/// Lookup table for the tasks of one board.
pub fn index(tasks: &[Task]) -> HashMap<TaskId, &Task> {
    tasks.iter().map(|t| (t.id, t)).collect()
}

struct Frame {
    children: Vec<TaskId>,
    next: usize,
    prefix: String,
}

/// Lazily yields one line per reachable dependency, pre-order, depth-first,
/// in insertion order.
///
/// Each task is expanded at most once per tree, so the output is bounded by
/// the number of edges on the board. A dependency already on the current path
/// is printed with [`CYCLE_MARKER`]; one expanded earlier is printed again with
/// [`SHOWN_MARKER`] (when it has anything to hide) and not expanded. Nothing
/// below `max_depth` is visited. Ids missing from `tasks` are skipped.
pub struct TreeLines<'a> {
    tasks: &'a HashMap<TaskId, &'a Task>,
    stack: Vec<Frame>,
    path: Vec<TaskId>,
    expanded: HashSet<TaskId>,
    max_depth: usize,
}

impl<'a> TreeLines<'a> {
    pub fn new(
        root: &Task,
        tasks: &'a HashMap<TaskId, &'a Task>,
        prefix: &str,
        max_depth: usize,
    ) -> Self {
        let mut lines = Self {
            tasks,
            stack: Vec::new(),
            path: Vec::new(),
            expanded: HashSet::new(),
            max_depth,
        };
        if max_depth > 0 {
            lines.push_frame(root, prefix.to_string());
        }
        lines
    }

    fn children(&self, task: &Task) -> Vec<TaskId> {
        task.dependencies
            .iter()
            .filter(|id| self.tasks.contains_key(id))
            .collect()
    }

    fn push_frame(&mut self, task: &Task, prefix: String) {
        let children = self.children(task);
        self.expanded.insert(task.id);
        self.stack.push(Frame {
            children,
            next: 0,
            prefix,
        });
        self.path.push(task.id);
    }
}

impl Iterator for TreeLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.next >= frame.children.len() {
                self.stack.pop();
                self.path.pop();
                continue;
            }

            let i = frame.next;
            frame.next += 1;
            let is_last = i + 1 == frame.children.len();
            let (connector, extension) = if is_last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let id = frame.children[i];
            let line_prefix = format!("{}{connector}", frame.prefix);
            let child_prefix = format!("{}{extension}", frame.prefix);

            let tasks = self.tasks;
            let task = tasks[&id];
            let marker = if self.path.contains(&id) {
                CYCLE_MARKER
            } else if self.expanded.contains(&id) {
                if self.children(task).is_empty() {
                    ""
                } else {
                    SHOWN_MARKER
                }
            } else {
                if self.stack.len() < self.max_depth {
                    self.push_frame(task, child_prefix);
                }
                ""
            };
            return Some(format!(
                "{line_prefix}[[{}]] {} {}{marker}",
                task.id,
                task.icon(),
                task.name,
            ));
        }
    }
}

/// Renders the whole subtree below `root`, one newline-terminated line per
/// dependency. Empty when `root` has no dependencies.
pub fn render(root: &Task, tasks: &HashMap<TaskId, &Task>, prefix: &str, max_depth: usize) -> String {
    let mut out = String::new();
    for line in TreeLines::new(root, tasks, prefix, max_depth) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
