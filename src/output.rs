use crate::board::DependencyChange;
use crate::error::KanbanError;
use crate::model::{IdSet, Priority, Task, TaskId};
use crate::query::{BoardListing, TopLevelEntry};

pub const HELP: &str = "\
/new NAME
/todo ID...
/doing ID...
/done ID...
/delete ID
/list
/rename ID NAME
/dependson ID [ID...]
/duplicate ID
/priority ID [low|medium|high]
/duedate ID [dd/mm/yyyy]
/help
";

pub fn created(task: &Task) -> String {
    format!("New task *{}* [[{}]] {}", task.status, task.id, task.name)
}

pub fn renamed(id: TaskId, old: &str, new: &str) -> String {
    format!("Task {id} redefined from {old} to {new}")
}

pub fn deleted(id: TaskId) -> String {
    format!("Task [[{id}]] deleted")
}

pub fn status_changed(task: &Task) -> String {
    format!("*{}* task [[{}]] {}", task.status, task.id, task.name)
}

pub fn dependencies_changed(id: TaskId, change: &DependencyChange) -> String {
    match change {
        DependencyChange::Cleared { .. } => format!("Dependencies removed from task {id}"),
        DependencyChange::Added { .. } => format!("Task {id} dependencies up to date"),
    }
}

pub fn priority_changed(task: &Task) -> String {
    match task.priority {
        Priority::None => format!("_Cleared_ all priorities from task {}", task.id),
        p => format!("*Task {}* priority has priority *{}*", task.id, p),
    }
}

pub fn due_date_changed(task: &Task) -> String {
    match task.due_date {
        None => format!("_Cleared_ all duedate from task {}", task.id),
        Some(d) => format!("*Task {}* due date is *{}*", task.id, d.format("%d/%m/%Y")),
    }
}

/// User-facing text for an error. Storage failures stay vague; the details go to the log.
pub fn error_message(err: &KanbanError) -> String {
    match err {
        KanbanError::NotFound { id, .. } => format!("_404_ Task {id} not found x.x"),
        KanbanError::InvalidArgument(msg) => msg.clone(),
        KanbanError::InvalidPriority(_) => {
            "The priority *must be* one of the following: high, medium, low".to_string()
        }
        KanbanError::InvalidDate(_) => {
            "The duedate *must be* greater than or equal today's date".to_string()
        }
        KanbanError::DuplicateEdge { task, dep } => {
            format!("Task {task} already have a dependency of task {dep}")
        }
        KanbanError::DependencyCycle { task, dep } => {
            format!("Task {task} can't depend on task {dep}: that would make a cycle")
        }
        KanbanError::Storage(_) | KanbanError::Encoding(_) => {
            "Something went wrong, try again later".to_string()
        }
    }
}

fn push_task_line(out: &mut String, task: &Task) {
    out.push_str(&format!("[[{}]] {}\n", task.id, task.name));
}

/// Top-level tasks, each followed by its dependency tree.
pub fn format_task_list(entries: &[TopLevelEntry]) -> String {
    let mut out = String::from("\u{1F4CB} Task List\n");
    for entry in entries {
        let task = &entry.task;
        out.push_str(&format!("[[{}]] {} {}\n", task.id, task.icon(), task.name));
        out.push_str(&entry.tree);
    }
    out
}

pub fn format_status_groups(listing: &BoardListing) -> String {
    let mut out = String::from("\u{1F4DD} _Status_\n");
    for (status, tasks) in &listing.by_status {
        out.push_str(&format!("\n{} *{}*\n", status.icon(), status));
        for task in tasks {
            push_task_line(&mut out, task);
        }
    }
    out.push_str("\n\u{1F198} *OVERDUE*\n");
    for task in &listing.overdue {
        push_task_line(&mut out, task);
    }
    out
}

pub fn format_priority_groups(listing: &BoardListing) -> String {
    let mut out = String::from("_Priorities_\n");
    for (priority, tasks) in &listing.by_priority {
        out.push_str(&format!(
            "{} *{}*\n",
            priority.icon(),
            priority.as_str().to_uppercase()
        ));
        for task in tasks {
            push_task_line(&mut out, task);
        }
    }
    out
}

/// The three messages the list command replies with.
pub fn format_listing(listing: &BoardListing) -> [String; 3] {
    [
        format_task_list(&listing.top_level),
        format_status_groups(listing),
        format_priority_groups(listing),
    ]
}

pub fn format_task_detail(task: &Task) -> String {
    let ids = |set: &IdSet| {
        set.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut out = String::new();
    out.push_str(&format!("Id:           {}\n", task.id));
    out.push_str(&format!("Name:         {}\n", task.name));
    out.push_str(&format!("Status:       {} {}\n", task.icon(), task.status));
    if task.priority != Priority::None {
        out.push_str(&format!("Priority:     {}\n", task.priority));
    }
    if let Some(due) = task.due_date {
        let flag = if task.overdue { " (overdue)" } else { "" };
        out.push_str(&format!("Due:          {}{flag}\n", due.format("%d/%m/%Y")));
    }
    if !task.dependencies.is_empty() {
        out.push_str(&format!("Depends on:   {}\n", ids(&task.dependencies)));
    }
    if !task.parents.is_empty() {
        out.push_str(&format!("Needed by:    {}\n", ids(&task.parents)));
    }
    out
}

/// One line per id of a batch status change.
pub fn status_results(results: &[(TaskId, crate::error::Result<Task>)]) -> Vec<String> {
    results
        .iter()
        .map(|(_, res)| match res {
            Ok(task) => status_changed(task),
            Err(e) => error_message(e),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoardId, Status};
    use chrono::NaiveDate;

    fn make_task(id: TaskId, name: &str, status: Status) -> Task {
        Task {
            id,
            board: BoardId(1),
            name: name.to_string(),
            status,
            dependencies: IdSet::new(),
            parents: IdSet::new(),
            priority: Priority::None,
            due_date: None,
            overdue: false,
        }
    }

    #[test]
    fn command_replies() {
        let task = make_task(3, "Write report", Status::Todo);
        assert_eq!(created(&task), "New task *TODO* [[3]] Write report");
        assert_eq!(deleted(3), "Task [[3]] deleted");
        assert_eq!(renamed(3, "a", "b"), "Task 3 redefined from a to b");

        let done = make_task(3, "Write report", Status::Done);
        assert_eq!(status_changed(&done), "*DONE* task [[3]] Write report");
    }

    #[test]
    fn priority_and_due_date_replies() {
        let mut task = make_task(4, "t", Status::Todo);
        assert_eq!(priority_changed(&task), "_Cleared_ all priorities from task 4");
        task.priority = Priority::High;
        assert_eq!(priority_changed(&task), "*Task 4* priority has priority *high*");

        assert_eq!(due_date_changed(&task), "_Cleared_ all duedate from task 4");
        task.due_date = NaiveDate::from_ymd_opt(2030, 2, 1);
        assert_eq!(due_date_changed(&task), "*Task 4* due date is *01/02/2030*");
    }

    #[test]
    fn error_messages() {
        let err = KanbanError::NotFound {
            board: BoardId(1),
            id: 9,
        };
        assert_eq!(error_message(&err), "_404_ Task 9 not found x.x");
        assert_eq!(
            error_message(&KanbanError::InvalidPriority("urgent".into())),
            "The priority *must be* one of the following: high, medium, low"
        );
    }

    #[test]
    fn task_list_includes_tree() {
        let entries = vec![TopLevelEntry {
            task: make_task(1, "Write report", Status::Todo),
            tree: "└── [[2]] \u{1F195} Collect data\n".to_string(),
        }];
        assert_eq!(
            format_task_list(&entries),
            "\u{1F4CB} Task List\n[[1]] \u{1F195} Write report\n└── [[2]] \u{1F195} Collect data\n"
        );
    }

    #[test]
    fn status_groups_layout() {
        let listing = BoardListing {
            top_level: vec![],
            by_status: vec![
                (Status::Todo, vec![make_task(1, "a", Status::Todo)]),
                (Status::Doing, vec![]),
                (Status::Done, vec![make_task(2, "b", Status::Done)]),
            ],
            overdue: vec![],
            by_priority: vec![],
        };
        let out = format_status_groups(&listing);
        assert_eq!(
            out,
            "\u{1F4DD} _Status_\n\n\u{1F195} *TODO*\n[[1]] a\n\n\u{23FA} *DOING*\n\n\u{2611} *DONE*\n[[2]] b\n\n\u{1F198} *OVERDUE*\n"
        );
    }

    #[test]
    fn priority_groups_layout() {
        let mut high = make_task(5, "urgent thing", Status::Todo);
        high.priority = Priority::High;
        let listing = BoardListing {
            top_level: vec![],
            by_status: vec![],
            overdue: vec![],
            by_priority: vec![
                (Priority::High, vec![high]),
                (Priority::Medium, vec![]),
                (Priority::Low, vec![]),
            ],
        };
        assert_eq!(
            format_priority_groups(&listing),
            "_Priorities_\n\u{203C} *HIGH*\n[[5]] urgent thing\n\u{2757} *MEDIUM*\n\u{2755} *LOW*\n"
        );
    }

    #[test]
    fn detail_lists_edges() {
        let mut task = make_task(1, "t", Status::Doing);
        task.dependencies.insert(2);
        task.dependencies.insert(3);
        task.parents.insert(9);
        let out = format_task_detail(&task);
        assert!(out.contains("Depends on:   2, 3\n"));
        assert!(out.contains("Needed by:    9\n"));
        assert!(!out.contains("Priority"));
    }
}
