use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kanbot", about = "Per-chat kanban boards")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.kanbot/kanbot.db]
    #[arg(long, env = "KANBOT_DB", global = true)]
    pub db: Option<String>,

    /// Board (chat) id to operate on
    #[arg(short, long, env = "KANBOT_BOARD", global = true, default_value_t = 0, allow_negative_numbers = true)]
    pub board: i64,

    /// Dependency cycle policy (allow, reject) [env: KANBOT_CYCLES]
    #[arg(long, global = true)]
    pub cycles: Option<String>,

    /// Deepest level the dependency tree is drawn to [env: KANBOT_MAX_DEPTH]
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a task
    New {
        /// Task name (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Rename a task
    Rename {
        id: i64,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Copy a task under a new id
    Duplicate { id: i64 },

    /// Delete a task and every edge pointing at it
    Delete { id: i64 },

    /// Move tasks to TODO
    Todo {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Move tasks to DOING
    Doing {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Move tasks to DONE
    Done {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Show the board: task trees, status groups and priorities
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task details
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a task's dependencies (no ids clears them)
    DependsOn { id: i64, deps: Vec<i64> },

    /// Set a task's priority (low, medium, high; omit to clear)
    Priority { id: i64, value: Option<String> },

    /// Set a task's due date as dd/mm/yyyy (omit to clear)
    DueDate { id: i64, date: Option<String> },

    /// Run chat commands such as "/new Buy milk" (omit to read lines from stdin)
    Exec { text: Option<String> },

    /// Report dependency edges that are missing their mirror
    Check,

    /// Block until a task on the board changes
    Wait {
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}
