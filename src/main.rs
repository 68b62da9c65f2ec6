mod cli;
mod logging;
mod watch;

use std::io::BufRead as _;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use kanbot::config::{self, Settings};
use kanbot::graph::CyclePolicy;
use kanbot::{command, output, BoardId, Kanban, Status};

fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(policy) = &cli.cycles {
        settings.cycle_policy = CyclePolicy::parse(policy)?;
    }
    if let Some(depth) = cli.max_depth {
        settings.max_tree_depth = depth;
    }
    Ok(settings)
}

fn print_replies(replies: &[String]) {
    for reply in replies {
        println!("{}", reply.trim_end());
    }
}

fn set_status(kanban: &Kanban, board: BoardId, ids: &[i64], status: Status) -> Result<()> {
    let results = kanban.set_status_many(board, ids, status);
    let failed = results.iter().any(|(_, res)| res.is_err());
    print_replies(&output::status_results(&results));
    if failed {
        anyhow::bail!("some tasks were not moved to {status}");
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;
    let db_path = cli.db.clone().unwrap_or_else(config::default_db_path);
    ensure_db_dir(&db_path)?;
    let settings = settings(&cli)?;
    let board = BoardId(cli.board);
    let kanban = Kanban::open(&db_path, settings)
        .with_context(|| format!("failed to open database {db_path}"))?;

    match cli.command {
        Command::New { name } => {
            let task = kanban.create(board, &name.join(" "))?;
            println!("{}", output::created(&task));
        }

        Command::Rename { id, name } => {
            let (old, task) = kanban.rename(board, id, &name.join(" "))?;
            println!("{}", output::renamed(id, &old, &task.name));
        }

        Command::Duplicate { id } => {
            let task = kanban.duplicate(board, id)?;
            println!("{}", output::created(&task));
        }

        Command::Delete { id } => {
            kanban.delete(board, id)?;
            println!("{}", output::deleted(id));
        }

        Command::Todo { ids } => set_status(&kanban, board, &ids, Status::Todo)?,
        Command::Doing { ids } => set_status(&kanban, board, &ids, Status::Doing)?,
        Command::Done { ids } => set_status(&kanban, board, &ids, Status::Done)?,

        Command::List { json } => {
            let listing = kanban.list(board)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("{}", output::format_listing(&listing).join("\n"));
            }
        }

        Command::Show { id, json } => {
            let task = kanban.get(board, id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print!("{}", output::format_task_detail(&task));
            }
        }

        Command::DependsOn { id, deps } => {
            let change = kanban.set_dependencies(board, id, &deps)?;
            println!("{}", output::dependencies_changed(id, &change));
        }

        Command::Priority { id, value } => {
            let task = kanban.set_priority(board, id, value.as_deref().unwrap_or(""))?;
            println!("{}", output::priority_changed(&task));
        }

        Command::DueDate { id, date } => {
            let task = kanban.set_due_date(board, id, date.as_deref().unwrap_or(""))?;
            println!("{}", output::due_date_changed(&task));
        }

        Command::Exec { text } => match text {
            Some(text) => print_replies(&command::handle(&kanban, board, &text)),
            None => {
                for line in std::io::stdin().lock().lines() {
                    let line = line.context("failed to read stdin")?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    print_replies(&command::handle(&kanban, board, &line));
                }
            }
        },

        Command::Check => {
            let problems = kanban.check(board)?;
            for problem in &problems {
                println!("{problem}");
            }
            if !problems.is_empty() {
                anyhow::bail!("{} asymmetric edge(s) on board {board}", problems.len());
            }
            eprintln!("Board {board} is consistent");
        }

        Command::Wait { timeout } => {
            let timeout = timeout.map(Duration::from_millis);
            if !watch::wait_for_board_change(&kanban, board, &db_path, timeout)? {
                eprintln!("No changes");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
