//! Chat-style commands (`/new Buy milk`, `/done 3 4`) and their replies.

use tracing::debug;

use crate::board::Kanban;
use crate::error::{KanbanError, Result};
use crate::model::{BoardId, Status, TaskId};
use crate::output;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    New { name: String },
    Rename { id: TaskId, name: String },
    Duplicate { id: TaskId },
    Delete { id: TaskId },
    /// Raw id tokens; each one is parsed and applied on its own.
    SetStatus { status: Status, targets: Vec<String> },
    List,
    /// Empty `deps` clears the task's dependencies.
    DependsOn { id: TaskId, deps: Vec<TaskId> },
    Priority { id: TaskId, value: String },
    DueDate { id: TaskId, value: String },
    Start,
    Help,
    Unknown(String),
}

fn missing_id() -> KanbanError {
    KanbanError::invalid("You must inform the task id")
}

fn parse_id(token: &str) -> Result<TaskId> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(missing_id());
    }
    token.parse().map_err(|_| missing_id())
}

fn split_tokens(text: &str) -> Result<Vec<String>> {
    shlex::split(text).ok_or_else(|| KanbanError::invalid("unbalanced quotes in command"))
}

/// Splits `"12 rest of text"` into the id and the trimmed remainder.
fn id_and_rest(args: &str) -> Result<(TaskId, &str)> {
    let (id, rest) = args.split_once(' ').unwrap_or((args, ""));
    Ok((parse_id(id)?, rest.trim()))
}

/// Parses one message. Fails only on malformed arguments; unknown verbs
/// become [`ChatCommand::Unknown`].
pub fn parse(text: &str) -> Result<ChatCommand> {
    let text = text.trim();
    let (verb, args) = text.split_once(' ').unwrap_or((text, ""));
    let args = args.trim();
    // Group chats address bots as `/cmd@botname`.
    let verb = verb.split('@').next().unwrap_or(verb);

    let status = |s| -> Result<ChatCommand> {
        Ok(ChatCommand::SetStatus {
            status: s,
            targets: split_tokens(args)?,
        })
    };

    match verb {
        "/new" => {
            if args.is_empty() {
                return Err(KanbanError::invalid("You must inform the task name"));
            }
            Ok(ChatCommand::New {
                name: args.to_string(),
            })
        }
        "/rename" => {
            let (id, name) = id_and_rest(args)?;
            if name.is_empty() {
                return Err(KanbanError::invalid(format!(
                    "You want to modify task {id}, but you didn't provide any new text"
                )));
            }
            Ok(ChatCommand::Rename {
                id,
                name: name.to_string(),
            })
        }
        "/duplicate" => Ok(ChatCommand::Duplicate { id: parse_id(args)? }),
        "/delete" => Ok(ChatCommand::Delete { id: parse_id(args)? }),
        "/todo" => status(Status::Todo),
        "/doing" => status(Status::Doing),
        "/done" => status(Status::Done),
        "/list" => Ok(ChatCommand::List),
        "/dependson" => {
            let (id, rest) = id_and_rest(args)?;
            let deps = split_tokens(rest)?
                .iter()
                .map(|t| {
                    t.parse::<TaskId>().map_err(|_| {
                        KanbanError::invalid(format!(
                            "All dependencies ids must be numeric, and not {t}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ChatCommand::DependsOn { id, deps })
        }
        "/priority" => {
            let (id, value) = id_and_rest(args)?;
            Ok(ChatCommand::Priority {
                id,
                value: value.to_string(),
            })
        }
        "/duedate" => {
            let (id, value) = id_and_rest(args)?;
            Ok(ChatCommand::DueDate {
                id,
                value: value.to_string(),
            })
        }
        "/start" => Ok(ChatCommand::Start),
        "/help" => Ok(ChatCommand::Help),
        other => Ok(ChatCommand::Unknown(other.to_string())),
    }
}

fn reply<T>(res: Result<T>, ok: impl FnOnce(T) -> String) -> Vec<String> {
    match res {
        Ok(v) => vec![ok(v)],
        Err(e) => vec![output::error_message(&e)],
    }
}

/// Runs a parsed command on `board` and returns the reply messages in order.
pub fn execute(kanban: &Kanban, board: BoardId, cmd: ChatCommand) -> Vec<String> {
    debug!(board = %board, command = ?cmd, "executing chat command");
    match cmd {
        ChatCommand::New { name } => reply(kanban.create(board, &name), |t| output::created(&t)),
        ChatCommand::Rename { id, name } => reply(kanban.rename(board, id, &name), |(old, t)| {
            output::renamed(id, &old, &t.name)
        }),
        ChatCommand::Duplicate { id } => {
            reply(kanban.duplicate(board, id), |t| output::created(&t))
        }
        ChatCommand::Delete { id } => reply(kanban.delete(board, id), |_| output::deleted(id)),
        ChatCommand::SetStatus { status, targets } => {
            if targets.is_empty() {
                return vec![output::error_message(&missing_id())];
            }
            targets
                .iter()
                .map(|token| {
                    let res = parse_id(token).and_then(|id| kanban.set_status(board, id, status));
                    match res {
                        Ok(task) => output::status_changed(&task),
                        Err(e) => output::error_message(&e),
                    }
                })
                .collect()
        }
        ChatCommand::List => match kanban.list(board) {
            Ok(listing) => output::format_listing(&listing).into(),
            Err(e) => vec![output::error_message(&e)],
        },
        ChatCommand::DependsOn { id, deps } => reply(kanban.set_dependencies(board, id, &deps), |c| {
            output::dependencies_changed(id, &c)
        }),
        ChatCommand::Priority { id, value } => {
            reply(kanban.set_priority(board, id, &value), |t| output::priority_changed(&t))
        }
        ChatCommand::DueDate { id, value } => {
            reply(kanban.set_due_date(board, id, &value), |t| output::due_date_changed(&t))
        }
        ChatCommand::Start => vec![
            "Welcome! Here is a list of things you can do.".to_string(),
            output::HELP.to_string(),
        ],
        ChatCommand::Help => vec![
            "Here is a list of things you can do.".to_string(),
            output::HELP.to_string(),
        ],
        ChatCommand::Unknown(_) => vec!["I'm sorry dave. I'm afraid I can't do that.".to_string()],
    }
}

/// Parses and runs one message. Parse errors become a single reply.
pub fn handle(kanban: &Kanban, board: BoardId, text: &str) -> Vec<String> {
    match parse(text) {
        Ok(cmd) => execute(kanban, board, cmd),
        Err(e) => vec![output::error_message(&e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_new_with_spaces() {
        assert_eq!(
            parse("/new Write the report").unwrap(),
            ChatCommand::New {
                name: "Write the report".into()
            }
        );
    }

    #[test]
    fn strips_bot_suffix() {
        assert_eq!(parse("/list@kanbot").unwrap(), ChatCommand::List);
    }

    #[test]
    fn rename_requires_text() {
        assert_eq!(
            parse("/rename 3 New name").unwrap(),
            ChatCommand::Rename {
                id: 3,
                name: "New name".into()
            }
        );
        let err = parse("/rename 3").unwrap_err();
        assert!(err.to_string().contains("didn't provide any new text"));
    }

    #[test]
    fn non_numeric_id_rejected() {
        for text in ["/delete abc", "/delete", "/duplicate -1", "/priority x high"] {
            assert_eq!(
                parse(text).unwrap_err().to_string(),
                "You must inform the task id",
                "{text}"
            );
        }
    }

    #[test]
    fn status_keeps_raw_targets() {
        assert_eq!(
            parse("/done 1 x 3").unwrap(),
            ChatCommand::SetStatus {
                status: Status::Done,
                targets: vec!["1".into(), "x".into(), "3".into()],
            }
        );
    }

    #[test]
    fn dependson_forms() {
        assert_eq!(
            parse("/dependson 1").unwrap(),
            ChatCommand::DependsOn { id: 1, deps: vec![] }
        );
        assert_eq!(
            parse("/dependson 1 2  3").unwrap(),
            ChatCommand::DependsOn {
                id: 1,
                deps: vec![2, 3]
            }
        );
        let err = parse("/dependson 1 2 b").unwrap_err();
        assert_eq!(err.to_string(), "All dependencies ids must be numeric, and not b");
    }

    #[test]
    fn priority_and_duedate_keep_value() {
        assert_eq!(
            parse("/priority 2 High").unwrap(),
            ChatCommand::Priority {
                id: 2,
                value: "High".into()
            }
        );
        assert_eq!(
            parse("/duedate 2").unwrap(),
            ChatCommand::DueDate {
                id: 2,
                value: String::new()
            }
        );
    }

    #[test]
    fn unknown_verb() {
        assert_eq!(
            parse("hello there").unwrap(),
            ChatCommand::Unknown("hello".into())
        );
    }
}
