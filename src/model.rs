use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{KanbanError, Result};

pub type TaskId = i64;

/// Identifies one board (one chat). Chat ids can be negative for groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub i64);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Todo,
    Doing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "doing" => Ok(Self::Doing),
            "done" => Ok(Self::Done),
            _ => Err(KanbanError::InvalidArgument(format!(
                "invalid status '{s}': must be todo, doing, or done"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Doing => "DOING",
            Self::Done => "DONE",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Todo => "\u{1F195}",
            Self::Doing => "\u{23FA}",
            Self::Done => "\u{2611}",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Highest first, the order the priority view groups them in.
    pub const RANKED: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Parses user input. Empty input means "no priority".
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(KanbanError::InvalidPriority(s.to_string())),
        }
    }

    /// Storage form; `None` is stored as the empty string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Low => "\u{2755}",
            Self::Medium => "\u{2757}",
            Self::High => "\u{203C}",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Ordered set of task ids. Keeps insertion order, rejects repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdSet(Vec<TaskId>);

impl IdSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.0.contains(&id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: TaskId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Returns false if the id was not present.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.0.len();
        self.0.retain(|&x| x != id);
        self.0.len() != before
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<TaskId> {
        self.0.clone()
    }
}

impl FromIterator<TaskId> for IdSet {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        let mut set = IdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub board: BoardId,
    pub name: String,
    pub status: Status,
    pub dependencies: IdSet,
    pub parents: IdSet,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub overdue: bool,
}

impl Task {
    pub fn icon(&self) -> &'static str {
        self.status.icon()
    }

    pub fn is_top_level(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(Status::parse("DOING").unwrap(), Status::Doing);
        assert_eq!(Status::parse("done").unwrap(), Status::Done);
        assert!(Status::parse("blocked").is_err());
    }

    #[test]
    fn priority_parse_normalizes() {
        assert_eq!(Priority::parse("High").unwrap(), Priority::High);
        assert_eq!(Priority::parse("").unwrap(), Priority::None);
        assert!(matches!(
            Priority::parse("URGENT"),
            Err(KanbanError::InvalidPriority(v)) if v == "URGENT"
        ));
    }

    #[test]
    fn id_set_keeps_order_and_rejects_repeats() {
        let mut set = IdSet::new();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));
        assert_eq!(set.to_vec(), vec![3, 1]);
        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert_eq!(set.to_vec(), vec![1]);
    }

    #[test]
    fn id_set_serializes_as_array() {
        let set: IdSet = [4, 2, 4].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[4,2]");
    }
}
