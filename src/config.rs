//! Path resolution and engine settings.

use crate::error::{KanbanError, Result};
use crate::graph::CyclePolicy;
use crate::tree::DEFAULT_MAX_DEPTH;

pub const CYCLES_ENV: &str = "KANBOT_CYCLES";
pub const MAX_DEPTH_ENV: &str = "KANBOT_MAX_DEPTH";

/// Where the database lives when neither `--db` nor `KANBOT_DB` is given.
pub fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    format!("{home}/.kanbot/kanbot.db")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub cycle_policy: CyclePolicy,
    /// Deepest dependency level the tree view descends to.
    pub max_tree_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cycle_policy: CyclePolicy::Allow,
            max_tree_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Settings {
    /// Defaults overridden by `KANBOT_CYCLES` and `KANBOT_MAX_DEPTH` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(v) = lookup(CYCLES_ENV) {
            settings.cycle_policy = CyclePolicy::parse(&v)?;
        }
        if let Some(v) = lookup(MAX_DEPTH_ENV) {
            settings.max_tree_depth = v.trim().parse().map_err(|_| {
                KanbanError::invalid(format!("{MAX_DEPTH_ENV} must be a non-negative integer, got '{v}'"))
            })?;
        }
        Ok(settings)
    }
}
