//! Property tests: no sequence of board commands breaks the dependency mirror.

use chrono::NaiveDate;
use kanbot::config::Settings;
use kanbot::graph::CyclePolicy;
use kanbot::lifecycle::FixedClock;
use kanbot::{BoardId, Kanban, Status, TaskId};
use proptest::prelude::*;
use std::collections::HashSet;

const BOARD: BoardId = BoardId(3);

#[derive(Debug, Clone)]
enum Op {
    Create,
    Depend(usize, Vec<usize>),
    Clear(usize),
    Delete(usize),
    Duplicate(usize),
    Status(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        4 => (any::<usize>(), proptest::collection::vec(any::<usize>(), 1..4))
            .prop_map(|(t, deps)| Op::Depend(t, deps)),
        1 => any::<usize>().prop_map(Op::Clear),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => any::<usize>().prop_map(Op::Duplicate),
        1 => any::<usize>().prop_map(Op::Status),
    ]
}

fn open(dir: &tempfile::TempDir, policy: CyclePolicy) -> Kanban {
    let path = dir.path().join("kanbot.db");
    let settings = Settings {
        cycle_policy: policy,
        ..Settings::default()
    };
    Kanban::open(path.to_str().unwrap(), settings)
        .unwrap()
        .with_clock(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
}

/// Applies `ops`, picking targets from the live ids, and audits the mirror
/// after every step. Command errors are expected (duplicates, cycles under
/// `Reject`) and ignored.
fn apply(kanban: &Kanban, ops: &[Op]) -> Result<Vec<TaskId>, TestCaseError> {
    let mut live: Vec<TaskId> = Vec::new();
    for op in ops {
        let pick = |live: &[TaskId], i: usize| live[i % live.len()];
        match op {
            Op::Create => live.push(kanban.create(BOARD, "task").unwrap().id),
            _ if live.is_empty() => {}
            Op::Depend(t, deps) => {
                let deps: Vec<_> = deps.iter().map(|&d| pick(&live, d)).collect();
                let _ = kanban.add_dependencies(BOARD, pick(&live, *t), &deps);
            }
            Op::Clear(t) => {
                kanban.clear_dependencies(BOARD, pick(&live, *t)).unwrap();
            }
            Op::Delete(t) => {
                let id = pick(&live, *t);
                kanban.delete(BOARD, id).unwrap();
                live.retain(|&x| x != id);
            }
            Op::Duplicate(t) => {
                let copy = kanban.duplicate(BOARD, pick(&live, *t)).unwrap();
                live.push(copy.id);
            }
            Op::Status(t) => {
                kanban.set_status(BOARD, pick(&live, *t), Status::Doing).unwrap();
            }
        }
        let broken = kanban.check(BOARD).unwrap();
        prop_assert!(broken.is_empty(), "after {:?}: {:?}", op, broken);
    }
    Ok(live)
}

fn reaches(kanban: &Kanban, from: TaskId, target: TaskId) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        for next in kanban.get(BOARD, id).unwrap().dependencies.iter() {
            if next == target {
                return true;
            }
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn mirror_survives_any_sequence(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let dir = tempfile::tempdir().unwrap();
        let kanban = open(&dir, CyclePolicy::Allow);
        let live = apply(&kanban, &ops)?;

        prop_assert!(kanban.check(BOARD).unwrap().is_empty());
        for id in live {
            let task = kanban.get(BOARD, id).unwrap();
            for dep in task.dependencies.iter() {
                prop_assert!(kanban.get(BOARD, dep).is_ok());
            }
        }
    }

    #[test]
    fn reject_policy_keeps_graph_acyclic(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let dir = tempfile::tempdir().unwrap();
        let kanban = open(&dir, CyclePolicy::Reject);
        let live = apply(&kanban, &ops)?;

        prop_assert!(kanban.check(BOARD).unwrap().is_empty());
        for &id in &live {
            prop_assert!(!reaches(&kanban, id, id));
        }
    }
}
