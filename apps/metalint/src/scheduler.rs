//! Execution ordering and conflict resolution.

use crate::error::Result;
use crate::registry::{ToolEntry, ToolRegistry};
use tracing::debug;

#[derive(Debug)]
/// A tool dropped from the plan because it conflicts with `winner`.
pub struct Skipped<'r> {
    pub entry: &'r ToolEntry,
    pub winner: String,
}

#[derive(Debug, Default)]
pub struct Schedule<'r> {
    /// Tools to run, highest priority first.
    pub ordered: Vec<&'r ToolEntry>,
    pub skipped: Vec<Skipped<'r>>,
}

impl Schedule<'_> {
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|e| e.name()).collect()
    }
}

fn by_priority(a: &&ToolEntry, b: &&ToolEntry) -> std::cmp::Ordering {
    b.definition
        .priority
        .cmp(&a.definition.priority)
        .then(a.order.cmp(&b.order))
}

/// Resolve, de-duplicate and order the requested tools.
///
/// An empty request selects every registered tool. Unless
/// `ignore_conflicts` is set, of two tools where one lists the other as a
/// conflict only the higher-priority one survives (the earlier-registered
/// one on a tie).
pub fn order<'r>(
    registry: &'r ToolRegistry,
    requested: &[String],
    ignore_conflicts: bool,
) -> Result<Schedule<'r>> {
    let mut selected: Vec<&ToolEntry> = Vec::new();
    if requested.is_empty() {
        selected.extend(registry.all());
    } else {
        for id in requested {
            let entry = registry.get(id)?;
            if !selected.iter().any(|e| e.order == entry.order) {
                selected.push(entry);
            }
        }
    }
    selected.sort_by(by_priority);

    let mut schedule = Schedule::default();
    if ignore_conflicts {
        schedule.ordered = selected;
        return Ok(schedule);
    }

    // Visiting in final order means the higher-ranked tool of any pair is
    // always considered first, and a dropped tool never knocks out another.
    for candidate in selected {
        let winner = schedule.ordered.iter().find(|kept| {
            kept.definition.conflicts_with(candidate.name())
                || candidate.definition.conflicts_with(kept.name())
        });
        match winner {
            Some(kept) => {
                debug!(tool = candidate.name(), winner = kept.name(), "dropped by conflict");
                schedule.skipped.push(Skipped {
                    entry: candidate,
                    winner: kept.name().to_string(),
                });
            }
            None => schedule.ordered.push(candidate),
        }
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::tests::{def, plugin};

    fn registry(tools: &[(&str, i32, &[&str])]) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        for (name, priority, conflicts) in tools {
            let mut d = def(name, *priority);
            d.conflicts_with = conflicts.iter().map(|s| s.to_string()).collect();
            reg.register(d, plugin()).unwrap();
        }
        reg
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn higher_priority_wins_conflict() {
        let reg = registry(&[("a", 10, &[]), ("b", 20, &["a"])]);
        let s = order(&reg, &ids(&["a", "b"]), false).unwrap();
        assert_eq!(s.names(), vec!["b"]);
        assert_eq!(s.skipped.len(), 1);
        assert_eq!(s.skipped[0].entry.name(), "a");
        assert_eq!(s.skipped[0].winner, "b");
    }

    #[test]
    fn conflicts_need_not_be_symmetric() {
        // Declared on the lower-priority side only.
        let reg = registry(&[("a", 10, &["b"]), ("b", 20, &[])]);
        let s = order(&reg, &[], false).unwrap();
        assert_eq!(s.names(), vec!["b"]);
    }

    #[test]
    fn ties_keep_earlier_registered() {
        let reg = registry(&[("first", 5, &[]), ("second", 5, &["first"])]);
        let s = order(&reg, &ids(&["second", "first"]), false).unwrap();
        assert_eq!(s.names(), vec!["first"]);
        assert_eq!(s.skipped[0].entry.name(), "second");
    }

    #[test]
    fn dropped_tools_do_not_knock_out_others() {
        // c beats b, b would beat a; a survives because b is gone.
        let reg = registry(&[("a", 1, &[]), ("b", 2, &["a"]), ("c", 3, &["b"])]);
        let s = order(&reg, &[], false).unwrap();
        assert_eq!(s.names(), vec!["c", "a"]);
    }

    #[test]
    fn ignore_conflicts_keeps_everything_sorted() {
        let reg = registry(&[("a", 10, &[]), ("b", 20, &["a"]), ("c", 10, &[])]);
        let s = order(&reg, &ids(&["c", "a", "b", "A"]), true).unwrap();
        assert_eq!(s.names(), vec!["b", "a", "c"]);
        assert!(s.skipped.is_empty());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let reg = registry(&[("a", 1, &[])]);
        assert!(matches!(
            order(&reg, &ids(&["a", "zzz"]), false),
            Err(Error::UnknownTool(id)) if id == "zzz"
        ));
        assert!(order(&ToolRegistry::new(), &[], false).unwrap().is_empty());
    }
}
