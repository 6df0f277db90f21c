//! Post-render progress repair.
//!
//! A progress value is shown twice: as a number and as a rendered fill
//! width. When the two disagree the declared number wins and the rendered
//! side is rewritten. Repair is re-entrant: a second pass changes nothing.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A declared progress value and the percentage actually rendered for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPair {
    /// Identifies the element, used in log output
    #[serde(default)]
    pub label: String,
    pub declared: u8,
    pub rendered: u8,
}

impl ProgressPair {
    pub fn new(label: impl Into<String>, declared: u8, rendered: u8) -> Self {
        Self {
            label: label.into(),
            declared,
            rendered,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.declared == self.rendered
    }
}

/// Outcome of a repair pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub checked: usize,
    pub repaired: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.repaired == 0
    }
}

/// Rewrite every divergent pair to its declared value
pub fn repair_progress<'a, I>(pairs: I) -> RepairReport
where
    I: IntoIterator<Item = &'a mut ProgressPair>,
{
    let mut report = RepairReport::default();
    for pair in pairs {
        report.checked += 1;
        if pair.is_consistent() {
            continue;
        }
        warn!(
            element = %pair.label,
            declared = pair.declared,
            rendered = pair.rendered,
            "progress display out of sync, repairing"
        );
        pair.rendered = pair.declared;
        report.repaired += 1;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn divergent_pair_takes_declared_value() {
        let mut pairs = vec![ProgressPair::new("task1", 42, 37)];
        let report = repair_progress(&mut pairs);
        assert_eq!(pairs[0], ProgressPair::new("task1", 42, 42));
        assert_eq!(report, RepairReport { checked: 1, repaired: 1 });
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut pairs = vec![
            ProgressPair::new("a", 42, 37),
            ProgressPair::new("b", 0, 100),
            ProgressPair::new("c", 60, 60),
        ];
        let first = repair_progress(&mut pairs);
        assert_eq!(first.repaired, 2);

        let snapshot = pairs.clone();
        let second = repair_progress(&mut pairs);
        assert!(second.is_clean());
        assert_eq!(second.checked, 3);
        assert_eq!(pairs, snapshot);
    }

    #[test]
    fn empty_input() {
        let report = repair_progress(std::iter::empty::<&mut ProgressPair>());
        assert_eq!(report, RepairReport::default());
    }
}
