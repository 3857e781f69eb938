//! Capture-ball stock.

use std::collections::BTreeMap;

use wander_types::BallKind;

/// Ball counts by kind. Kinds with no entry have a count of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallInventory {
    counts: BTreeMap<BallKind, u32>,
}

impl BallInventory {
    /// Build from explicit counts.
    pub fn from_counts(counts: impl IntoIterator<Item = (BallKind, u32)>) -> Self {
        let mut inventory = Self::default();
        for (kind, count) in counts {
            inventory.add(kind, count);
        }
        inventory
    }

    /// Add `count` balls of `kind`, saturating at `u32::MAX`.
    pub fn add(&mut self, kind: BallKind, count: u32) {
        let entry = self.counts.entry(kind).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Balls of one kind in stock.
    pub fn count(&self, kind: BallKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Balls of every kind in stock.
    pub fn total(&self) -> u32 {
        self.counts
            .values()
            .fold(0_u32, |acc, count| acc.saturating_add(*count))
    }

    /// Consume one ball of `kind`. Returns `false` if none were left.
    pub fn take(&mut self, kind: BallKind) -> bool {
        match self.counts.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count = count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Kinds with at least one ball, weakest first.
    pub fn in_stock(&self) -> impl Iterator<Item = BallKind> + '_ {
        BallKind::ALL
            .into_iter()
            .filter(move |kind| self.count(*kind) > 0)
    }
}
