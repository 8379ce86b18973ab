use std::collections::HashMap;

use crate::foundation::ids::{InputIdx, InputKey, InputNumber};
use crate::snapshot::model::{Input, Snapshot};

/// Lookup maps over one [`Snapshot`], built once and shared by every resolution against it.
///
/// Duplicate keys or numbers do not fail the build: the later input in declaration order wins
/// and the collision is recorded so callers can tell the index is degraded.
#[derive(Clone, Debug)]
pub struct SnapshotIndex<'s> {
    snapshot: &'s Snapshot,
    by_key: HashMap<&'s str, InputIdx>,
    by_number: HashMap<&'s str, InputIdx>,
    duplicate_keys: Vec<&'s InputKey>,
    duplicate_numbers: Vec<&'s InputNumber>,
}

impl<'s> SnapshotIndex<'s> {
    /// Index every input of `snapshot`.
    pub fn build(snapshot: &'s Snapshot) -> Self {
        let n = snapshot.inputs.len();
        let mut by_key = HashMap::with_capacity(n);
        let mut by_number = HashMap::with_capacity(n);
        let mut duplicate_keys = Vec::new();
        let mut duplicate_numbers = Vec::new();

        for (i, input) in snapshot.inputs.iter().enumerate() {
            let Some(idx) = InputIdx::from_position(i) else {
                tracing::warn!(inputs = n, "snapshot too large to index, truncating");
                break;
            };
            if by_key.insert(input.key.as_str(), idx).is_some() {
                duplicate_keys.push(&input.key);
            }
            if by_number.insert(input.number.as_str(), idx).is_some() {
                duplicate_numbers.push(&input.number);
            }
        }

        if !duplicate_keys.is_empty() || !duplicate_numbers.is_empty() {
            tracing::debug!(
                duplicate_keys = duplicate_keys.len(),
                duplicate_numbers = duplicate_numbers.len(),
                "snapshot index degraded, later inputs win"
            );
        }

        Self {
            snapshot,
            by_key,
            by_number,
            duplicate_keys,
            duplicate_numbers,
        }
    }

    /// Snapshot this index points into.
    pub fn snapshot(&self) -> &'s Snapshot {
        self.snapshot
    }

    /// Resolve an overlay key.
    pub fn idx_by_key(&self, key: &InputKey) -> Option<InputIdx> {
        self.by_key.get(key.as_str()).copied()
    }

    /// Resolve an input number.
    pub fn idx_by_number(&self, number: &InputNumber) -> Option<InputIdx> {
        self.by_number.get(number.as_str()).copied()
    }

    /// Input with the given overlay key.
    pub fn by_key(&self, key: &InputKey) -> Option<&'s Input> {
        self.idx_by_key(key).and_then(|idx| self.snapshot.input(idx))
    }

    /// Input with the given number.
    pub fn by_number(&self, number: &InputNumber) -> Option<&'s Input> {
        self.idx_by_number(number)
            .and_then(|idx| self.snapshot.input(idx))
    }

    /// Position of the input with the given title.
    ///
    /// Titles are not indexed; with duplicates the last declaration wins,
    /// matching the policy for keys and numbers.
    pub fn idx_by_title(&self, title: &str) -> Option<InputIdx> {
        let pos = self.snapshot.inputs.iter().rposition(|i| i.title == title)?;
        InputIdx::from_position(pos)
    }

    /// Input with the given title, last declaration winning.
    pub fn by_title(&self, title: &str) -> Option<&'s Input> {
        self.idx_by_title(title)
            .and_then(|idx| self.snapshot.input(idx))
    }

    /// Input at a position.
    pub fn input(&self, idx: InputIdx) -> Option<&'s Input> {
        self.snapshot.input(idx)
    }

    /// Number of indexed inputs.
    pub fn len(&self) -> usize {
        self.snapshot.inputs.len()
    }

    /// `true` for an empty snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshot.inputs.is_empty()
    }

    /// `true` when keys or numbers collided while building.
    pub fn is_degraded(&self) -> bool {
        !self.duplicate_keys.is_empty() || !self.duplicate_numbers.is_empty()
    }

    /// Keys that appeared more than once, one entry per shadowed occurrence.
    pub fn duplicate_keys(&self) -> &[&'s InputKey] {
        &self.duplicate_keys
    }

    /// Numbers that appeared more than once, one entry per shadowed occurrence.
    pub fn duplicate_numbers(&self) -> &[&'s InputNumber] {
        &self.duplicate_numbers
    }
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/index.rs"]
mod tests;
