//! Visible-set resolution over one snapshot.
//!
//! The walk follows bus selections and overlay stacks with an explicit frame stack. Every input is
//! entered at most once per call, so the work is bounded by the number of inputs plus the number
//! of overlay references, whatever cycles or dangling references the engine reports.

use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::ids::{InputIdx, InputNumber};
use crate::snapshot::index::SnapshotIndex;
use crate::snapshot::model::Input;

/// Inputs that contribute pixels to one composition root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSet<'s> {
    members: BTreeMap<InputIdx, &'s Input>,
}

impl<'s> VisibleSet<'s> {
    /// Number of contributing inputs.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// `true` when nothing contributes.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `true` when the input at `idx` contributes.
    pub fn contains(&self, idx: InputIdx) -> bool {
        self.members.contains_key(&idx)
    }

    /// `true` when an input with this number contributes.
    pub fn contains_number(&self, number: &InputNumber) -> bool {
        self.members.values().any(|i| i.number() == number)
    }

    /// Contributing inputs in snapshot declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'s Input> + '_ {
        self.members.values().copied()
    }

    /// Snapshot positions of the contributing inputs, ascending.
    pub fn indices(&self) -> impl Iterator<Item = InputIdx> + '_ {
        self.members.keys().copied()
    }

    /// Distinct titles of the contributing inputs.
    pub fn titles(&self) -> BTreeSet<&'s str> {
        self.members.values().map(|i| i.title()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Unseen,
    InProgress,
    Done { contributed: bool },
}

#[derive(Debug)]
struct Frame {
    current: InputIdx,
    /// Overlays of `current` not yet visited; the next one is at `remaining - 1`.
    remaining: usize,
    /// Inputs entered by this frame's bus chase, with the hit count when each was entered.
    chain: Vec<(InputIdx, usize)>,
    /// The child frame on top of this one came from a full-frame overlay.
    awaiting_full_frame: bool,
}

impl Frame {
    fn enter(idx: InputIdx, input: &Input, hits: usize) -> Self {
        Self {
            current: idx,
            remaining: input.overlays().len(),
            chain: vec![(idx, hits)],
            awaiting_full_frame: false,
        }
    }

    fn hits_at_start(&self) -> usize {
        self.chain.first().map_or(0, |&(_, at)| at)
    }
}

/// Resolve the inputs visible from the bus or input numbered `start`.
///
/// Bus selections are chased until a non-bus input is reached; each bus's own overlays count on
/// the way. Overlay stacks are walked top to bottom and a full-frame overlay that resolves to
/// something stops the walk of the layers beneath it. The base input itself always counts unless
/// its kind is non-visual.
///
/// Unknown numbers and keys contribute nothing. An input already resolved earlier in the same
/// call is not descended again; it still counts as non-empty for occlusion if it contributed.
#[tracing::instrument(level = "debug", skip(index, start), fields(start = %start))]
pub fn resolve_visible<'s>(index: &SnapshotIndex<'s>, start: &InputNumber) -> VisibleSet<'s> {
    let Some(root) = index.idx_by_number(start) else {
        tracing::trace!("start number does not resolve");
        return VisibleSet::default();
    };
    resolve_visible_at(index, root)
}

/// Same as [`resolve_visible`], starting from a snapshot position instead of a number.
pub fn resolve_visible_at<'s>(index: &SnapshotIndex<'s>, root: InputIdx) -> VisibleSet<'s> {
    let mut out = VisibleSet::default();
    let Some(root_input) = index.input(root) else {
        return out;
    };

    let mut marks = vec![Mark::Unseen; index.len()];
    let mut hits = 0usize;
    let mut stack = vec![Frame::enter(root, root_input, hits)];
    marks[root.get()] = Mark::InProgress;

    while let Some(frame) = stack.last_mut() {
        let Some(input) = index.input(frame.current) else {
            frame.remaining = 0;
            finish_frame(&mut stack, &mut marks, hits);
            continue;
        };

        if frame.remaining > 0 {
            frame.remaining -= 1;
            let overlay = &input.overlays()[frame.remaining];
            let Some(target) = index.idx_by_key(&overlay.key) else {
                tracing::trace!(key = %overlay.key, "dangling overlay reference");
                continue;
            };
            let mark = marks[target.get()];
            match mark {
                Mark::Unseen => {
                    let Some(target_input) = index.input(target) else {
                        continue;
                    };
                    frame.awaiting_full_frame = overlay.is_full_frame();
                    marks[target.get()] = Mark::InProgress;
                    stack.push(Frame::enter(target, target_input, hits));
                }
                Mark::InProgress => {
                    tracing::trace!(key = %overlay.key, "overlay cycle");
                }
                Mark::Done { contributed } => {
                    if contributed {
                        hits += 1;
                        if overlay.is_full_frame() {
                            frame.remaining = 0;
                        }
                    }
                }
            }
            continue;
        }

        if input.kind().is_bus() {
            let next = input
                .active_target()
                .and_then(|n| index.idx_by_number(n));
            match next.map(|idx| (idx, marks[idx.get()])) {
                Some((idx, Mark::Unseen)) => {
                    if let Some(next_input) = index.input(idx) {
                        marks[idx.get()] = Mark::InProgress;
                        frame.chain.push((idx, hits));
                        frame.current = idx;
                        frame.remaining = next_input.overlays().len();
                        continue;
                    }
                }
                Some((_, Mark::Done { contributed: true })) => hits += 1,
                Some((_, Mark::Done { contributed: false })) => {}
                Some((_, Mark::InProgress)) => tracing::trace!("bus selection cycle"),
                None => tracing::trace!("bus selection does not resolve"),
            }
        } else if input.kind().is_visual() {
            out.members.insert(frame.current, input);
            hits += 1;
        }

        finish_frame(&mut stack, &mut marks, hits);
    }

    out
}

/// Pop the top frame, settle the marks of every input it entered and report to the parent.
fn finish_frame(stack: &mut Vec<Frame>, marks: &mut [Mark], hits: usize) {
    let Some(frame) = stack.pop() else {
        return;
    };
    for &(idx, at) in &frame.chain {
        marks[idx.get()] = Mark::Done {
            contributed: hits > at,
        };
    }

    if let Some(parent) = stack.last_mut() {
        if parent.awaiting_full_frame && hits > frame.hits_at_start() {
            parent.remaining = 0;
        }
        parent.awaiting_full_frame = false;
    }
}

/// Resolve the inputs visible on program output. Empty when the snapshot names no program input.
pub fn resolve_program<'s>(index: &SnapshotIndex<'s>) -> VisibleSet<'s> {
    match index.snapshot().program() {
        Some(number) => resolve_visible(index, number),
        None => VisibleSet::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/visibility.rs"]
mod tests;
