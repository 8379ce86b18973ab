//! mixview works out which inputs of a live video-mixing engine actually reach an output.
//!
//! One poll of the engine yields a [`Snapshot`]: inputs, the buses that select between them, and
//! the overlay stacks layered on top. The pipeline per snapshot is:
//!
//! 1. **Index**: `Snapshot -> SnapshotIndex` (lookup by key and by number, built once)
//! 2. **Resolve**: `SnapshotIndex + start -> VisibleSet` (bus chasing, overlay occlusion)
//! 3. **Project**: `SnapshotIndex + ProjectionConfig -> Dashboard` (titles, flags, checks)
//!
//! Resolution is pure and never fails: dangling references contribute nothing and cycles stop at
//! the first revisit. [`Poller`] drives the three steps on a fixed cadence and keeps the last
//! good dashboard when a fetch fails.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod poll;
mod projection;
mod resolve;
mod snapshot;

pub use crate::foundation::error::{MixviewError, MixviewResult};
pub use crate::foundation::ids::{InputIdx, InputKey, InputNumber};
pub use crate::poll::poller::{DEFAULT_INTERVAL, PollStats, Poller, PollerOpts, TickOutcome};
pub use crate::poll::source::{FileSource, SnapshotSource};
pub use crate::projection::config::{
    CheckSpec, PhaseFilter, ProjectionConfig, SchedulePhase, TrackedSource, TrackedTarget,
};
pub use crate::projection::dashboard::{
    CheckWarning, Dashboard, PlaybackView, ProgramView, project,
};
pub use crate::resolve::visibility::{
    VisibleSet, resolve_program, resolve_visible, resolve_visible_at,
};
pub use crate::snapshot::index::SnapshotIndex;
pub use crate::snapshot::model::{
    Input, InputAttributes, InputKind, Overlay, Placement, PlaybackState, Snapshot, TextField,
};
