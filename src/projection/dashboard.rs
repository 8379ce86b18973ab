use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::foundation::ids::InputNumber;
use crate::projection::config::{ProjectionConfig, SchedulePhase, TrackedSource};
use crate::resolve::visibility::{VisibleSet, resolve_program, resolve_visible, resolve_visible_at};
use crate::snapshot::index::SnapshotIndex;
use crate::snapshot::model::{Input, InputKind, PlaybackState};

/// Playback line of a playlist input on program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaybackView {
    /// Playback state.
    pub state: PlaybackState,
    /// Position as `H:MM:SS`.
    pub position: String,
    /// Duration as `H:MM:SS`.
    pub duration: String,
}

/// What the program input itself shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgramView {
    /// Number of the input on program.
    pub number: InputNumber,
    /// Its title.
    pub title: String,
    /// Its kind.
    pub kind: InputKind,
    /// Playback line for playlists.
    pub playback: Option<PlaybackView>,
    /// Text of the topmost overlay when that overlay is a titler.
    pub overlay_text: Option<String>,
}

/// A failed title-set expectation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckWarning {
    /// Check label.
    pub check: String,
    /// Tracked target the check looked at.
    pub target: String,
    /// Titles that were visible instead.
    pub visible: BTreeSet<String>,
}

/// Everything one tick contributes to the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dashboard {
    /// Program input details; `None` when the program selector does not resolve.
    pub program: Option<ProgramView>,
    /// Visible titles per tracked target.
    pub tracked: BTreeMap<String, BTreeSet<String>>,
    /// Captions titler has text.
    pub captions: bool,
    /// Title of the topmost overlay per configured input title; `None` when
    /// the input is missing, has no overlays, or its top overlay dangles.
    pub topmost_overlays: BTreeMap<String, Option<String>>,
    /// Titles of inputs audible on the master bus.
    pub audio_master: Vec<String>,
    /// Recording flag.
    pub recording: bool,
    /// Any streaming channel active.
    pub streaming: bool,
    /// Master-audio attributes, copied through.
    pub master_audio: BTreeMap<String, String>,
    /// Checks that failed in the current phase.
    pub warnings: Vec<CheckWarning>,
    /// The snapshot had colliding keys or numbers.
    pub degraded: bool,
}

/// Map one indexed snapshot onto dashboard fields.
#[tracing::instrument(level = "debug", skip(index, config))]
pub fn project(
    index: &SnapshotIndex<'_>,
    config: &ProjectionConfig,
    phase: SchedulePhase,
) -> Dashboard {
    let snapshot = index.snapshot();

    let tracked: BTreeMap<String, BTreeSet<String>> = config
        .tracked
        .iter()
        .map(|t| (t.name.clone(), owned_titles(&resolve_tracked(index, &t.source))))
        .collect();

    let warnings = config
        .checks
        .iter()
        .filter(|c| c.phase.matches(phase))
        .filter_map(|c| {
            let visible = tracked.get(&c.target).cloned().unwrap_or_default();
            if visible.iter().any(|t| c.required.contains(t)) {
                return None;
            }
            Some(CheckWarning {
                check: c.name.clone(),
                target: c.target.clone(),
                visible,
            })
        })
        .collect();

    let captions = config
        .captions_title
        .as_deref()
        .and_then(|title| index.by_title(title))
        .and_then(|i| i.attributes().text_field(&config.captions_field))
        .is_some_and(|text| !text.is_empty());

    let topmost_overlays = config
        .topmost_overlay_of
        .iter()
        .map(|title| {
            let top = index
                .by_title(title)
                .and_then(|i| topmost_overlay(index, i))
                .map(|o| o.title().to_owned());
            (title.clone(), top)
        })
        .collect();

    let audio_master = snapshot
        .inputs()
        .iter()
        .filter(|i| {
            let a = i.attributes();
            a.on_audio_bus(config.master_bus) && !a.muted && a.volume > 0.0
        })
        .map(|i| i.title().to_owned())
        .collect();

    Dashboard {
        program: snapshot
            .program()
            .and_then(|n| index.by_number(n))
            .map(|input| program_view(index, input)),
        tracked,
        captions,
        topmost_overlays,
        audio_master,
        recording: snapshot.is_recording(),
        streaming: snapshot.is_streaming(),
        master_audio: snapshot.master_audio().clone(),
        warnings,
        degraded: index.is_degraded(),
    }
}

fn resolve_tracked<'s>(index: &SnapshotIndex<'s>, source: &TrackedSource) -> VisibleSet<'s> {
    match source {
        TrackedSource::Program => resolve_program(index),
        TrackedSource::Number(n) => resolve_visible(index, n),
        TrackedSource::Title(title) => match index.idx_by_title(title) {
            Some(idx) => resolve_visible_at(index, idx),
            None => VisibleSet::default(),
        },
    }
}

fn owned_titles(set: &VisibleSet<'_>) -> BTreeSet<String> {
    set.titles().into_iter().map(str::to_owned).collect()
}

fn program_view(index: &SnapshotIndex<'_>, input: &Input) -> ProgramView {
    let playback = (input.kind() == InputKind::VideoList).then(|| {
        let a = input.attributes();
        PlaybackView {
            state: a.state.unwrap_or(PlaybackState::Unknown),
            position: format_hms(a.position_ms),
            duration: format_hms(a.duration_ms),
        }
    });

    let overlay_text = topmost_overlay(index, input)
        .filter(|o| o.kind() == InputKind::Titler)
        .and_then(|o| o.attributes().primary_text())
        .map(str::to_owned);

    ProgramView {
        number: input.number().clone(),
        title: input.title().to_owned(),
        kind: input.kind(),
        playback,
        overlay_text,
    }
}

/// Input referenced by the last overlay of `input`, if it resolves.
fn topmost_overlay<'s>(index: &SnapshotIndex<'s>, input: &Input) -> Option<&'s Input> {
    input.overlays().last().and_then(|o| index.by_key(&o.key))
}

/// Milliseconds rounded to whole seconds, as `H:MM:SS`.
pub(crate) fn format_hms(ms: u64) -> String {
    let secs = ms / 1000 + u64::from(ms % 1000 >= 500);
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/projection/dashboard.rs"]
mod tests;
