use std::collections::BTreeMap;

use serde::Serialize;

use crate::foundation::ids::{InputIdx, InputKey, InputNumber};

/// What an input is, as far as visibility and the dashboard care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Camera, capture, still image or single clip.
    Video,
    /// Playlist of clips with a playback position.
    VideoList,
    /// Output bus that shows one selected input.
    Mix,
    /// Audio-only source.
    Audio,
    /// Titler / graphics template with named text fields.
    Titler,
    /// Empty slot.
    Placeholder,
    /// Solid colour generator.
    Colour,
    /// Anything the engine reports that is not modelled explicitly.
    Other,
}

impl InputKind {
    /// Map the engine's `type` attribute onto a kind. Unknown strings become [`InputKind::Other`].
    pub fn from_engine_type(s: &str) -> Self {
        match s.trim() {
            "Video" | "VideoCall" | "Capture" | "Image" => Self::Video,
            "VideoList" => Self::VideoList,
            "Mix" => Self::Mix,
            "Audio" | "AudioFile" => Self::Audio,
            "GT" | "Xaml" | "Title" => Self::Titler,
            "Placeholder" | "Blank" => Self::Placeholder,
            "Colour" | "Color" => Self::Colour,
            _ => Self::Other,
        }
    }

    /// `false` for kinds that never occupy a visual surface.
    pub fn is_visual(self) -> bool {
        !matches!(self, Self::Placeholder | Self::Audio)
    }

    /// `true` for output buses.
    pub fn is_bus(self) -> bool {
        matches!(self, Self::Mix)
    }
}

/// Bounded region of an overlay, in normalized frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Layer attached to an input that projects another input on top of it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlay {
    /// Key of the projected input.
    pub key: InputKey,
    /// Picture-in-picture region; `None` is a full-frame takeover.
    pub placement: Option<Placement>,
}

impl Overlay {
    /// Full-frame overlay (no placement).
    pub fn full_frame(key: impl Into<InputKey>) -> Self {
        Self {
            key: key.into(),
            placement: None,
        }
    }

    /// Bounded picture-in-picture overlay.
    pub fn bounded(key: impl Into<InputKey>, placement: Placement) -> Self {
        Self {
            key: key.into(),
            placement: Some(placement),
        }
    }

    /// Return `true` when this overlay covers the whole frame.
    pub fn is_full_frame(&self) -> bool {
        self.placement.is_none()
    }
}

/// Playback state of a clip or playlist input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Playing.
    Running,
    /// Paused mid-clip.
    Paused,
    /// Reached the end.
    Completed,
    /// Reported but not recognized.
    Unknown,
}

impl PlaybackState {
    pub(crate) fn from_engine_state(s: &str) -> Self {
        match s.trim() {
            "Running" => Self::Running,
            "Paused" => Self::Paused,
            "Completed" => Self::Completed,
            _ => Self::Unknown,
        }
    }
}

/// Named text field of a titler input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextField {
    /// Field name, e.g. `Headline.Text`.
    pub name: String,
    /// Current text.
    pub value: String,
}

/// Kind-specific attributes the resolver never looks at.
///
/// Missing values are already defaulted (zero, empty, `false`) by the time a snapshot exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InputAttributes {
    /// Playback state, when the engine reports one.
    pub state: Option<PlaybackState>,
    /// Playback position in milliseconds.
    pub position_ms: u64,
    /// Clip duration in milliseconds.
    pub duration_ms: u64,
    /// Audio mute flag.
    pub muted: bool,
    /// Audio volume, 0..100 on the engine's scale.
    pub volume: f64,
    /// Audio bus letters this input feeds, e.g. `"MA"`.
    pub audio_buses: String,
    /// Titler text fields.
    pub text: Vec<TextField>,
    /// Every other attribute, passed through untouched.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl InputAttributes {
    /// Return `true` when the input feeds audio bus `bus`.
    pub fn on_audio_bus(&self, bus: char) -> bool {
        self.audio_buses.contains(bus)
    }

    /// First titler text field value, if any.
    pub fn primary_text(&self) -> Option<&str> {
        self.text.first().map(|t| t.value.as_str())
    }

    /// Value of the titler text field called `name`.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }
}

/// One source or layer in the mixing engine. Buses are inputs of kind [`InputKind::Mix`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Input {
    pub(crate) number: InputNumber,
    pub(crate) key: InputKey,
    pub(crate) title: String,
    pub(crate) kind: InputKind,
    pub(crate) overlays: Vec<Overlay>,
    pub(crate) active: Option<InputNumber>,
    pub(crate) attributes: InputAttributes,
}

impl Input {
    /// Create an input with no overlays, no active target and default attributes.
    pub fn new(
        number: impl Into<InputNumber>,
        key: impl Into<InputKey>,
        title: impl Into<String>,
        kind: InputKind,
    ) -> Self {
        Self {
            number: number.into(),
            key: key.into(),
            title: title.into(),
            kind,
            overlays: Vec::new(),
            active: None,
            attributes: InputAttributes::default(),
        }
    }

    /// Append an overlay on top of the existing stack.
    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlays.push(overlay);
        self
    }

    /// Set the bus selection. Ignored by resolution unless the input is a bus.
    pub fn with_active(mut self, number: impl Into<InputNumber>) -> Self {
        self.active = Some(number.into());
        self
    }

    /// Replace the attribute bag.
    pub fn with_attributes(mut self, attributes: InputAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Positional identifier.
    pub fn number(&self) -> &InputNumber {
        &self.number
    }

    /// Overlay-reference identifier.
    pub fn key(&self) -> &InputKey {
        &self.key
    }

    /// Display name.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Input kind.
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Overlay stack, index 0 is the bottom-most layer.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Number currently selected by this bus, if it is a bus and the engine reported one.
    pub fn active_target(&self) -> Option<&InputNumber> {
        if self.kind.is_bus() {
            self.active.as_ref()
        } else {
            None
        }
    }

    /// Kind-specific attributes.
    pub fn attributes(&self) -> &InputAttributes {
        &self.attributes
    }
}

/// One immutable read of the engine's full state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub(crate) inputs: Vec<Input>,
    pub(crate) program: Option<InputNumber>,
    pub(crate) recording: bool,
    pub(crate) streaming: BTreeMap<String, String>,
    pub(crate) master_audio: BTreeMap<String, String>,
}

impl Snapshot {
    /// Build a snapshot from inputs in declaration order.
    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// Set the number of the input currently on program output.
    pub fn with_program(mut self, number: impl Into<InputNumber>) -> Self {
        self.program = Some(number.into());
        self
    }

    /// Set the recording flag.
    pub fn with_recording(mut self, recording: bool) -> Self {
        self.recording = recording;
        self
    }

    /// Inputs in declaration order.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Look up an input by its position.
    pub fn input(&self, idx: InputIdx) -> Option<&Input> {
        self.inputs.get(idx.get())
    }

    /// Number of the input on program output.
    pub fn program(&self) -> Option<&InputNumber> {
        self.program.as_ref()
    }

    /// Recording flag.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Raw streaming attributes, one entry per channel.
    pub fn streaming(&self) -> &BTreeMap<String, String> {
        &self.streaming
    }

    /// `true` when any streaming channel reports `True`.
    pub fn is_streaming(&self) -> bool {
        self.streaming
            .values()
            .any(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Master-audio attribute bag.
    pub fn master_audio(&self) -> &BTreeMap<String, String> {
        &self.master_audio
    }
}
