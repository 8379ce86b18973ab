//! Wire document for one engine state read.
//!
//! Every field is optional on the wire. Malformed scalar values fall back to their defaults so a
//! noisy feed degrades a single attribute instead of the whole snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::foundation::error::{MixviewError, MixviewResult};
use crate::foundation::ids::{InputKey, InputNumber};
use crate::snapshot::model::{
    Input, InputAttributes, InputKind, Overlay, Placement, PlaybackState, Snapshot, TextField,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SnapshotDoc {
    #[serde(default)]
    pub(crate) active: Option<InputNumber>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub(crate) inputs: Vec<InputDoc>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub(crate) mixes: Vec<MixDoc>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) recording: bool,
    #[serde(default, deserialize_with = "string_bag")]
    pub(crate) streaming: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_record")]
    pub(crate) audio: AudioDoc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AudioDoc {
    #[serde(default, deserialize_with = "string_bag")]
    pub(crate) master: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MixDoc {
    /// Explicit bus input number. Records without one bind to Mix inputs in order.
    #[serde(default)]
    pub(crate) input: Option<InputNumber>,
    #[serde(default)]
    pub(crate) active: Option<InputNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InputDoc {
    #[serde(default)]
    pub(crate) number: InputNumber,
    #[serde(default)]
    pub(crate) key: InputKey,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) title: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub(crate) kind: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub(crate) overlays: Vec<OverlayDoc>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) state: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub(crate) position: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub(crate) duration: u64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub(crate) muted: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) volume: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) audiobusses: String,
    #[serde(default, deserialize_with = "text_fields")]
    pub(crate) text: Vec<TextField>,
    #[serde(flatten)]
    pub(crate) extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OverlayDoc {
    #[serde(default)]
    pub(crate) key: InputKey,
    #[serde(default, deserialize_with = "lenient_placement")]
    pub(crate) placement: Option<PlacementDoc>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct PlacementDoc {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) x: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) y: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub(crate) width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub(crate) height: Option<f64>,
}

impl Snapshot {
    /// Parse a snapshot from a JSON document.
    pub fn from_json_str(s: &str) -> MixviewResult<Self> {
        let doc: SnapshotDoc = serde_json::from_str(s)?;
        Ok(Self::from_doc(doc))
    }

    /// Read and parse a snapshot JSON file.
    pub fn from_path(path: &Path) -> MixviewResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read snapshot '{}'", path.display()))?;
        Self::from_json_str(&s).map_err(|e| match e {
            MixviewError::Serde(msg) => {
                MixviewError::snapshot(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    pub(crate) fn from_doc(doc: SnapshotDoc) -> Self {
        let mut inputs: Vec<Input> = doc.inputs.into_iter().map(input_from_doc).collect();
        bind_mix_targets(&mut inputs, doc.mixes);

        Self {
            inputs,
            program: doc.active.filter(|n| !n.is_empty()),
            recording: doc.recording,
            streaming: doc.streaming,
            master_audio: doc.audio.master,
        }
    }
}

fn input_from_doc(doc: InputDoc) -> Input {
    let kind = InputKind::from_engine_type(&doc.kind);
    let state = (!doc.state.trim().is_empty()).then(|| PlaybackState::from_engine_state(&doc.state));

    let overlays = doc
        .overlays
        .into_iter()
        .filter(|o| !o.key.as_str().is_empty())
        .map(|o| Overlay {
            key: o.key,
            placement: o.placement.map(|p| Placement {
                x: p.x,
                y: p.y,
                width: p.width.unwrap_or(1.0),
                height: p.height.unwrap_or(1.0),
            }),
        })
        .collect();

    Input {
        number: doc.number,
        key: doc.key,
        title: doc.title,
        kind,
        overlays,
        active: None,
        attributes: InputAttributes {
            state,
            position_ms: doc.position,
            duration_ms: doc.duration,
            muted: doc.muted,
            volume: doc.volume,
            audio_buses: doc.audiobusses,
            text: doc.text,
            extra: doc.extra,
        },
    }
}

/// Attach mix records to bus inputs.
///
/// Records naming an input bind to it directly; the rest bind to the remaining Mix inputs in
/// declaration order. Surplus records are dropped and surplus buses keep no target.
fn bind_mix_targets(inputs: &mut [Input], mixes: Vec<MixDoc>) {
    let mut bound = vec![false; inputs.len()];
    let mut ordered = Vec::new();
    for mix in mixes {
        let Some(number) = mix.input else {
            ordered.push(mix.active);
            continue;
        };
        if let Some(pos) = inputs
            .iter()
            .rposition(|i| i.kind.is_bus() && i.number == number)
        {
            inputs[pos].active = mix.active;
            bound[pos] = true;
        }
    }

    let mut ordered = ordered.into_iter();
    for (input, _) in inputs
        .iter_mut()
        .zip(bound)
        .filter(|(i, bound)| i.kind.is_bus() && !bound)
    {
        let Some(active) = ordered.next() else {
            break;
        };
        input.active = active;
    }
}

fn value_as_bool(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

fn value_as_f64(v: &serde_json::Value) -> Option<f64> {
    let f = match v {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn value_as_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn lenient_bool<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.as_ref().is_some_and(value_as_bool))
}

fn lenient_f64<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_f64(d)?.unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_f64))
}

fn lenient_u64<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let f = lenient_f64(d)?;
    Ok(if f > 0.0 { f as u64 } else { 0 })
}

fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.as_ref().map(value_as_string).unwrap_or_default())
}

/// A list whose unreadable elements are skipped. Anything but an array reads as empty.
fn lenient_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    let Some(serde_json::Value::Array(items)) = v else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_record<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(v.and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default())
}

/// Any non-null placement marks the overlay as bounded; unreadable ones take the default
/// rectangle.
fn lenient_placement<'de, D>(d: D) -> Result<Option<PlacementDoc>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(serde_json::from_value(v).unwrap_or_default()),
    })
}

fn string_bag<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    let Some(serde_json::Value::Object(map)) = v else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .iter()
        .map(|(k, v)| (k.clone(), value_as_string(v)))
        .collect())
}

/// Titler fields arrive either as `{"name": "value"}` (ordered by name) or as
/// `[{"name", "value"}]` (declaration order kept).
fn text_fields<'de, D>(d: D) -> Result<Vec<TextField>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    let fields = match v {
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(name, value)| TextField {
                name: name.clone(),
                value: value_as_string(value),
            })
            .collect(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let obj = item.as_object()?;
                Some(TextField {
                    name: obj.get("name").map(value_as_string).unwrap_or_default(),
                    value: obj.get("value").map(value_as_string).unwrap_or_default(),
                })
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(fields)
}

#[cfg(test)]
#[path = "../../tests/unit/snapshot/document.rs"]
mod tests;
