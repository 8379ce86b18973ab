use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{MixviewError, MixviewResult};
use crate::foundation::ids::InputNumber;

/// Externally supplied schedule phase the checks are keyed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePhase {
    /// A session is running.
    #[default]
    Session,
    /// Between sessions.
    Break,
}

/// Phases a check applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFilter {
    /// Only while a session is running.
    Session,
    /// Only during breaks.
    Break,
    /// Always.
    #[default]
    Any,
}

impl PhaseFilter {
    /// Return `true` when a check with this filter runs in `phase`.
    pub fn matches(self, phase: SchedulePhase) -> bool {
        match self {
            Self::Any => true,
            Self::Session => phase == SchedulePhase::Session,
            Self::Break => phase == SchedulePhase::Break,
        }
    }
}

/// Where a tracked composition is rooted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedSource {
    /// Whatever is on program output.
    Program,
    /// The input with this title; the last one when titles repeat.
    Title(String),
    /// The input with this number.
    Number(InputNumber),
}

/// A named composition whose visible titles the dashboard shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTarget {
    /// Dashboard label.
    pub name: String,
    /// Composition root.
    pub source: TrackedSource,
}

/// Expect at least one of `required` to be visible on `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Warning label, e.g. `wrong camera on air`.
    pub name: String,
    /// Name of a [`TrackedTarget`].
    pub target: String,
    /// Phases the check runs in.
    #[serde(default)]
    pub phase: PhaseFilter,
    /// Titles of which at least one must be visible.
    pub required: BTreeSet<String>,
}

/// Dashboard configuration for one room or stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Compositions to resolve every tick.
    #[serde(default = "default_tracked")]
    pub tracked: Vec<TrackedTarget>,
    /// Title of the titler whose text marks captions as on.
    #[serde(default)]
    pub captions_title: Option<String>,
    /// Text field of the captions titler that must be non-empty.
    #[serde(default = "default_captions_field")]
    pub captions_field: String,
    /// Inputs whose topmost overlay title the dashboard reports.
    #[serde(default)]
    pub topmost_overlay_of: Vec<String>,
    /// Audio bus letter treated as master.
    #[serde(default = "default_master_bus")]
    pub master_bus: char,
    /// Title-set expectations.
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

fn default_tracked() -> Vec<TrackedTarget> {
    vec![TrackedTarget {
        name: "program".to_owned(),
        source: TrackedSource::Program,
    }]
}

fn default_captions_field() -> String {
    "Text.Text".to_owned()
}

fn default_master_bus() -> char {
    'M'
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tracked: default_tracked(),
            captions_title: None,
            captions_field: default_captions_field(),
            topmost_overlay_of: Vec::new(),
            master_bus: default_master_bus(),
            checks: Vec::new(),
        }
    }
}

impl ProjectionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> MixviewResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> MixviewResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read projection config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Reject configurations the projection could not apply consistently.
    pub fn validate(&self) -> MixviewResult<()> {
        if !self.master_bus.is_ascii_alphabetic() {
            return Err(MixviewError::config(format!(
                "master_bus must be an ASCII letter, got '{}'",
                self.master_bus
            )));
        }

        if self.captions_title.is_some() && self.captions_field.trim().is_empty() {
            return Err(MixviewError::config("captions_field must be non-empty"));
        }
        if self.topmost_overlay_of.iter().any(|t| t.is_empty()) {
            return Err(MixviewError::config("topmost_overlay_of titles must be non-empty"));
        }

        let mut names = HashSet::new();
        for t in &self.tracked {
            if t.name.trim().is_empty() {
                return Err(MixviewError::config("tracked target name must be non-empty"));
            }
            if !names.insert(t.name.as_str()) {
                return Err(MixviewError::config(format!(
                    "tracked target '{}' is declared twice",
                    t.name
                )));
            }
            match &t.source {
                TrackedSource::Title(title) if title.is_empty() => {
                    return Err(MixviewError::config(format!(
                        "tracked target '{}' has an empty title",
                        t.name
                    )));
                }
                TrackedSource::Number(n) if n.is_empty() => {
                    return Err(MixviewError::config(format!(
                        "tracked target '{}' has an empty number",
                        t.name
                    )));
                }
                _ => {}
            }
        }

        for c in &self.checks {
            if !names.contains(c.target.as_str()) {
                return Err(MixviewError::config(format!(
                    "check '{}' references unknown target '{}'",
                    c.name, c.target
                )));
            }
            if c.required.is_empty() {
                return Err(MixviewError::config(format!(
                    "check '{}' has no required titles",
                    c.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/config.rs"]
mod tests;
