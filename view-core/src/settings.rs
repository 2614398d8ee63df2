//! Configuration store for the visualizer.
//!
//! A `Configuration` is an ordered name → value map mirroring the JSON
//! the rendering module exports. The module itself is the source of
//! truth; the store is a cache of its last reported state, plus the
//! immutable baseline snapshot used as the diff reference for URL
//! encoding.

use std::collections::BTreeMap;

use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// Minimum iteration count accepted for iterated function systems.
pub const MIN_IFS_ITERATIONS: f64 = 2.0;
/// Minimum number of IFS functions.
pub const MIN_IFS_FUNCTIONS: f64 = 2.0;
/// Minimum number of flame variant coefficients.
pub const MIN_FLAME_COEFFICIENTS: f64 = 1.0;

/// A single configuration value.
///
/// Colors are plain 4-element sequences (R, G, B, alpha in [0, 1]); the
/// schema records which keys carry them. Untagged so a `Configuration`
/// round-trips through the module's JSON export unchanged.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    Sequence(Vec<f64>),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[f64]> {
        match self {
            Value::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// Text form used when refreshing UI widgets.
    pub fn display(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) if is_integral(*n) => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
            Value::Text(text) => text.clone(),
            Value::Sequence(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::Sequence(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(&Element(*value))?;
                }
                seq.end()
            }
            Value::Text(text) => serializer.serialize_str(text),
        }
    }
}

struct Element(f64);

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_number(self.0, serializer)
    }
}

// Integral values serialize without a fractional part, matching the JSON
// the module emits and the fragments older links carry.
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if is_integral(n) {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() <= i64::MAX as f64
}

/// Ordered parameter name → value mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, Value>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_number)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_boolean)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn sequence(&self, key: &str) -> Option<&[f64]> {
        self.get(key).and_then(Value::as_sequence)
    }

    /// New configuration with every key of `overrides` replacing this
    /// one's entry wholesale. Decoded fragment keys override the
    /// baseline; everything else keeps its baseline value.
    pub fn merged_with(&self, overrides: &Configuration) -> Configuration {
        let mut merged = self.clone();
        merged.merge_from(overrides);
        merged
    }

    pub fn merge_from(&mut self, overrides: &Configuration) {
        for (key, value) in overrides.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

/// Clamp dependent fields to sane values.
///
/// Runs after every load or edit; applying it twice yields the same
/// configuration as applying it once.
pub fn normalize(config: &mut Configuration) {
    raise_floor(config, "iterations", MIN_IFS_ITERATIONS);
    raise_floor(config, "functions", MIN_IFS_FUNCTIONS);
    raise_floor(config, "flameCoefficients", MIN_FLAME_COEFFICIENTS);

    // The active dimension cannot exceed the render depth.
    if let (Some(dimension), Some(render_depth)) =
        (config.number("dimension"), config.number("renderDepth"))
    {
        if dimension > render_depth {
            config.set("dimension", Value::Number(render_depth));
        }
    }
}

fn raise_floor(config: &mut Configuration, key: &str, floor: f64) {
    if let Some(n) = config.number(key) {
        if n < floor {
            config.set(key, Value::Number(floor));
        }
    }
}
