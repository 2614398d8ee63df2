//! Declared parameter schema.
//!
//! Every parameter the protocol is willing to dispatch to the module has
//! a declared kind here; the codec and the reconciler both consult the
//! table instead of guessing from a value's runtime shape. Keys the
//! module reports but the table does not know are still cached and
//! re-encoded verbatim, they just never reach a typed setter.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::settings::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Boolean,
    /// 4-element R, G, B, alpha sequence in [0, 1].
    Colour,
    /// Short string drawn from the module's model/format catalogue.
    Enum,
    /// Composite ordered number sequence (camera pose, transform).
    NumberSequence,
}

pub struct SchemaEntry {
    pub key: &'static str,
    pub kind: ValueKind,
}

pub static SCHEMA: &[SchemaEntry] = &[
    SchemaEntry { key: "model", kind: ValueKind::Enum },
    SchemaEntry { key: "format", kind: ValueKind::Enum },
    SchemaEntry { key: "depth", kind: ValueKind::Number },
    SchemaEntry { key: "renderDepth", kind: ValueKind::Number },
    SchemaEntry { key: "dimension", kind: ValueKind::Number },
    SchemaEntry { key: "iterations", kind: ValueKind::Number },
    SchemaEntry { key: "seed", kind: ValueKind::Number },
    SchemaEntry { key: "functions", kind: ValueKind::Number },
    SchemaEntry { key: "preRotate", kind: ValueKind::Boolean },
    SchemaEntry { key: "postRotate", kind: ValueKind::Boolean },
    SchemaEntry { key: "flameColouring", kind: ValueKind::Boolean },
    SchemaEntry { key: "flameCoefficients", kind: ValueKind::Number },
    SchemaEntry { key: "radius", kind: ValueKind::Number },
    SchemaEntry { key: "minorRadius", kind: ValueKind::Number },
    SchemaEntry { key: "constant", kind: ValueKind::Number },
    SchemaEntry { key: "precision", kind: ValueKind::Number },
    SchemaEntry { key: "exportMultiplier", kind: ValueKind::Number },
    SchemaEntry { key: "background", kind: ValueKind::Colour },
    SchemaEntry { key: "wireframe", kind: ValueKind::Colour },
    SchemaEntry { key: "surface", kind: ValueKind::Colour },
    SchemaEntry { key: "camera", kind: ValueKind::NumberSequence },
    SchemaEntry { key: "transformation", kind: ValueKind::NumberSequence },
];

static KIND_BY_KEY: Lazy<HashMap<&'static str, ValueKind>> =
    Lazy::new(|| SCHEMA.iter().map(|entry| (entry.key, entry.kind)).collect());

pub fn kind_of(key: &str) -> Option<ValueKind> {
    KIND_BY_KEY.get(key).copied()
}

/// Whether a key takes the element-wise (lossy) diff path in the codec.
pub fn is_composite(key: &str) -> bool {
    matches!(kind_of(key), Some(ValueKind::NumberSequence))
}

/// Coerce a raw UI string to the declared kind.
///
/// Numeric garbage coerces to NaN and is passed along; the module's
/// behavior on invalid input is unspecified upstream and is not
/// defended here.
pub fn coerce(kind: ValueKind, raw: &str) -> Value {
    match kind {
        ValueKind::Number => Value::Number(raw.trim().parse().unwrap_or(f64::NAN)),
        ValueKind::Boolean => Value::Boolean(matches!(raw.trim(), "true" | "1")),
        ValueKind::Enum => Value::Text(raw.into()),
        ValueKind::Colour | ValueKind::NumberSequence => serde_json::from_str::<Vec<f64>>(raw)
            .map(Value::Sequence)
            .unwrap_or_else(|_| Value::Text(raw.into())),
    }
}
