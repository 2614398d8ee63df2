//! WebAssembly bindings for view-core
//!
//! This module exposes the pure protocol functions to JavaScript via
//! `wasm-bindgen` so front-end tooling (link generators, fragment
//! inspectors) can call the same logic the browser session uses.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::codec;
use crate::input::DragTracker as RustDragTracker;
use crate::links;
use crate::settings::{self, Configuration};

fn parse(json: &str) -> Result<Configuration, JsValue> {
    Configuration::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Diff-encode `current_json` against `baseline_json`.
#[wasm_bindgen]
pub fn encode_settings(current_json: &str, baseline_json: &str) -> Result<String, JsValue> {
    let current = parse(current_json)?;
    let baseline = parse(baseline_json)?;
    Ok(codec::encode(&current, &baseline))
}

/// Decode a URL fragment into a settings object, or null when the
/// fragment is undecodable.
#[wasm_bindgen]
pub fn decode_fragment(fragment: &str) -> JsValue {
    match codec::decode(fragment) {
        Ok(config) => serde_wasm_bindgen::to_value(&config).unwrap_or(JsValue::NULL),
        Err(_) => JsValue::NULL,
    }
}

/// Merge a decoded fragment onto a baseline and return the full
/// configuration as JSON. Undecodable fragments yield the baseline
/// unchanged.
#[wasm_bindgen]
pub fn merge_fragment(baseline_json: &str, fragment: &str) -> Result<String, JsValue> {
    let baseline = parse(baseline_json)?;
    let merged = match codec::decode(fragment) {
        Ok(overrides) => baseline.merged_with(&overrides),
        Err(_) => baseline,
    };
    Ok(merged.to_json())
}

/// Apply the clamp/normalize pass to a configuration.
#[wasm_bindgen]
pub fn normalize_settings(json: &str) -> Result<String, JsValue> {
    let mut config = parse(json)?;
    settings::normalize(&mut config);
    Ok(config.to_json())
}

#[wasm_bindgen]
pub fn encode_component(text: &str) -> String {
    codec::encode_component(text)
}

#[wasm_bindgen]
pub fn share_link(origin: &str, fragment: &str) -> String {
    links::share_link(origin, fragment)
}

#[wasm_bindgen]
pub fn embed_snippet(origin: &str, fragment: &str) -> String {
    links::embed_snippet(origin, fragment)
}

/// Drag gesture tracker.
#[wasm_bindgen]
pub struct DragTracker {
    inner: RustDragTracker,
}

#[wasm_bindgen]
impl DragTracker {
    #[wasm_bindgen(constructor)]
    pub fn new() -> DragTracker {
        DragTracker {
            inner: RustDragTracker::new(),
        }
    }

    #[wasm_bindgen]
    pub fn begin(&mut self, x: f64, y: f64) {
        self.inner.begin(x, y);
    }

    /// Returns `[dx, dy]` since the previous sample, or null when no
    /// drag is active.
    #[wasm_bindgen]
    pub fn sample(&mut self, x: f64, y: f64) -> JsValue {
        match self.inner.sample(x, y) {
            Some((dx, dy)) => {
                let pair = Array::new();
                pair.push(&JsValue::from_f64(dx));
                pair.push(&JsValue::from_f64(dy));
                pair.into()
            }
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen]
    pub fn end(&mut self) {
        self.inner.end();
    }
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new()
    }
}
