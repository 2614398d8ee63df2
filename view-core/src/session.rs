//! Settings reconciliation between the UI, the URL fragment and the
//! rendering module.
//!
//! A [`ViewSession`] owns the module boundary, the baseline snapshot
//! taken at startup, the live configuration cache, and the navigation
//! reentrancy flag. There is no other state: a session's lifetime is
//! the page view's lifetime.
//!
//! Two flows meet here. A navigation event decodes the fragment, merges
//! it onto the baseline and pushes the result into the module; a local
//! edit pushes one coerced field and then re-encodes the module's
//! canonical state back into the URL. The reentrancy flag is set around
//! every programmatic hash write and checked at the top of the
//! navigation handler, so the second flow can never re-trigger the
//! first.

use log::{debug, warn};
use thiserror::Error;

use crate::codec;
use crate::engine::{ColourSlot, Engine, ModelCatalogue};
use crate::links;
use crate::schema;
use crate::settings::{self, Configuration};

/// Outcome of a navigation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Fragment decoded and pushed into the module.
    Applied,
    /// Reentrancy flag was set; this is the echo of our own hash write.
    Suppressed,
    /// Fragment was undecodable; state left untouched.
    Ignored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("engine state is not valid JSON: {0}")]
    State(#[from] serde_json::Error),
}

pub struct ViewSession<E: Engine> {
    engine: E,
    baseline: Configuration,
    current: Configuration,
    ignore_hash_change: bool,
}

impl<E: Engine> ViewSession<E> {
    /// Snapshot the module's default state as the baseline and start a
    /// session with the current configuration equal to it.
    pub fn start(mut engine: E) -> Result<Self, SessionError> {
        let baseline = Configuration::from_json(&engine.state_json())?;
        let current = baseline.clone();
        Ok(Self {
            engine,
            baseline,
            current,
            ignore_hash_change: false,
        })
    }

    pub fn baseline(&self) -> &Configuration {
        &self.baseline
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Handle a navigation (hash change) event.
    ///
    /// Undecodable fragments are logged and ignored; the view keeps its
    /// last valid state.
    pub fn apply_fragment(&mut self, fragment: &str) -> Navigation {
        if self.ignore_hash_change {
            return Navigation::Suppressed;
        }

        let overrides = match codec::decode(fragment) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("ignoring undecodable fragment: {e}");
                return Navigation::Ignored;
            }
        };

        let merged = self.baseline.merged_with(&overrides);
        self.engine.load_json(&merged.to_json());
        self.push_configuration(&merged);
        self.engine.force_redraw();
        self.read_back(merged);
        settings::normalize(&mut self.current);
        Navigation::Applied
    }

    /// Handle a local UI edit.
    ///
    /// The module push completes synchronously before the read-back, so
    /// the re-encoded URL can never observe an intermediate state.
    /// `write_hash` receives the new fragment under the reentrancy
    /// flag.
    pub fn apply_edit<W: FnMut(&str)>(&mut self, key: &str, raw: &str, write_hash: W) {
        let Some(kind) = schema::kind_of(key) else {
            warn!("dropping edit for undeclared setting {key:?}");
            return;
        };

        self.current.set(key, schema::coerce(kind, raw));
        self.engine.load_json(&self.current.to_json());
        self.push_field(key);
        self.engine.force_redraw();
        let fallback = self.current.clone();
        self.read_back(fallback);
        settings::normalize(&mut self.current);
        self.publish_hash(write_hash);
    }

    /// Reset the palette to the module's defaults and republish.
    pub fn reset_palette<W: FnMut(&str)>(&mut self, write_hash: W) {
        self.engine.reset_colour_map();
        self.engine.force_redraw();
        let fallback = self.current.clone();
        self.read_back(fallback);
        settings::normalize(&mut self.current);
        self.publish_hash(write_hash);
    }

    /// Encode the current configuration against the baseline and hand
    /// it to `write_hash` with the reentrancy flag held.
    pub fn publish_hash<W: FnMut(&str)>(&mut self, mut write_hash: W) {
        let fragment = self.encoded_fragment();
        debug!("publishing fragment {fragment}");
        self.ignore_hash_change = true;
        write_hash(&fragment);
        self.ignore_hash_change = false;
    }

    /// Diff of the current configuration against the baseline.
    pub fn encoded_fragment(&self) -> String {
        codec::encode(&self.current, &self.baseline)
    }

    /// Widget id → display text pairs for refreshing the UI after a
    /// reconciliation. Callers skip ids with no matching element.
    pub fn widget_values(&self) -> Vec<(String, String)> {
        self.current
            .iter()
            .map(|(key, value)| (key.clone(), value.display()))
            .collect()
    }

    pub fn share_link(&self, origin: &str) -> String {
        links::share_link(origin, &self.encoded_fragment())
    }

    pub fn embed_snippet(&self, origin: &str) -> String {
        links::embed_snippet(origin, &self.encoded_fragment())
    }

    pub fn model_catalogue(&mut self) -> Result<ModelCatalogue, SessionError> {
        Ok(serde_json::from_str(&self.engine.model_catalogue())?)
    }

    pub fn state_json(&mut self) -> String {
        self.engine.state_json()
    }

    pub fn svg(&mut self) -> String {
        self.engine.svg()
    }

    /// Forward new canvas pixel dimensions.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.engine.set_viewport_size(width, height);
    }

    /// Forward a drag delta and redraw.
    pub fn drag(&mut self, dx: f64, dy: f64, dz: f64) {
        self.engine.interpret_drag(dx, dy, dz);
        self.engine.force_redraw();
    }

    // Read the canonical state back from the module; on malformed JSON
    // keep the values we just pushed and complain.
    fn read_back(&mut self, fallback: Configuration) {
        match Configuration::from_json(&self.engine.state_json()) {
            Ok(canonical) => self.current = canonical,
            Err(e) => {
                warn!("engine returned malformed state, keeping pushed values: {e}");
                self.current = fallback;
            }
        }
    }

    // Dispatch every schema-covered field of `config` through its typed
    // setter. Geometry is rebuilt first so parameter setters land on
    // the right model.
    fn push_configuration(&mut self, config: &Configuration) {
        self.push_model(config);
        if let Some(dimension) = config.number("dimension") {
            self.engine.set_active_dimension(dimension as u32);
        }
        self.push_ifs(config);
        self.push_flame(config);
        for slot in ColourSlot::ALL {
            self.push_colour(config, slot);
        }
        if let Some(radius) = config.number("radius") {
            self.engine.set_radius(radius);
        }
        if let Some(minor_radius) = config.number("minorRadius") {
            self.engine.set_minor_radius(minor_radius);
        }
        if let Some(constant) = config.number("constant") {
            self.engine.set_constant(constant);
        }
        if let Some(precision) = config.number("precision") {
            self.engine.set_precision(precision);
        }
    }

    // Push a single edited field and the fields it structurally depends
    // on. Keys without a typed setter already reached the module via
    // the JSON import.
    fn push_field(&mut self, key: &str) {
        let config = self.current.clone();
        match key {
            "model" | "depth" | "renderDepth" | "format" => self.push_model(&config),
            "dimension" => {
                if let Some(dimension) = config.number("dimension") {
                    self.engine.set_active_dimension(dimension as u32);
                }
            }
            "iterations" | "seed" | "functions" | "preRotate" | "postRotate" => {
                self.push_ifs(&config)
            }
            "flameColouring" | "flameCoefficients" => self.push_flame(&config),
            "background" => self.push_colour(&config, ColourSlot::Background),
            "wireframe" => self.push_colour(&config, ColourSlot::Wireframe),
            "surface" => self.push_colour(&config, ColourSlot::Surface),
            "radius" => {
                if let Some(radius) = config.number("radius") {
                    self.engine.set_radius(radius);
                }
            }
            "minorRadius" => {
                if let Some(minor_radius) = config.number("minorRadius") {
                    self.engine.set_minor_radius(minor_radius);
                }
            }
            "constant" => {
                if let Some(constant) = config.number("constant") {
                    self.engine.set_constant(constant);
                }
            }
            "precision" => {
                if let Some(precision) = config.number("precision") {
                    self.engine.set_precision(precision);
                }
            }
            _ => {}
        }
    }

    fn push_model(&mut self, config: &Configuration) {
        let (Some(model), Some(depth), Some(render_depth)) = (
            config.text("model"),
            config.number("depth"),
            config.number("renderDepth"),
        ) else {
            return;
        };
        let format = config.text("format").unwrap_or("cartesian");
        self.engine
            .update_model(format, model, depth as u32, render_depth as u32);
    }

    fn push_ifs(&mut self, config: &Configuration) {
        let (Some(iterations), Some(seed), Some(functions)) = (
            config.number("iterations"),
            config.number("seed"),
            config.number("functions"),
        ) else {
            return;
        };
        let pre_rotate = config.boolean("preRotate").unwrap_or(false);
        let post_rotate = config.boolean("postRotate").unwrap_or(false);
        self.engine.set_ifs_parameters(
            iterations as u32,
            seed as u32,
            functions as u32,
            pre_rotate,
            post_rotate,
        );
    }

    fn push_flame(&mut self, config: &Configuration) {
        if let Some(enabled) = config.boolean("flameColouring") {
            self.engine.set_flame_colouring(enabled);
        }
        if let Some(variants) = config.number("flameCoefficients") {
            self.engine.set_flame_parameters(variants as u32);
        }
    }

    fn push_colour(&mut self, config: &Configuration, slot: ColourSlot) {
        let Some(colour) = config.sequence(slot.key()) else {
            return;
        };
        let channel = |i: usize| colour.get(i).copied().unwrap_or(0.0);
        let (red, green, blue, alpha) = (channel(0), channel(1), channel(2), channel(3));
        self.engine.set_colour(slot, red, green, blue, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedEngine;

    fn session() -> ViewSession<ScriptedEngine> {
        let engine = ScriptedEngine::from_json(r#"{"depth":4,"model":"cube"}"#)
            .expect("state parses");
        ViewSession::start(engine).expect("session starts")
    }

    #[test]
    fn navigation_is_suppressed_while_flag_is_set() {
        let mut session = session();
        session.ignore_hash_change = true;
        assert_eq!(session.apply_fragment(r#"{"depth":6}"#), Navigation::Suppressed);
        // Nothing reached the module.
        assert_eq!(session.engine().calls_named("parseJSON"), 0);

        session.ignore_hash_change = false;
        assert_eq!(session.apply_fragment(r#"{"depth":6}"#), Navigation::Applied);
        assert_eq!(session.engine().calls_named("parseJSON"), 1);
    }

    #[test]
    fn publish_clears_the_flag_afterwards() {
        let mut session = session();
        let mut seen = Vec::new();
        session.publish_hash(|fragment| seen.push(fragment.to_string()));
        assert_eq!(seen, ["{}"]);
        assert!(!session.ignore_hash_change);
    }

    #[test]
    fn undeclared_edit_is_dropped() {
        let mut session = session();
        let mut writes = 0;
        session.apply_edit("nonsense", "1", |_| writes += 1);
        assert_eq!(writes, 0);
        assert_eq!(session.current().get("nonsense"), None);
        assert!(session.engine().calls.is_empty());
    }

    #[test]
    fn current_mirrors_module_state_after_navigation() {
        let mut session = session();
        session.apply_fragment(r#"{"depth":6}"#);
        assert_eq!(session.current(), &session.engine.state);
    }
}
