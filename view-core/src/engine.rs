//! Module boundary for the native rendering engine.
//!
//! The compiled visualizer is opaque: the protocol only ever talks to
//! it through the entry points below, one trait method per exported
//! function. Hosts inject a real adapter (the browser crate wraps the
//! module's cwrap table); tests inject [`ScriptedEngine`], which records
//! calls and plays back scripted state so no renderer is needed.

use serde::{Deserialize, Serialize};

use crate::settings::{Configuration, Value};

/// Default palette, as the module reports it before any edits.
pub const DEFAULT_BACKGROUND: [f64; 4] = [0.45, 0.45, 0.65, 1.0];
pub const DEFAULT_WIREFRAME: [f64; 4] = [1.0, 1.0, 1.0, 1.0];
pub const DEFAULT_SURFACE: [f64; 4] = [1.0, 1.0, 1.0, 0.1];

/// Palette slots addressed by the module's colour setter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourSlot {
    Background,
    Wireframe,
    Surface,
}

impl ColourSlot {
    pub const ALL: [ColourSlot; 3] = [
        ColourSlot::Background,
        ColourSlot::Wireframe,
        ColourSlot::Surface,
    ];

    pub fn index(self) -> u32 {
        match self {
            ColourSlot::Background => 0,
            ColourSlot::Wireframe => 1,
            ColourSlot::Surface => 2,
        }
    }

    /// Settings key the slot mirrors.
    pub fn key(self) -> &'static str {
        match self {
            ColourSlot::Background => "background",
            ColourSlot::Wireframe => "wireframe",
            ColourSlot::Surface => "surface",
        }
    }
}

/// Model and coordinate-format names the module can build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelCatalogue {
    pub models: Vec<String>,
    pub formats: Vec<String>,
}

/// One method per exported entry point of the rendering module.
///
/// All calls are synchronous, non-suspending foreign calls; booleans
/// are lowered to 0/1 and colours to 4 floats at the host adapter, not
/// here.
pub trait Engine {
    fn set_active_dimension(&mut self, dimension: u32);
    fn force_redraw(&mut self);
    fn set_flame_colouring(&mut self, enabled: bool);
    fn set_ifs_parameters(
        &mut self,
        iterations: u32,
        seed: u32,
        functions: u32,
        pre_rotate: bool,
        post_rotate: bool,
    );
    fn set_flame_parameters(&mut self, variants: u32);
    fn set_colour(&mut self, slot: ColourSlot, red: f64, green: f64, blue: f64, alpha: f64);
    fn set_viewport_size(&mut self, width: u32, height: u32);
    fn reset_colour_map(&mut self);
    fn set_radius(&mut self, radius: f64);
    fn set_minor_radius(&mut self, minor_radius: f64);
    fn set_constant(&mut self, constant: f64);
    fn set_precision(&mut self, precision: f64);
    fn update_model(&mut self, format: &str, model: &str, depth: u32, render_depth: u32);
    fn interpret_drag(&mut self, dx: f64, dy: f64, dz: f64);
    /// Export the canonical state as JSON.
    fn state_json(&mut self) -> String;
    /// Import state from JSON; unknown keys are the module's problem.
    fn load_json(&mut self, json: &str);
    fn svg(&mut self) -> String;
    /// JSON object with `models` and `formats` name arrays.
    fn model_catalogue(&mut self) -> String;
}

/// Scripted stand-in for the compiled module.
///
/// Holds a configuration as its "internal" state, applies setters to
/// it, and logs every entry-point call in cwrap notation so tests can
/// assert exact call sequences.
pub struct ScriptedEngine {
    pub state: Configuration,
    pub calls: Vec<String>,
    pub redraws: u32,
}

impl ScriptedEngine {
    pub fn new(state: Configuration) -> Self {
        Self {
            state,
            calls: Vec::new(),
            redraws: 0,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(Configuration::from_json(json)?))
    }

    /// Number of logged calls to the named entry point.
    pub fn calls_named(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| call.starts_with(&format!("{name}(")))
            .count()
    }

    fn log(&mut self, call: String) {
        self.calls.push(call);
    }
}

impl Engine for ScriptedEngine {
    fn set_active_dimension(&mut self, dimension: u32) {
        self.log(format!("setActiveDimension({dimension})"));
        self.state.set("dimension", Value::Number(dimension as f64));
    }

    fn force_redraw(&mut self) {
        self.log("forceRedraw()".into());
        self.redraws += 1;
    }

    fn set_flame_colouring(&mut self, enabled: bool) {
        self.log(format!("setFlameColouring({})", enabled as u8));
        self.state.set("flameColouring", Value::Boolean(enabled));
    }

    fn set_ifs_parameters(
        &mut self,
        iterations: u32,
        seed: u32,
        functions: u32,
        pre_rotate: bool,
        post_rotate: bool,
    ) {
        self.log(format!(
            "setIFSParameters({iterations},{seed},{functions},{},{})",
            pre_rotate as u8, post_rotate as u8
        ));
        self.state.set("iterations", Value::Number(iterations as f64));
        self.state.set("seed", Value::Number(seed as f64));
        self.state.set("functions", Value::Number(functions as f64));
        self.state.set("preRotate", Value::Boolean(pre_rotate));
        self.state.set("postRotate", Value::Boolean(post_rotate));
    }

    fn set_flame_parameters(&mut self, variants: u32) {
        self.log(format!("setFlameParameters({variants})"));
        self.state
            .set("flameCoefficients", Value::Number(variants as f64));
    }

    fn set_colour(&mut self, slot: ColourSlot, red: f64, green: f64, blue: f64, alpha: f64) {
        self.log(format!(
            "setColour({},{red},{green},{blue},{alpha})",
            slot.index()
        ));
        self.state
            .set(slot.key(), Value::Sequence(vec![red, green, blue, alpha]));
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.log(format!("setViewportSize({width},{height})"));
    }

    fn reset_colour_map(&mut self) {
        self.log("resetColourMap()".into());
        self.state
            .set("background", Value::Sequence(DEFAULT_BACKGROUND.to_vec()));
        self.state
            .set("wireframe", Value::Sequence(DEFAULT_WIREFRAME.to_vec()));
        self.state
            .set("surface", Value::Sequence(DEFAULT_SURFACE.to_vec()));
    }

    fn set_radius(&mut self, radius: f64) {
        self.log(format!("setRadius({radius})"));
        self.state.set("radius", Value::Number(radius));
    }

    fn set_minor_radius(&mut self, minor_radius: f64) {
        self.log(format!("setMinorRadius({minor_radius})"));
        self.state.set("minorRadius", Value::Number(minor_radius));
    }

    fn set_constant(&mut self, constant: f64) {
        self.log(format!("setConstant({constant})"));
        self.state.set("constant", Value::Number(constant));
    }

    fn set_precision(&mut self, precision: f64) {
        self.log(format!("setPrecision({precision})"));
        self.state.set("precision", Value::Number(precision));
    }

    fn update_model(&mut self, format: &str, model: &str, depth: u32, render_depth: u32) {
        self.log(format!("updateModel({format},{model},{depth},{render_depth})"));
        self.state.set("format", Value::Text(format.into()));
        self.state.set("model", Value::Text(model.into()));
        self.state.set("depth", Value::Number(depth as f64));
        self.state.set("renderDepth", Value::Number(render_depth as f64));
    }

    fn interpret_drag(&mut self, dx: f64, dy: f64, dz: f64) {
        self.log(format!("interpretDrag({dx},{dy},{dz})"));
    }

    fn state_json(&mut self) -> String {
        self.log("getJSON()".into());
        self.state.to_json()
    }

    fn load_json(&mut self, json: &str) {
        self.log(format!("parseJSON({json})"));
        if let Ok(overrides) = Configuration::from_json(json) {
            self.state.merge_from(&overrides);
        }
    }

    fn svg(&mut self) -> String {
        self.log("getSVG()".into());
        let name = self.state.text("model").unwrap_or("wireframe");
        format!("<svg xmlns='http://www.w3.org/2000/svg'><title>{name}</title></svg>")
    }

    fn model_catalogue(&mut self) -> String {
        self.log("getModels()".into());
        r#"{"models":["axe-graph","simplex","cube","sphere","moebius-strip","klein-bagel","sierpinski-gasket","sierpinski-carpet"],"formats":["cartesian","polar"]}"#
            .into()
    }
}
