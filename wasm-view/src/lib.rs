//! Browser front-end for Hyperview
//!
//! WebAssembly glue binding the page to the view-core session: adapts
//! the compiled rendering module's exported function table into the
//! `Engine` trait, installs the hashchange/resize/touch listeners, and
//! performs the guarded URL writes and best-effort widget refreshes.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement, Window};

use view_core::engine::{ColourSlot, Engine};
use view_core::input::DragTracker;
use view_core::session::{Navigation, ViewSession};

fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Warn);
    });
}

fn call(function: &Function, args: &Array) -> JsValue {
    function.apply(&JsValue::NULL, args).unwrap_or_else(|e| {
        warn!("module call failed: {e:?}");
        JsValue::NULL
    })
}

// The module's ABI takes booleans as 0/1.
fn flag(value: bool) -> JsValue {
    JsValue::from_f64(if value { 1.0 } else { 0.0 })
}

/// `Engine` adapter over the module's cwrap-style function table.
struct JsEngine {
    set_active_dimension: Function,
    force_redraw: Function,
    set_flame_colouring: Function,
    set_ifs_parameters: Function,
    set_flame_parameters: Function,
    set_colour: Function,
    set_viewport_size: Function,
    reset_colour_map: Function,
    get_json: Function,
    get_svg: Function,
    parse_json: Function,
    interpret_drag: Function,
    get_models: Function,
    set_radius: Function,
    set_minor_radius: Function,
    set_constant: Function,
    set_precision: Function,
    update_model: Function,
}

impl JsEngine {
    fn from_module(module: &Object) -> Result<Self, JsValue> {
        let entry = |name: &str| -> Result<Function, JsValue> {
            Reflect::get(module, &JsValue::from_str(name))?
                .dyn_into::<Function>()
                .map_err(|_| JsValue::from_str(&format!("module is missing entry point {name}")))
        };
        Ok(Self {
            set_active_dimension: entry("setActiveDimension")?,
            force_redraw: entry("forceRedraw")?,
            set_flame_colouring: entry("setFlameColouring")?,
            set_ifs_parameters: entry("setIFSParameters")?,
            set_flame_parameters: entry("setFlameParameters")?,
            set_colour: entry("setColour")?,
            set_viewport_size: entry("setViewportSize")?,
            reset_colour_map: entry("resetColourMap")?,
            get_json: entry("getJSON")?,
            get_svg: entry("getSVG")?,
            parse_json: entry("parseJSON")?,
            interpret_drag: entry("interpretDrag")?,
            get_models: entry("getModels")?,
            set_radius: entry("setRadius")?,
            set_minor_radius: entry("setMinorRadius")?,
            set_constant: entry("setConstant")?,
            set_precision: entry("setPrecision")?,
            update_model: entry("updateModel")?,
        })
    }
}

impl Engine for JsEngine {
    fn set_active_dimension(&mut self, dimension: u32) {
        call(
            &self.set_active_dimension,
            &Array::of1(&JsValue::from_f64(dimension as f64)),
        );
    }

    fn force_redraw(&mut self) {
        call(&self.force_redraw, &Array::new());
    }

    fn set_flame_colouring(&mut self, enabled: bool) {
        call(&self.set_flame_colouring, &Array::of1(&flag(enabled)));
    }

    fn set_ifs_parameters(
        &mut self,
        iterations: u32,
        seed: u32,
        functions: u32,
        pre_rotate: bool,
        post_rotate: bool,
    ) {
        call(
            &self.set_ifs_parameters,
            &Array::of5(
                &JsValue::from_f64(iterations as f64),
                &JsValue::from_f64(seed as f64),
                &JsValue::from_f64(functions as f64),
                &flag(pre_rotate),
                &flag(post_rotate),
            ),
        );
    }

    fn set_flame_parameters(&mut self, variants: u32) {
        call(
            &self.set_flame_parameters,
            &Array::of1(&JsValue::from_f64(variants as f64)),
        );
    }

    fn set_colour(&mut self, slot: ColourSlot, red: f64, green: f64, blue: f64, alpha: f64) {
        call(
            &self.set_colour,
            &Array::of5(
                &JsValue::from_f64(slot.index() as f64),
                &JsValue::from_f64(red),
                &JsValue::from_f64(green),
                &JsValue::from_f64(blue),
                &JsValue::from_f64(alpha),
            ),
        );
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        call(
            &self.set_viewport_size,
            &Array::of2(
                &JsValue::from_f64(width as f64),
                &JsValue::from_f64(height as f64),
            ),
        );
    }

    fn reset_colour_map(&mut self) {
        call(&self.reset_colour_map, &Array::new());
    }

    fn set_radius(&mut self, radius: f64) {
        call(&self.set_radius, &Array::of1(&JsValue::from_f64(radius)));
    }

    fn set_minor_radius(&mut self, minor_radius: f64) {
        call(
            &self.set_minor_radius,
            &Array::of1(&JsValue::from_f64(minor_radius)),
        );
    }

    fn set_constant(&mut self, constant: f64) {
        call(&self.set_constant, &Array::of1(&JsValue::from_f64(constant)));
    }

    fn set_precision(&mut self, precision: f64) {
        call(
            &self.set_precision,
            &Array::of1(&JsValue::from_f64(precision)),
        );
    }

    fn update_model(&mut self, format: &str, model: &str, depth: u32, render_depth: u32) {
        call(
            &self.update_model,
            &Array::of4(
                &JsValue::from_str(format),
                &JsValue::from_str(model),
                &JsValue::from_f64(depth as f64),
                &JsValue::from_f64(render_depth as f64),
            ),
        );
    }

    fn interpret_drag(&mut self, dx: f64, dy: f64, dz: f64) {
        call(
            &self.interpret_drag,
            &Array::of3(
                &JsValue::from_f64(dx),
                &JsValue::from_f64(dy),
                &JsValue::from_f64(dz),
            ),
        );
    }

    fn state_json(&mut self) -> String {
        call(&self.get_json, &Array::new())
            .as_string()
            .unwrap_or_default()
    }

    fn load_json(&mut self, json: &str) {
        call(&self.parse_json, &Array::of1(&JsValue::from_str(json)));
    }

    fn svg(&mut self) -> String {
        call(&self.get_svg, &Array::new())
            .as_string()
            .unwrap_or_default()
    }

    fn model_catalogue(&mut self) -> String {
        call(&self.get_models, &Array::new())
            .as_string()
            .unwrap_or_default()
    }
}

/// Session wrapper exposed to the page.
#[wasm_bindgen]
pub struct ViewBridge {
    session: ViewSession<JsEngine>,
    drag: DragTracker,
}

#[wasm_bindgen]
impl ViewBridge {
    /// Snapshot the module's defaults and start a session over its
    /// exported function table.
    #[wasm_bindgen(constructor)]
    pub fn new(module: &Object) -> Result<ViewBridge, JsValue> {
        init_logging();
        let engine = JsEngine::from_module(module)?;
        let session =
            ViewSession::start(engine).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(ViewBridge {
            session,
            drag: DragTracker::new(),
        })
    }

    /// Apply the fragment currently in the address bar.
    pub fn on_hash_change(&mut self) {
        let Some(window) = web_sys::window() else { return };
        let fragment = window.location().hash().unwrap_or_default();
        if fragment.is_empty() || fragment == "#" {
            return;
        }
        if self.session.apply_fragment(&fragment) == Navigation::Applied {
            self.refresh_widgets(&window);
        }
    }

    /// Push a widget edit into the module and republish the URL.
    pub fn apply_edit(&mut self, key: &str, value: &str) {
        let Some(window) = web_sys::window() else { return };
        let location = window.location();
        self.session.apply_edit(key, value, |fragment| {
            if location.set_hash(fragment).is_err() {
                warn!("failed to update location hash");
            }
        });
        self.refresh_widgets(&window);
    }

    pub fn reset_palette(&mut self) {
        let Some(window) = web_sys::window() else { return };
        let location = window.location();
        self.session.reset_palette(|fragment| {
            if location.set_hash(fragment).is_err() {
                warn!("failed to update location hash");
            }
        });
        self.refresh_widgets(&window);
    }

    /// Fill the model and coordinate-format dropdowns from the module's
    /// catalogue. Missing dropdowns are skipped.
    pub fn populate_model_options(&mut self) {
        let Ok(catalogue) = self.session.model_catalogue() else {
            warn!("module returned an invalid model catalogue");
            return;
        };
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        append_options(&document, "model", &catalogue.models);
        append_options(&document, "coordinateFormat", &catalogue.formats);
    }

    /// Match the canvas to the window and tell the module.
    pub fn resize_to_window(&mut self) {
        let Some(window) = web_sys::window() else { return };
        let width = dimension(window.inner_width());
        let height = dimension(window.inner_height());
        if let Some(canvas) = window
            .document()
            .and_then(|d| d.get_element_by_id("canvas"))
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        self.session.set_viewport(width, height);
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.drag.begin(x, y);
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        if let Some((dx, dy)) = self.drag.sample(x, y) {
            self.session.drag(dx, dy, 0.0);
        }
    }

    pub fn touch_end(&mut self) {
        self.drag.end();
    }

    pub fn share_link(&self) -> String {
        self.session.share_link(&origin())
    }

    pub fn embed_snippet(&self) -> String {
        self.session.embed_snippet(&origin())
    }

    pub fn svg(&mut self) -> String {
        self.session.svg()
    }

    pub fn state_json(&mut self) -> String {
        self.session.state_json()
    }
}

impl ViewBridge {
    fn refresh_widgets(&self, window: &Window) {
        let Some(document) = window.document() else { return };
        for (key, text) in self.session.widget_values() {
            // Widgets the page does not have are skipped silently.
            let Some(element) = document.get_element_by_id(&key) else {
                continue;
            };
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                input.set_value(&text);
            } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
                select.set_value(&text);
            } else {
                element.set_text_content(Some(&text));
            }
        }
    }
}

fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

fn dimension(value: Result<JsValue, JsValue>) -> u32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32
}

fn append_options(document: &Document, select_id: &str, names: &[String]) {
    let Some(select) = document.get_element_by_id(select_id) else {
        return;
    };
    for name in names {
        let Ok(option) = document.create_element("option") else {
            continue;
        };
        option.set_text_content(Some(name));
        let _ = select.append_child(&option);
    }
}

/// Construct a bridge over `module` and wire up the page: dropdowns,
/// initial fragment, widget change handlers, hashchange, resize and
/// touch listeners, plus the delayed initial resize.
#[wasm_bindgen]
pub fn attach_view(module: &Object) -> Result<(), JsValue> {
    let bridge = Rc::new(RefCell::new(ViewBridge::new(module)?));
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    bridge.borrow_mut().populate_model_options();
    bridge.borrow_mut().resize_to_window();
    bridge.borrow_mut().on_hash_change();
    wire_widget_listeners(&window, &bridge)?;

    {
        let bridge = Rc::clone(&bridge);
        let on_hash = Closure::<dyn FnMut()>::new(move || bridge.borrow_mut().on_hash_change());
        window.add_event_listener_with_callback("hashchange", on_hash.as_ref().unchecked_ref())?;
        on_hash.forget();
    }

    {
        let b = Rc::clone(&bridge);
        let on_resize =
            Closure::<dyn FnMut()>::new(move || b.borrow_mut().resize_to_window());
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        on_resize.forget();

        // The module sizes its framebuffer late in startup; kick one
        // more resize shortly after load. Fire-and-forget.
        let bridge = Rc::clone(&bridge);
        let delayed = Closure::once_into_js(move || bridge.borrow_mut().resize_to_window());
        window
            .set_timeout_with_callback_and_timeout_and_arguments_0(delayed.unchecked_ref(), 100)?;
    }

    if let Some(canvas) = window.document().and_then(|d| d.get_element_by_id("canvas")) {
        let b = Rc::clone(&bridge);
        let on_start =
            Closure::<dyn FnMut(web_sys::TouchEvent)>::new(move |event: web_sys::TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    b.borrow_mut()
                        .touch_start(touch.client_x() as f64, touch.client_y() as f64);
                }
            });
        canvas.add_event_listener_with_callback("touchstart", on_start.as_ref().unchecked_ref())?;
        on_start.forget();

        let b = Rc::clone(&bridge);
        let on_move =
            Closure::<dyn FnMut(web_sys::TouchEvent)>::new(move |event: web_sys::TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    b.borrow_mut()
                        .touch_move(touch.client_x() as f64, touch.client_y() as f64);
                }
            });
        canvas.add_event_listener_with_callback("touchmove", on_move.as_ref().unchecked_ref())?;
        on_move.forget();

        let b = Rc::clone(&bridge);
        let on_end = Closure::<dyn FnMut()>::new(move || b.borrow_mut().touch_end());
        canvas.add_event_listener_with_callback("touchend", on_end.as_ref().unchecked_ref())?;
        on_end.forget();
    }

    Ok(())
}

fn wire_widget_listeners(window: &Window, bridge: &Rc<RefCell<ViewBridge>>) -> Result<(), JsValue> {
    let Some(document) = window.document() else {
        return Ok(());
    };
    let keys: Vec<String> = bridge
        .borrow()
        .session
        .widget_values()
        .into_iter()
        .map(|(key, _)| key)
        .collect();

    for key in keys {
        let Some(element) = document.get_element_by_id(&key) else {
            continue;
        };
        let bridge = Rc::clone(bridge);
        let id = key.clone();
        let on_change = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(value) = widget_value(&event) else {
                return;
            };
            bridge.borrow_mut().apply_edit(&id, &value);
        });
        element.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
        on_change.forget();
    }
    Ok(())
}

fn widget_value(event: &web_sys::Event) -> Option<String> {
    let target = event.target()?;
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        if input.type_() == "checkbox" {
            return Some(input.checked().to_string());
        }
        return Some(input.value());
    }
    if let Some(select) = target.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    None
}
