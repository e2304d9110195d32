//! G-code post-processor core.
//!
//! A [`PostCore`] session owns the running machine state (position, line
//! numbering, feed memory) and drives a [`Dialect`] that renders each action
//! as controller text. [`GenericMill`] is the reference dialect. Hosts running
//! in a browser use the [`PostProcessor`] wrapper exported through
//! `wasm-bindgen`.

use wasm_bindgen::prelude::*;

// --- LOGGING ---
#[cfg(target_arch = "wasm32")]
fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

#[cfg(target_arch = "wasm32")]
fn warn(s: &str) {
    web_sys::console::warn_1(&JsValue::from_str(s));
}

#[cfg(not(target_arch = "wasm32"))]
fn log(_s: &str) {}

#[cfg(not(target_arch = "wasm32"))]
fn warn(_s: &str) {}

macro_rules! console_log {
    ($($t:tt)*) => ($crate::log(&format!($($t)*)))
}

macro_rules! console_warn {
    ($($t:tt)*) => ($crate::warn(&format!($($t)*)))
}

pub mod dialect;
pub mod error;
pub mod format;
pub mod generic_mill;
pub mod locale;
pub mod modal;
pub mod postcore;
pub mod settings;

pub use dialect::{ArcDirection, AxisWord, Block, Capabilities, Dialect, Plane, Position};
pub use error::PostError;
pub use format::format_number;
pub use generic_mill::GenericMill;
pub use locale::Locale;
pub use modal::ModalState;
pub use postcore::{Phase, PostCore, SessionState};
pub use settings::{MillSettings, Property, PropertyValue, Unit};


/// JavaScript-facing post-processor running the reference mill dialect.
///
/// Axis lists and values are passed as two parallel arrays; property values
/// are plain JS values (booleans, numbers, strings, or `{selected, options}`
/// for the unit choice).
#[wasm_bindgen]
pub struct PostProcessor {
    core: PostCore<GenericMill>,
}

#[wasm_bindgen]
impl PostProcessor {
    #[wasm_bindgen(constructor)]
    pub fn new(locale: &str) -> Result<PostProcessor, JsError> {
        let mut core = PostCore::new(GenericMill::new());
        core.select_locale(locale)?;
        console_log!("PostProcessor ready ({})", locale);
        Ok(Self { core })
    }

    pub fn description(&self) -> Result<String, JsError> {
        Ok(self.core.dialect().description()?.to_string())
    }

    pub fn category(&self) -> String {
        self.core.dialect().category().to_string()
    }

    pub fn extension(&self) -> String {
        self.core.dialect().extension().to_string()
    }

    pub fn ijk_relative(&self) -> bool {
        self.core.dialect().capabilities().relative_arc_center
    }

    pub fn set_safe_height(&mut self, z: f64) {
        self.core.set_safe_height(z);
    }

    pub fn line_count(&self) -> usize {
        self.core.line_count()
    }

    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.core.state()).unwrap_or(JsValue::NULL)
    }

    // ── Property protocol ──────────────────────────────────────────────────

    pub fn property_count(&self) -> usize {
        self.core.dialect().property_count()
    }

    pub fn property_description(&self, index: usize) -> Result<String, JsError> {
        Ok(self.core.dialect().property_description(index)?.to_string())
    }

    pub fn get_property(&self, index: usize) -> Result<JsValue, JsError> {
        let value = self.core.dialect().property(index)?;
        serde_wasm_bindgen::to_value(&value).map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn set_property(&mut self, index: usize, value: JsValue) -> Result<(), JsError> {
        let value: PropertyValue =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&e.to_string()))?;
        self.core.dialect_mut().set_property(index, value)?;
        Ok(())
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    pub fn start_loop(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_loop()?)
    }

    pub fn stop_loop(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_loop()?)
    }

    pub fn start_program(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_program()?)
    }

    pub fn stop_program(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_program()?)
    }

    pub fn start_group(&mut self, name: String, tool: i32, speed: f64) -> Result<String, JsError> {
        Ok(self.core.start_group(&name, tool, speed)?)
    }

    pub fn stop_group(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_group()?)
    }

    pub fn start_toolpath(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_toolpath()?)
    }

    pub fn stop_toolpath(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_toolpath()?)
    }

    pub fn start_single_path(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_single_path()?)
    }

    pub fn stop_single_path(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_single_path()?)
    }

    pub fn line(&mut self, text: String) -> Result<String, JsError> {
        Ok(self.core.line(&text)?)
    }

    pub fn comment(&mut self, text: String) -> Result<String, JsError> {
        Ok(self.core.comment(&text)?)
    }

    // ── Motion ─────────────────────────────────────────────────────────────

    pub fn rapid(&mut self, axes: Vec<String>, values: Vec<f64>) -> Result<String, JsError> {
        Ok(self.core.rapid(&axes, &values)?)
    }

    pub fn linear(&mut self, axes: Vec<String>, values: Vec<f64>) -> Result<String, JsError> {
        Ok(self.core.linear(&axes, &values)?)
    }

    pub fn clockwise(&mut self, axes: Vec<String>, values: Vec<f64>) -> Result<String, JsError> {
        Ok(self.core.clockwise(&axes, &values)?)
    }

    pub fn counter_clockwise(&mut self, axes: Vec<String>, values: Vec<f64>) -> Result<String, JsError> {
        Ok(self.core.counter_clockwise(&axes, &values)?)
    }

    pub fn rapid_to(&mut self, x: f64, y: f64, z: f64) -> Result<String, JsError> {
        Ok(self.core.rapid_to(Position::new(x, y, z))?)
    }

    pub fn linear_to(&mut self, x: f64, y: f64, z: f64) -> Result<String, JsError> {
        Ok(self.core.linear_to(Position::new(x, y, z))?)
    }

    pub fn arc_to(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        center_x: f64,
        center_y: f64,
        clockwise: bool,
    ) -> Result<String, JsError> {
        let direction = if clockwise { ArcDirection::Clockwise } else { ArcDirection::CounterClockwise };
        Ok(self.core.arc_to(Position::new(x, y, z), (center_x, center_y), direction)?)
    }

    pub fn feed(&mut self, value: f64) -> Result<String, JsError> {
        Ok(self.core.feed(value)?)
    }

    pub fn pause(&mut self, seconds: f64) -> Result<String, JsError> {
        Ok(self.core.pause(seconds)?)
    }

    pub fn plane_xy(&mut self) -> Result<String, JsError> {
        Ok(self.core.plane(Plane::Xy)?)
    }

    pub fn plane_xz(&mut self) -> Result<String, JsError> {
        Ok(self.core.plane(Plane::Xz)?)
    }

    pub fn plane_yz(&mut self) -> Result<String, JsError> {
        Ok(self.core.plane(Plane::Yz)?)
    }

    // ── Spindle & coolant ──────────────────────────────────────────────────

    pub fn start_spindle_clockwise(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_spindle_clockwise()?)
    }

    pub fn start_spindle_counter_clockwise(&mut self) -> Result<String, JsError> {
        Ok(self.core.start_spindle_counter_clockwise()?)
    }

    pub fn stop_spindle(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_spindle()?)
    }

    pub fn spindle_speed(&mut self, speed: f64) -> Result<String, JsError> {
        Ok(self.core.spindle_speed(speed)?)
    }

    pub fn mist(&mut self) -> Result<String, JsError> {
        Ok(self.core.mist()?)
    }

    pub fn flood(&mut self) -> Result<String, JsError> {
        Ok(self.core.flood()?)
    }

    pub fn stop_coolant(&mut self) -> Result<String, JsError> {
        Ok(self.core.stop_coolant()?)
    }

    // ── Compensation ───────────────────────────────────────────────────────

    pub fn tool_left_radius_compensation(&mut self) -> Result<String, JsError> {
        Ok(self.core.tool_left_radius_compensation()?)
    }

    pub fn tool_right_radius_compensation(&mut self) -> Result<String, JsError> {
        Ok(self.core.tool_right_radius_compensation()?)
    }

    pub fn tool_cancel_radius_compensation(&mut self) -> Result<String, JsError> {
        Ok(self.core.tool_cancel_radius_compensation()?)
    }

    pub fn tool_length_compensation(&mut self, tool: u32) -> Result<String, JsError> {
        Ok(self.core.tool_length_compensation(tool)?)
    }

    pub fn tool_cancel_length_compensation(&mut self) -> Result<String, JsError> {
        Ok(self.core.tool_cancel_length_compensation()?)
    }

    // ── Canned cycles ──────────────────────────────────────────────────────

    pub fn drilling(
        &mut self,
        axes: Vec<String>,
        values: Vec<f64>,
        retract: f64,
        pause: f64,
    ) -> Result<String, JsError> {
        Ok(self.core.drilling(&axes, &values, retract, pause)?)
    }

    pub fn pecking(
        &mut self,
        axes: Vec<String>,
        values: Vec<f64>,
        retract: f64,
        peck: f64,
    ) -> Result<String, JsError> {
        Ok(self.core.pecking(&axes, &values, retract, peck)?)
    }

    pub fn tapping(&mut self, axes: Vec<String>, values: Vec<f64>, retract: f64) -> Result<String, JsError> {
        Ok(self.core.tapping(&axes, &values, retract)?)
    }

    pub fn boring(
        &mut self,
        axes: Vec<String>,
        values: Vec<f64>,
        retract: f64,
        pause: f64,
    ) -> Result<String, JsError> {
        Ok(self.core.boring(&axes, &values, retract, pause)?)
    }

    pub fn cancel_canned_cycle(&mut self) -> Result<String, JsError> {
        Ok(self.core.cancel_canned_cycle()?)
    }
}
