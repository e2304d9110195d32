//! The contract every controller dialect implements.
//!
//! A dialect turns one semantic action into the text of that controller. It
//! never numbers or terminates lines itself and never tracks the tool: the
//! orchestrator in [`crate::postcore`] owns that state and hands the dialect
//! what it needs. Modal memory is threaded in explicitly as `&mut ModalState`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::locale::Locale;
use crate::modal::ModalState;
use crate::settings::PropertyValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One address word of a motion block: an axis letter and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisWord {
    pub axis: String,
    pub value: f64,
}

impl AxisWord {
    pub fn new(axis: impl Into<String>, value: f64) -> Self {
        Self { axis: axis.into(), value }
    }
}

/// A piece of output a dialect hands back for the orchestrator to assemble.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Rendered block text, still missing numbering and terminator.
    Line(String),
    /// A rapid move the orchestrator must perform, so position stays tracked.
    Rapid(Vec<AxisWord>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

/// Fixed behaviour queries the orchestrator consults but never overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Always pass X and Y to circular moves.
    pub pass_xy_to_arc: bool,
    /// Always pass Z to circular moves.
    pub pass_z_to_arc: bool,
    /// Always pass X and Y to rapid and linear moves.
    pub pass_xy_to_linear: bool,
    /// Always pass Z to rapid and linear moves.
    pub pass_z_to_linear: bool,
    /// The machine has no programmable Z.
    pub disable_z: bool,
    pub lift_before_tool_change: bool,
    /// Arc centers are given relative to the start point.
    pub relative_arc_center: bool,
}

pub trait Dialect {
    // ── Identity & localization ────────────────────────────────────────────

    fn select_locale(&mut self, locale: Locale);
    fn locale(&self) -> Option<Locale>;
    fn description(&self) -> Result<&'static str>;
    fn category(&self) -> &str;
    /// Output file extension without the leading dot.
    fn extension(&self) -> &str;

    // ── Property protocol ──────────────────────────────────────────────────

    fn property_count(&self) -> usize;
    fn property_description(&self, index: usize) -> Result<&'static str>;
    fn property(&self, index: usize) -> Result<PropertyValue>;
    fn set_property(&mut self, index: usize, value: PropertyValue) -> Result<()>;

    // ── Capabilities ───────────────────────────────────────────────────────

    fn capabilities(&self) -> Capabilities;
    fn safe_height(&self) -> f64;
    fn set_safe_height(&mut self, z: f64);
    /// Line-number increment, `None` when numbering is off.
    fn increment(&self) -> Option<u32>;

    // ── Line framing ───────────────────────────────────────────────────────

    fn start_line(&self, number: u32) -> String;
    fn stop_line(&self) -> &str;
    fn comment(&self, text: &str) -> String;

    /// Whether `text` already starts with a line-number marker.
    fn has_line_number(&self, text: &str) -> bool {
        let mut chars = text.chars();
        chars.next() == Some('N') && chars.next().is_some_and(|c| c.is_ascii_digit())
    }

    // ── Program bracketing ─────────────────────────────────────────────────

    fn start_output(&self) -> String;
    fn stop_output(&self) -> String;
    fn start_program(&self, modal: &mut ModalState) -> String;
    fn stop_program(&self, modal: &mut ModalState) -> String;
    fn initial_position(&self) -> Vec<Block>;
    fn final_position(&self, at: Position) -> Vec<Block>;

    fn start_toolpath(&self) -> String {
        String::new()
    }

    fn stop_toolpath(&self) -> String {
        String::new()
    }

    fn start_single_path(&self) -> String {
        String::new()
    }

    fn stop_single_path(&self) -> String {
        String::new()
    }

    // ── Motion ─────────────────────────────────────────────────────────────

    fn rapid(&self, modal: &mut ModalState, words: &[AxisWord]) -> String;
    fn linear(&self, modal: &mut ModalState, words: &[AxisWord]) -> String;
    fn clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String;
    fn counter_clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String;
    fn pause(&self, modal: &mut ModalState, seconds: f64) -> String;
    fn feed(&self, feed: f64) -> String;
    fn plane(&self, modal: &mut ModalState, plane: Plane) -> String;

    // ── Tool, spindle & coolant ────────────────────────────────────────────

    fn tool(&self, number: u32) -> String;
    fn start_spindle_clockwise(&self) -> String;
    fn start_spindle_counter_clockwise(&self) -> String;
    fn stop_spindle(&self) -> String;
    fn spindle_speed(&self, speed: f64) -> String;
    fn mist(&self) -> String;
    fn flood(&self) -> String;
    fn stop_coolant(&self) -> String;

    // ── Compensation ───────────────────────────────────────────────────────

    fn tool_left_radius_compensation(&self, modal: &mut ModalState) -> String;
    fn tool_right_radius_compensation(&self, modal: &mut ModalState) -> String;
    /// May ask for a lift to safe height before the cancel code.
    fn tool_cancel_radius_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block>;
    fn tool_length_compensation(&self, modal: &mut ModalState, tool: u32) -> String;
    /// May ask for a lift to safe height before the cancel code.
    fn tool_cancel_length_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block>;

    // ── Canned cycles ──────────────────────────────────────────────────────

    fn drilling(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, pause: f64) -> String;
    fn pecking(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, peck: f64) -> String;
    fn tapping(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64) -> String;
    fn boring(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, pause: f64) -> String;
    fn cancel_canned_cycle(&self, modal: &mut ModalState) -> String;
}
