//! Reference dialect: a generic 3-axis mill/router speaking common
//! RS-274 G-code.

use crate::dialect::{AxisWord, Block, Capabilities, Dialect, Plane, Position};
use crate::error::{PostError, Result};
use crate::format::{Words, format_number};
use crate::locale::{Labels, Locale};
use crate::modal::ModalState;
use crate::settings::{MillSettings, Property, PropertyValue, Unit};

const DEFAULT_SAFE_HEIGHT: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct GenericMill {
    settings: MillSettings,
    // cached from `settings.condensed`
    space: &'static str,
    locale: Option<Locale>,
    safe: f64,
}

impl Default for GenericMill {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericMill {
    pub fn new() -> Self {
        Self::with_settings(MillSettings::default())
    }

    pub fn with_settings(settings: MillSettings) -> Self {
        Self {
            space: settings.separator(),
            settings,
            locale: None,
            safe: DEFAULT_SAFE_HEIGHT,
        }
    }

    pub fn settings(&self) -> &MillSettings {
        &self.settings
    }

    fn labels(&self) -> Result<&'static Labels> {
        self.locale.map(Locale::labels).ok_or(PostError::LocaleNotSelected)
    }

    fn n(&self, value: f64) -> String {
        format_number(value, self.settings.decimals)
    }

    fn words(&self) -> Words<'static> {
        Words::new(self.space)
    }

    fn code(&self, modal: &mut ModalState, token: &str) -> String {
        modal.code(token, self.settings.condensed)
    }

    fn coords(&self, words: &mut Words<'_>, axes: &[AxisWord]) {
        for word in axes {
            words.push(format!("{}{}", word.axis, self.n(word.value)));
        }
    }

    fn motion(&self, modal: &mut ModalState, token: &str, axes: &[AxisWord]) -> String {
        let mut words = self.words();
        words.push(self.code(modal, token));
        self.coords(&mut words, axes);
        words.finish()
    }

    /// Cycle code and the return-to-R-plane mode, compared as one modal token.
    fn cycle(&self, modal: &mut ModalState, words: &mut Words<'_>, token: &str, axes: &[AxisWord], retract: f64) {
        let code = format!("{token}{}G99", self.space);
        words.push(self.code(modal, &code));
        self.coords(words, axes);
        words.push(modal.retract(&format!("R{}", self.n(retract))));
    }

    fn lift_then(&self, modal: &mut ModalState, at: Position, token: &str) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(2);
        if at.z != self.safe {
            blocks.push(Block::Rapid(vec![AxisWord::new("Z", self.safe)]));
        }
        blocks.push(Block::Line(self.code(modal, token)));
        blocks
    }
}

impl Dialect for GenericMill {
    fn select_locale(&mut self, locale: Locale) {
        console_log!("generic mill: locale {}", locale);
        self.locale = Some(locale);
    }

    fn locale(&self) -> Option<Locale> {
        self.locale
    }

    fn description(&self) -> Result<&'static str> {
        Ok(self.labels()?.description)
    }

    fn category(&self) -> &str {
        "MILL"
    }

    fn extension(&self) -> &str {
        &self.settings.extension
    }

    fn property_count(&self) -> usize {
        Property::ALL.len()
    }

    fn property_description(&self, index: usize) -> Result<&'static str> {
        let property = Property::from_index(index)?;
        Ok(property.label(self.labels()?))
    }

    fn property(&self, index: usize) -> Result<PropertyValue> {
        let property = Property::from_index(index)?;
        self.settings.get(property, self.locale.map(Locale::labels))
    }

    fn set_property(&mut self, index: usize, value: PropertyValue) -> Result<()> {
        let property = Property::from_index(index)?;
        if let Err(err) = self.settings.set(property, value) {
            console_warn!("generic mill: rejected property update: {}", err);
            return Err(err);
        }
        if property == Property::Condensed {
            self.space = self.settings.separator();
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            relative_arc_center: self.settings.relative_arcs,
            ..Capabilities::default()
        }
    }

    fn safe_height(&self) -> f64 {
        self.safe
    }

    fn set_safe_height(&mut self, z: f64) {
        self.safe = z;
    }

    fn increment(&self) -> Option<u32> {
        self.settings.numbering.then_some(self.settings.increment)
    }

    fn start_line(&self, number: u32) -> String {
        if !self.settings.numbering {
            return String::new();
        }
        format!("N{number:05}{}", self.space)
    }

    fn stop_line(&self) -> &str {
        "\n"
    }

    fn comment(&self, text: &str) -> String {
        if self.settings.comments {
            format!("({text})")
        } else {
            String::new()
        }
    }

    fn start_output(&self) -> String {
        self.settings.header.clone()
    }

    fn stop_output(&self) -> String {
        self.settings.footer.clone()
    }

    // G90 absolute, G64 continuous path, G94 feed per minute, then units.
    fn start_program(&self, modal: &mut ModalState) -> String {
        let unit = match self.settings.unit {
            Unit::Millimeter => "G21",
            Unit::Inch => "G20",
        };
        let mut words = self.words();
        for token in ["G90", "G64", "G94", unit] {
            words.push(self.code(modal, token));
        }
        words.finish()
    }

    fn stop_program(&self, _modal: &mut ModalState) -> String {
        "M2".to_string()
    }

    fn initial_position(&self) -> Vec<Block> {
        vec![
            Block::Rapid(vec![AxisWord::new("Z", self.safe)]),
            Block::Rapid(vec![AxisWord::new("X", 0.0), AxisWord::new("Y", 0.0)]),
        ]
    }

    fn final_position(&self, at: Position) -> Vec<Block> {
        if at.z != self.safe {
            vec![Block::Rapid(vec![AxisWord::new("Z", self.safe)])]
        } else {
            Vec::new()
        }
    }

    fn rapid(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
        self.motion(modal, "G0", words)
    }

    fn linear(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
        self.motion(modal, "G1", words)
    }

    fn clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
        self.motion(modal, "G2", words)
    }

    fn counter_clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
        self.motion(modal, "G3", words)
    }

    fn pause(&self, modal: &mut ModalState, seconds: f64) -> String {
        let mut words = self.words();
        words.push(self.code(modal, "G4"));
        words.push(format!("P{}", self.n(seconds)));
        words.finish()
    }

    fn feed(&self, feed: f64) -> String {
        format!("F{}", self.n(feed))
    }

    fn plane(&self, modal: &mut ModalState, plane: Plane) -> String {
        let token = match plane {
            Plane::Xy => "G17",
            Plane::Xz => "G18",
            Plane::Yz => "G19",
        };
        self.code(modal, token)
    }

    fn tool(&self, number: u32) -> String {
        if number == 0 {
            return String::new();
        }
        let mut words = self.words();
        words.push("M6").push(format!("T{}", self.n(f64::from(number))));
        words.finish()
    }

    fn start_spindle_clockwise(&self) -> String {
        "M3".to_string()
    }

    fn start_spindle_counter_clockwise(&self) -> String {
        "M4".to_string()
    }

    fn stop_spindle(&self) -> String {
        "M5".to_string()
    }

    fn spindle_speed(&self, speed: f64) -> String {
        format!("S{}", self.n(speed))
    }

    fn mist(&self) -> String {
        "M7".to_string()
    }

    fn flood(&self) -> String {
        "M8".to_string()
    }

    fn stop_coolant(&self) -> String {
        "M9".to_string()
    }

    fn tool_left_radius_compensation(&self, modal: &mut ModalState) -> String {
        self.code(modal, "G41")
    }

    fn tool_right_radius_compensation(&self, modal: &mut ModalState) -> String {
        self.code(modal, "G42")
    }

    fn tool_cancel_radius_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block> {
        self.lift_then(modal, at, "G40")
    }

    fn tool_length_compensation(&self, modal: &mut ModalState, tool: u32) -> String {
        let mut words = self.words();
        words.push(self.code(modal, "G43"));
        if tool > 0 {
            words.push(format!("H{tool}"));
        }
        words.finish()
    }

    fn tool_cancel_length_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block> {
        self.lift_then(modal, at, "G49")
    }

    fn drilling(&self, modal: &mut ModalState, axes: &[AxisWord], retract: f64, pause: f64) -> String {
        let mut words = self.words();
        // any nonzero pause selects the dwell cycle; only a positive one is written
        let token = if pause != 0.0 { "G82" } else { "G81" };
        self.cycle(modal, &mut words, token, axes, retract);
        if pause > 0.0 {
            words.push(format!("P{}", self.n(pause)));
        }
        words.finish()
    }

    fn pecking(&self, modal: &mut ModalState, axes: &[AxisWord], retract: f64, peck: f64) -> String {
        let mut words = self.words();
        self.cycle(modal, &mut words, "G83", axes, retract);
        words.push(modal.peck(&format!("Q{}", self.n(peck))));
        words.finish()
    }

    fn tapping(&self, modal: &mut ModalState, axes: &[AxisWord], retract: f64) -> String {
        let mut words = self.words();
        self.cycle(modal, &mut words, "G84", axes, retract);
        words.finish()
    }

    fn boring(&self, modal: &mut ModalState, axes: &[AxisWord], retract: f64, pause: f64) -> String {
        let mut words = self.words();
        self.cycle(modal, &mut words, "G85", axes, retract);
        if pause > 0.0 {
            words.push(format!("P{}", self.n(pause)));
        }
        words.finish()
    }

    fn cancel_canned_cycle(&self, modal: &mut ModalState) -> String {
        self.code(modal, "G80")
    }
}
