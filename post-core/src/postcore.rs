//! Session orchestrator: owns the machine state of one emission session and
//! wraps every dialect fragment into numbered, terminated lines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::{ArcDirection, AxisWord, Block, Dialect, Plane, Position};
use crate::error::{PostError, Result};
use crate::locale::Locale;
use crate::modal::ModalState;

/// Where a session stands in the `loop → program → group` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Before `start_loop` or after `stop_loop`.
    Idle,
    /// Between `start_loop`/`stop_program` and `start_program`/`stop_loop`.
    Looping,
    Program,
    Group,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Looping => "outside a program",
            Phase::Program => "inside a program",
            Phase::Group => "inside a group",
        };
        f.write_str(name)
    }
}

const OUTPUT: &[Phase] = &[Phase::Looping, Phase::Program, Phase::Group];
const MOTION: &[Phase] = &[Phase::Program, Phase::Group];

/// Serializable snapshot of the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub position: Position,
    pub current_line: u32,
    pub line_count: usize,
    pub phase: Phase,
}

pub struct PostCore<D: Dialect> {
    dialect: D,
    modal: ModalState,
    position: Position,
    phase: Phase,
    // None when numbering is off; captured at `start_loop`
    increment: Option<u32>,
    current_line: u32,
    line_count: usize,
    feed: f64,
}

impl<D: Dialect> PostCore<D> {
    pub fn new(dialect: D) -> Self {
        Self {
            dialect,
            modal: ModalState::new(),
            position: Position::ORIGIN,
            phase: Phase::Idle,
            increment: None,
            current_line: 0,
            line_count: 0,
            feed: 0.0,
        }
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Mutable access for configuration. Property changes made mid-session
    /// apply to every following call.
    pub fn dialect_mut(&mut self) -> &mut D {
        &mut self.dialect
    }

    pub fn into_dialect(self) -> D {
        self.dialect
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Last sequence number handed out.
    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    /// Number of non-empty lines emitted since `start_loop`.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            position: self.position,
            current_line: self.current_line,
            line_count: self.line_count,
            phase: self.phase,
        }
    }

    pub fn select_locale(&mut self, id: &str) -> Result<()> {
        let locale: Locale = id.parse()?;
        self.dialect.select_locale(locale);
        Ok(())
    }

    pub fn set_safe_height(&mut self, z: f64) {
        self.dialect.set_safe_height(z);
    }

    // ── Line assembly ──────────────────────────────────────────────────────

    fn require(&self, operation: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(PostError::Lifecycle { operation, phase: self.phase })
        }
    }

    fn assemble(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut out = String::with_capacity(text.len() + 8);
        if let Some(increment) = self.increment {
            if !self.dialect.has_line_number(text) {
                self.current_line = self.current_line.saturating_add(increment);
                out.push_str(&self.dialect.start_line(self.current_line));
            }
        }
        out.push_str(text);
        self.terminate(&mut out);
        self.line_count += 1;
        out
    }

    fn terminate(&self, out: &mut String) {
        let stop = self.dialect.stop_line();
        if !out.ends_with(stop) {
            out.push_str(stop);
        }
    }

    /// Header, footer and comments: terminated and counted, never numbered.
    fn unnumbered(&mut self, text: String) -> String {
        if text.is_empty() {
            return text;
        }
        let mut out = text;
        self.terminate(&mut out);
        self.line_count += 1;
        out
    }

    fn run_blocks(&mut self, blocks: Vec<Block>) -> String {
        let mut out = String::new();
        for block in blocks {
            match block {
                Block::Line(text) => out.push_str(&self.assemble(&text)),
                Block::Rapid(words) => {
                    self.track(&words);
                    let text = self.dialect.rapid(&mut self.modal, &words);
                    out.push_str(&self.assemble(&text));
                }
            }
        }
        out
    }

    /// Raw text such as a user post command; may span several lines.
    pub fn line(&mut self, text: &str) -> Result<String> {
        self.require("line", OUTPUT)?;
        let mut out = String::new();
        for piece in text.split('\n') {
            let piece = piece.replace('\r', "");
            out.push_str(&self.assemble(&piece));
        }
        Ok(out)
    }

    pub fn comment(&mut self, text: &str) -> Result<String> {
        self.require("comment", OUTPUT)?;
        if text.is_empty() {
            return Ok(String::new());
        }
        let rendered = self.dialect.comment(text);
        Ok(self.unnumbered(rendered))
    }

    // ── Position tracking ──────────────────────────────────────────────────

    fn track(&mut self, words: &[AxisWord]) {
        for word in words {
            if word.axis.eq_ignore_ascii_case("X") {
                self.position.x = word.value;
            } else if word.axis.eq_ignore_ascii_case("Y") {
                self.position.y = word.value;
            } else if word.axis.eq_ignore_ascii_case("Z") {
                self.position.z = word.value;
            }
        }
    }

    fn words<S: AsRef<str>>(axes: &[S], values: &[f64]) -> Result<Vec<AxisWord>> {
        if axes.len() != values.len() {
            return Err(PostError::AxisMismatch { axes: axes.len(), values: values.len() });
        }
        Ok(axes
            .iter()
            .zip(values)
            .map(|(axis, value)| AxisWord::new(axis.as_ref(), *value))
            .collect())
    }

    /// Validate, track and render one motion block.
    fn motion<S, F>(&mut self, operation: &'static str, axes: &[S], values: &[f64], render: F) -> Result<String>
    where
        S: AsRef<str>,
        F: FnOnce(&D, &mut ModalState, &[AxisWord]) -> String,
    {
        self.require(operation, MOTION)?;
        let words = Self::words(axes, values)?;
        self.track(&words);
        let text = render(&self.dialect, &mut self.modal, &words);
        Ok(self.assemble(&text))
    }

    /// Render a non-motion action inside the program envelope.
    fn action<F>(&mut self, operation: &'static str, render: F) -> Result<String>
    where
        F: FnOnce(&D, &mut ModalState) -> String,
    {
        self.require(operation, MOTION)?;
        let text = render(&self.dialect, &mut self.modal);
        Ok(self.assemble(&text))
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    pub fn start_loop(&mut self) -> Result<String> {
        self.require("start_loop", &[Phase::Idle])?;
        self.position = Position::ORIGIN;
        self.modal = ModalState::new();
        self.feed = 0.0;
        self.increment = self.dialect.increment();
        // the first numbered line is one increment past this seed
        self.current_line = self.increment.unwrap_or(0);
        self.line_count = 0;
        self.phase = Phase::Looping;
        console_log!("post session started ({} numbering)", if self.increment.is_some() { "with" } else { "without" });

        let header = self.dialect.start_output();
        Ok(self.unnumbered(header))
    }

    pub fn stop_loop(&mut self) -> Result<String> {
        self.require("stop_loop", &[Phase::Looping])?;
        self.phase = Phase::Idle;
        let footer = self.dialect.stop_output();
        let out = self.unnumbered(footer);
        console_log!("post session finished: {} lines", self.line_count);
        Ok(out)
    }

    /// Preamble followed by the move to safe height and then home.
    pub fn start_program(&mut self) -> Result<String> {
        self.require("start_program", &[Phase::Looping])?;
        self.phase = Phase::Program;
        let preamble = self.dialect.start_program(&mut self.modal);
        let mut out = self.assemble(&preamble);
        let blocks = self.dialect.initial_position();
        out.push_str(&self.run_blocks(blocks));
        Ok(out)
    }

    pub fn stop_program(&mut self) -> Result<String> {
        self.require("stop_program", &[Phase::Program])?;
        let blocks = self.dialect.final_position(self.position);
        let mut out = self.run_blocks(blocks);
        let stop = self.dialect.stop_program(&mut self.modal);
        out.push_str(&self.assemble(&stop));
        self.phase = Phase::Looping;
        Ok(out)
    }

    /// Tool change when `tool >= 0` (0 keeps the current tool), then the
    /// spindle speed when `speed > 0`.
    pub fn start_group(&mut self, name: &str, tool: i32, speed: f64) -> Result<String> {
        self.require("start_group", &[Phase::Program])?;
        self.phase = Phase::Group;
        console_log!("group `{}`: tool {}, speed {}", name, tool, speed);

        let mut out = String::new();
        let Ok(tool) = u32::try_from(tool) else {
            return Ok(out);
        };
        let safe = self.dialect.safe_height();
        if tool > 0 && self.dialect.capabilities().lift_before_tool_change && self.position.z != safe {
            out.push_str(&self.run_blocks(vec![Block::Rapid(vec![AxisWord::new("Z", safe)])]));
        }
        let change = self.dialect.tool(tool);
        out.push_str(&self.assemble(&change));
        if speed > 0.0 {
            let spindle = self.dialect.spindle_speed(speed);
            out.push_str(&self.assemble(&spindle));
        }
        Ok(out)
    }

    pub fn stop_group(&mut self) -> Result<String> {
        self.require("stop_group", &[Phase::Group])?;
        self.phase = Phase::Program;
        Ok(String::new())
    }

    pub fn start_toolpath(&mut self) -> Result<String> {
        self.action("start_toolpath", |d, _| d.start_toolpath())
    }

    pub fn stop_toolpath(&mut self) -> Result<String> {
        self.action("stop_toolpath", |d, _| d.stop_toolpath())
    }

    pub fn start_single_path(&mut self) -> Result<String> {
        self.action("start_single_path", |d, _| d.start_single_path())
    }

    pub fn stop_single_path(&mut self) -> Result<String> {
        self.action("stop_single_path", |d, _| d.stop_single_path())
    }

    // ── Motion ─────────────────────────────────────────────────────────────

    pub fn rapid<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64]) -> Result<String> {
        self.motion("rapid", axes, values, |d, m, w| d.rapid(m, w))
    }

    pub fn linear<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64]) -> Result<String> {
        self.motion("linear", axes, values, |d, m, w| d.linear(m, w))
    }

    pub fn clockwise<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64]) -> Result<String> {
        self.motion("clockwise", axes, values, |d, m, w| d.clockwise(m, w))
    }

    pub fn counter_clockwise<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64]) -> Result<String> {
        self.motion("counter_clockwise", axes, values, |d, m, w| d.counter_clockwise(m, w))
    }

    /// Emitted only when `value` differs from the last feed applied.
    pub fn feed(&mut self, value: f64) -> Result<String> {
        self.require("feed", MOTION)?;
        if value == self.feed {
            return Ok(String::new());
        }
        self.feed = value;
        let text = self.dialect.feed(value);
        Ok(self.assemble(&text))
    }

    pub fn pause(&mut self, seconds: f64) -> Result<String> {
        self.action("pause", |d, m| d.pause(m, seconds))
    }

    pub fn plane(&mut self, plane: Plane) -> Result<String> {
        self.action("plane", |d, m| d.plane(m, plane))
    }

    // ── Spindle & coolant ──────────────────────────────────────────────────

    pub fn start_spindle_clockwise(&mut self) -> Result<String> {
        self.action("start_spindle_clockwise", |d, _| d.start_spindle_clockwise())
    }

    pub fn start_spindle_counter_clockwise(&mut self) -> Result<String> {
        self.action("start_spindle_counter_clockwise", |d, _| d.start_spindle_counter_clockwise())
    }

    pub fn stop_spindle(&mut self) -> Result<String> {
        self.action("stop_spindle", |d, _| d.stop_spindle())
    }

    pub fn spindle_speed(&mut self, speed: f64) -> Result<String> {
        self.action("spindle_speed", |d, _| d.spindle_speed(speed))
    }

    pub fn mist(&mut self) -> Result<String> {
        self.action("mist", |d, _| d.mist())
    }

    pub fn flood(&mut self) -> Result<String> {
        self.action("flood", |d, _| d.flood())
    }

    pub fn stop_coolant(&mut self) -> Result<String> {
        self.action("stop_coolant", |d, _| d.stop_coolant())
    }

    // ── Compensation ───────────────────────────────────────────────────────

    pub fn tool_left_radius_compensation(&mut self) -> Result<String> {
        self.action("tool_left_radius_compensation", |d, m| d.tool_left_radius_compensation(m))
    }

    pub fn tool_right_radius_compensation(&mut self) -> Result<String> {
        self.action("tool_right_radius_compensation", |d, m| d.tool_right_radius_compensation(m))
    }

    pub fn tool_cancel_radius_compensation(&mut self) -> Result<String> {
        self.require("tool_cancel_radius_compensation", MOTION)?;
        let blocks = self.dialect.tool_cancel_radius_compensation(&mut self.modal, self.position);
        Ok(self.run_blocks(blocks))
    }

    pub fn tool_length_compensation(&mut self, tool: u32) -> Result<String> {
        self.action("tool_length_compensation", |d, m| d.tool_length_compensation(m, tool))
    }

    pub fn tool_cancel_length_compensation(&mut self) -> Result<String> {
        self.require("tool_cancel_length_compensation", MOTION)?;
        let blocks = self.dialect.tool_cancel_length_compensation(&mut self.modal, self.position);
        Ok(self.run_blocks(blocks))
    }

    // ── Canned cycles ──────────────────────────────────────────────────────
    //
    // Cycles track their target like any other motion, so the program end
    // lifts from the cycle depth.

    pub fn drilling<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64], retract: f64, pause: f64) -> Result<String> {
        self.motion("drilling", axes, values, |d, m, w| d.drilling(m, w, retract, pause))
    }

    pub fn pecking<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64], retract: f64, peck: f64) -> Result<String> {
        self.motion("pecking", axes, values, |d, m, w| d.pecking(m, w, retract, peck))
    }

    pub fn tapping<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64], retract: f64) -> Result<String> {
        self.motion("tapping", axes, values, |d, m, w| d.tapping(m, w, retract))
    }

    pub fn boring<S: AsRef<str>>(&mut self, axes: &[S], values: &[f64], retract: f64, pause: f64) -> Result<String> {
        self.motion("boring", axes, values, |d, m, w| d.boring(m, w, retract, pause))
    }

    pub fn cancel_canned_cycle(&mut self) -> Result<String> {
        self.action("cancel_canned_cycle", |d, m| d.cancel_canned_cycle(m))
    }

    // ── Position-based moves ───────────────────────────────────────────────
    //
    // Producers that think in absolute targets instead of axis lists: only
    // the axes that change are emitted, subject to the dialect capabilities.

    fn straight_words(&self, target: Position) -> Vec<AxisWord> {
        let caps = self.dialect.capabilities();
        let mut words = Vec::with_capacity(3);
        if caps.pass_xy_to_linear || target.x != self.position.x {
            words.push(AxisWord::new("X", target.x));
        }
        if caps.pass_xy_to_linear || target.y != self.position.y {
            words.push(AxisWord::new("Y", target.y));
        }
        if !caps.disable_z && (caps.pass_z_to_linear || target.z != self.position.z) {
            words.push(AxisWord::new("Z", target.z));
        }
        words
    }

    fn straight_to(&mut self, operation: &'static str, target: Position, rapid: bool) -> Result<String> {
        self.require(operation, MOTION)?;
        let words = self.straight_words(target);
        if words.is_empty() {
            return Ok(String::new());
        }
        self.track(&words);
        let text = if rapid {
            self.dialect.rapid(&mut self.modal, &words)
        } else {
            self.dialect.linear(&mut self.modal, &words)
        };
        Ok(self.assemble(&text))
    }

    pub fn rapid_to(&mut self, target: Position) -> Result<String> {
        self.straight_to("rapid_to", target, true)
    }

    pub fn linear_to(&mut self, target: Position) -> Result<String> {
        self.straight_to("linear_to", target, false)
    }

    /// Arc in the XY plane around the absolute `center` (x, y).
    ///
    /// With relative arc centers the I/J offsets are taken from the current
    /// position and zero offsets are left out.
    pub fn arc_to(&mut self, target: Position, center: (f64, f64), direction: ArcDirection) -> Result<String> {
        self.require("arc_to", MOTION)?;
        let caps = self.dialect.capabilities();
        let mut words = Vec::with_capacity(5);
        if caps.pass_xy_to_arc || target.x != self.position.x {
            words.push(AxisWord::new("X", target.x));
        }
        if caps.pass_xy_to_arc || target.y != self.position.y {
            words.push(AxisWord::new("Y", target.y));
        }
        if !caps.disable_z && (caps.pass_z_to_arc || target.z != self.position.z) {
            words.push(AxisWord::new("Z", target.z));
        }

        let (mut i, mut j) = center;
        if caps.relative_arc_center {
            i -= self.position.x;
            j -= self.position.y;
        }
        if !caps.relative_arc_center || i != 0.0 {
            words.push(AxisWord::new("I", i));
        }
        if !caps.relative_arc_center || j != 0.0 {
            words.push(AxisWord::new("J", j));
        }
        if words.is_empty() {
            return Ok(String::new());
        }

        self.track(&words);
        let text = match direction {
            ArcDirection::Clockwise => self.dialect.clockwise(&mut self.modal, &words),
            ArcDirection::CounterClockwise => self.dialect.counter_clockwise(&mut self.modal, &words),
        };
        Ok(self.assemble(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Capabilities;
    use crate::generic_mill::GenericMill;
    use crate::settings::PropertyValue;

    const NONE: [&str; 0] = [];

    fn mill(condensed: bool, decimals: i64, numbering: bool) -> GenericMill {
        let mut mill = GenericMill::new();
        mill.set_property(0, numbering.into()).unwrap();
        mill.set_property(2, condensed.into()).unwrap();
        mill.set_property(3, decimals.into()).unwrap();
        mill
    }

    fn in_program(mill: GenericMill) -> PostCore<GenericMill> {
        let mut core = PostCore::new(mill);
        core.start_loop().unwrap();
        core.start_program().unwrap();
        core
    }

    /// Reference mill with its capability flags replaced.
    struct Flagged {
        mill: GenericMill,
        caps: Capabilities,
    }

    impl Dialect for Flagged {
        fn select_locale(&mut self, locale: Locale) {
            self.mill.select_locale(locale)
        }
        fn locale(&self) -> Option<Locale> {
            self.mill.locale()
        }
        fn description(&self) -> Result<&'static str> {
            self.mill.description()
        }
        fn category(&self) -> &str {
            self.mill.category()
        }
        fn extension(&self) -> &str {
            self.mill.extension()
        }
        fn property_count(&self) -> usize {
            self.mill.property_count()
        }
        fn property_description(&self, index: usize) -> Result<&'static str> {
            self.mill.property_description(index)
        }
        fn property(&self, index: usize) -> Result<PropertyValue> {
            self.mill.property(index)
        }
        fn set_property(&mut self, index: usize, value: PropertyValue) -> Result<()> {
            self.mill.set_property(index, value)
        }
        fn capabilities(&self) -> Capabilities {
            self.caps
        }
        fn safe_height(&self) -> f64 {
            self.mill.safe_height()
        }
        fn set_safe_height(&mut self, z: f64) {
            self.mill.set_safe_height(z)
        }
        fn increment(&self) -> Option<u32> {
            self.mill.increment()
        }
        fn start_line(&self, number: u32) -> String {
            self.mill.start_line(number)
        }
        fn stop_line(&self) -> &str {
            self.mill.stop_line()
        }
        fn comment(&self, text: &str) -> String {
            self.mill.comment(text)
        }
        fn start_output(&self) -> String {
            self.mill.start_output()
        }
        fn stop_output(&self) -> String {
            self.mill.stop_output()
        }
        fn start_program(&self, modal: &mut ModalState) -> String {
            self.mill.start_program(modal)
        }
        fn stop_program(&self, modal: &mut ModalState) -> String {
            self.mill.stop_program(modal)
        }
        fn initial_position(&self) -> Vec<Block> {
            self.mill.initial_position()
        }
        fn final_position(&self, at: Position) -> Vec<Block> {
            self.mill.final_position(at)
        }
        fn rapid(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
            self.mill.rapid(modal, words)
        }
        fn linear(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
            self.mill.linear(modal, words)
        }
        fn clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
            self.mill.clockwise(modal, words)
        }
        fn counter_clockwise(&self, modal: &mut ModalState, words: &[AxisWord]) -> String {
            self.mill.counter_clockwise(modal, words)
        }
        fn pause(&self, modal: &mut ModalState, seconds: f64) -> String {
            self.mill.pause(modal, seconds)
        }
        fn feed(&self, feed: f64) -> String {
            self.mill.feed(feed)
        }
        fn plane(&self, modal: &mut ModalState, plane: Plane) -> String {
            self.mill.plane(modal, plane)
        }
        fn tool(&self, number: u32) -> String {
            self.mill.tool(number)
        }
        fn start_spindle_clockwise(&self) -> String {
            self.mill.start_spindle_clockwise()
        }
        fn start_spindle_counter_clockwise(&self) -> String {
            self.mill.start_spindle_counter_clockwise()
        }
        fn stop_spindle(&self) -> String {
            self.mill.stop_spindle()
        }
        fn spindle_speed(&self, speed: f64) -> String {
            self.mill.spindle_speed(speed)
        }
        fn mist(&self) -> String {
            self.mill.mist()
        }
        fn flood(&self) -> String {
            self.mill.flood()
        }
        fn stop_coolant(&self) -> String {
            self.mill.stop_coolant()
        }
        fn tool_left_radius_compensation(&self, modal: &mut ModalState) -> String {
            self.mill.tool_left_radius_compensation(modal)
        }
        fn tool_right_radius_compensation(&self, modal: &mut ModalState) -> String {
            self.mill.tool_right_radius_compensation(modal)
        }
        fn tool_cancel_radius_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block> {
            self.mill.tool_cancel_radius_compensation(modal, at)
        }
        fn tool_length_compensation(&self, modal: &mut ModalState, tool: u32) -> String {
            self.mill.tool_length_compensation(modal, tool)
        }
        fn tool_cancel_length_compensation(&self, modal: &mut ModalState, at: Position) -> Vec<Block> {
            self.mill.tool_cancel_length_compensation(modal, at)
        }
        fn drilling(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, pause: f64) -> String {
            self.mill.drilling(modal, words, retract, pause)
        }
        fn pecking(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, peck: f64) -> String {
            self.mill.pecking(modal, words, retract, peck)
        }
        fn tapping(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64) -> String {
            self.mill.tapping(modal, words, retract)
        }
        fn boring(&self, modal: &mut ModalState, words: &[AxisWord], retract: f64, pause: f64) -> String {
            self.mill.boring(modal, words, retract, pause)
        }
        fn cancel_canned_cycle(&self, modal: &mut ModalState) -> String {
            self.mill.cancel_canned_cycle(modal)
        }
    }

    fn flagged(caps: Capabilities) -> PostCore<Flagged> {
        let mut core = PostCore::new(Flagged { mill: mill(false, 3, false), caps });
        core.start_loop().unwrap();
        core.start_program().unwrap();
        core
    }

    #[test]
    fn short_program_scenario() {
        let mut core = PostCore::new(mill(false, 3, false));
        let mut out = String::new();
        out += &core.start_loop().unwrap();
        out += &core.start_program().unwrap();
        out += &core.rapid(&["Z"], &[5.0]).unwrap();
        out += &core.rapid(&["X", "Y"], &[0.0, 0.0]).unwrap();
        out += &core.stop_program().unwrap();
        out += &core.stop_loop().unwrap();

        assert_eq!(
            out,
            "%\nG90 G64 G94 G21\nG0 Z5\nG0 X0 Y0\nG0 Z5\nG0 X0 Y0\nM2\n%\n"
        );
        assert_eq!(core.line_count(), 8);
        assert_eq!(core.phase(), Phase::Idle);
    }

    #[test]
    fn program_end_lifts_only_when_below_safe_height() {
        let mut core = in_program(mill(false, 3, false));
        core.linear(&["Z"], &[-2.0]).unwrap();
        assert_eq!(core.stop_program().unwrap(), "G0 Z5\nM2\n");
        assert_eq!(core.position().z, 5.0);
    }

    #[test]
    fn numbering_advances_by_increment() {
        let mut mill = mill(false, 3, true);
        mill.set_property(1, PropertyValue::Int(5)).unwrap();
        let mut core = PostCore::new(mill);
        assert_eq!(core.start_loop().unwrap(), "%\n");
        let out = core.start_program().unwrap();
        assert_eq!(out, "N00010 G90 G64 G94 G21\nN00015 G0 Z5\nN00020 G0 X0 Y0\n");
        assert_eq!(core.current_line(), 20);
    }

    #[test]
    fn externally_numbered_lines_are_left_alone() {
        let mut core = in_program(mill(false, 3, true));
        let before = core.current_line();
        assert_eq!(core.line("N900 M0").unwrap(), "N900 M0\n");
        assert_eq!(core.current_line(), before);
        assert_eq!(core.line("M0\r\nM1").unwrap(), format!("N{:05} M0\nN{:05} M1\n", before + 5, before + 10));
    }

    #[test]
    fn repeated_drilling_suppresses_retract() {
        let mut core = in_program(mill(false, 3, false));
        let first = core.drilling(&["X", "Y", "Z"], &[10.0, 10.0, -5.0], 2.0, 0.0).unwrap();
        let second = core.drilling(&["X", "Y", "Z"], &[20.0, 10.0, -5.0], 2.0, 0.0).unwrap();
        let third = core.drilling(&["X", "Y", "Z"], &[30.0, 10.0, -5.0], 2.0, 1.5).unwrap();
        assert_eq!(first, "G81 G99 X10 Y10 Z-5 R2\n");
        assert_eq!(second, "X20 Y10 Z-5\n");
        assert_eq!(third, "G82 G99 X30 Y10 Z-5 R2 P1.5\n");
        assert_eq!(core.position(), Position::new(30.0, 10.0, -5.0));
    }

    #[test]
    fn feed_is_only_emitted_on_change() {
        let mut core = in_program(mill(true, 3, false));
        assert_eq!(core.feed(0.0).unwrap(), "");
        assert_eq!(core.feed(600.0).unwrap(), "F600\n");
        assert_eq!(core.feed(600.0).unwrap(), "");
        assert_eq!(core.feed(250.5).unwrap(), "F250.5\n");
    }

    #[test]
    fn group_emits_tool_then_speed() {
        let mut core = in_program(mill(false, 3, false));
        assert_eq!(core.start_group("rough", 2, 12000.0).unwrap(), "M6 T2\nS12000\n");
        core.stop_group().unwrap();
        assert_eq!(core.start_group("same tool", 0, 9000.0).unwrap(), "S9000\n");
        core.stop_group().unwrap();
        assert_eq!(core.start_group("no tool", -1, 9000.0).unwrap(), "");
        core.stop_group().unwrap();
        assert_eq!(core.start_group("no speed", 3, 0.0).unwrap(), "M6 T3\n");
    }

    #[test]
    fn cancel_compensation_lifts_and_tracks() {
        let mut core = in_program(mill(false, 3, false));
        core.tool_left_radius_compensation().unwrap();
        core.linear(&["X", "Z"], &[4.0, -1.0]).unwrap();
        assert_eq!(core.tool_cancel_radius_compensation().unwrap(), "G0 Z5\nG40\n");
        assert_eq!(core.position().z, 5.0);
        assert_eq!(core.tool_length_compensation(1).unwrap(), "G43 H1\n");
        assert_eq!(core.tool_cancel_length_compensation().unwrap(), "G49\n");
    }

    #[test]
    fn position_tracking_is_case_insensitive() {
        let mut core = in_program(mill(true, 3, false));
        core.linear(&["x", "y", "z"], &[1.0, 2.0, 3.0]).unwrap();
        core.clockwise(&["X", "I", "J"], &[4.0, 1.0, 1.0]).unwrap();
        assert_eq!(core.position(), Position::new(4.0, 2.0, 3.0));
    }

    #[test]
    fn mismatched_axis_lists_are_rejected() {
        let mut core = in_program(mill(true, 3, false));
        let before = core.position();
        let err = core.linear(&["X", "Y"], &[1.0]).unwrap_err();
        assert_eq!(err, PostError::AxisMismatch { axes: 2, values: 1 });
        assert_eq!(core.position(), before);
    }

    #[test]
    fn motion_outside_program_is_rejected() {
        let mut core = PostCore::new(GenericMill::new());
        assert!(matches!(
            core.rapid(&["X"], &[1.0]),
            Err(PostError::Lifecycle { operation: "rapid", phase: Phase::Idle })
        ));
        core.start_loop().unwrap();
        assert!(core.linear(&NONE, &[]).is_err());
        assert!(core.start_group("g", 1, 0.0).is_err());
        assert!(core.stop_loop().is_ok());
        assert!(core.stop_loop().is_err());
    }

    #[test]
    fn comments_are_counted_but_not_numbered() {
        let mut core = PostCore::new(mill(false, 3, true));
        core.start_loop().unwrap();
        assert_eq!(core.comment("made by post-core").unwrap(), "(made by post-core)\n");
        assert_eq!(core.comment("").unwrap(), "");
        assert_eq!(core.current_line(), 5);
        assert_eq!(core.line_count(), 2);
    }

    #[test]
    fn empty_header_and_footer_are_not_counted() {
        let mut mill = GenericMill::new();
        mill.set_property(6, "".into()).unwrap();
        mill.set_property(7, "".into()).unwrap();
        let mut core = PostCore::new(mill);
        assert_eq!(core.start_loop().unwrap(), "");
        assert_eq!(core.stop_loop().unwrap(), "");
        assert_eq!(core.line_count(), 0);
    }

    #[test]
    fn start_loop_resets_session() {
        let mut core = in_program(mill(true, 3, true));
        core.linear(&["X", "Z"], &[12.0, -3.0]).unwrap();
        core.feed(500.0).unwrap();
        core.stop_program().unwrap();
        core.stop_loop().unwrap();

        core.start_loop().unwrap();
        assert_eq!(core.position(), Position::ORIGIN);
        assert_eq!(core.current_line(), 5);
        assert_eq!(core.line_count(), 1);
        assert_eq!(core.modal(), &ModalState::new());
        core.start_program().unwrap();
        assert_eq!(core.feed(500.0).unwrap(), format!("N{:05}F500\n", core.current_line()));
    }

    #[test]
    fn identical_sessions_are_byte_identical() {
        fn run() -> String {
            let mut core = PostCore::new(mill(false, 4, true));
            let mut out = core.start_loop().unwrap();
            out += &core.start_program().unwrap();
            out += &core.start_group("finish", 1, 18000.0).unwrap();
            out += &core.start_spindle_clockwise().unwrap();
            out += &core.flood().unwrap();
            out += &core.feed(300.0).unwrap();
            out += &core.linear(&["Z"], &[-1.0]).unwrap();
            out += &core.counter_clockwise(&["X", "Y", "I", "J"], &[10.0, 10.0, 5.0, 5.0]).unwrap();
            out += &core.pecking(&["X", "Y", "Z"], &[1.0, 1.0, -8.0], 1.0, 0.5).unwrap();
            out += &core.cancel_canned_cycle().unwrap();
            out += &core.stop_coolant().unwrap();
            out += &core.stop_spindle().unwrap();
            out += &core.stop_group().unwrap();
            out += &core.stop_program().unwrap();
            out += &core.stop_loop().unwrap();
            out
        }
        assert_eq!(run(), run());
    }

    #[test]
    fn rapid_to_emits_changed_axes_only() {
        let mut core = in_program(mill(false, 3, false));
        assert_eq!(core.rapid_to(Position::new(0.0, 0.0, 5.0)).unwrap(), "");
        assert_eq!(core.rapid_to(Position::new(10.0, 0.0, 5.0)).unwrap(), "G0 X10\n");
        assert_eq!(core.linear_to(Position::new(10.0, 4.0, -1.0)).unwrap(), "G1 Y4 Z-1\n");
    }

    #[test]
    fn arc_to_uses_relative_centers() {
        let mut core = in_program(mill(false, 3, false));
        core.linear_to(Position::new(10.0, 0.0, 5.0)).unwrap();
        let out = core
            .arc_to(Position::new(0.0, 10.0, 5.0), (0.0, 0.0), ArcDirection::CounterClockwise)
            .unwrap();
        assert_eq!(out, "G3 X0 Y10 I-10\n");
        assert_eq!(core.position(), Position::new(0.0, 10.0, 5.0));
    }

    #[test]
    fn arc_to_uses_absolute_centers_when_configured() {
        let mut mill = mill(false, 3, false);
        mill.set_property(8, false.into()).unwrap();
        let mut core = in_program(mill);
        core.linear_to(Position::new(10.0, 0.0, 5.0)).unwrap();
        let out = core
            .arc_to(Position::new(0.0, 10.0, 5.0), (0.0, 0.0), ArcDirection::Clockwise)
            .unwrap();
        assert_eq!(out, "G2 X0 Y10 I0 J0\n");
    }

    #[test]
    fn plane_and_pause() {
        let mut core = in_program(mill(false, 3, false));
        assert_eq!(core.plane(Plane::Xz).unwrap(), "G18\n");
        assert_eq!(core.plane(Plane::Xz).unwrap(), "");
        assert_eq!(core.pause(0.5).unwrap(), "G4 P0.5\n");
    }

    #[test]
    fn select_locale_rejects_unknown() {
        let mut core = PostCore::new(GenericMill::new());
        assert_eq!(
            core.select_locale("xx-yy").unwrap_err(),
            PostError::UnsupportedLocale("xx-yy".to_string())
        );
        core.select_locale("es-es").unwrap();
        assert_eq!(core.dialect().locale(), Some(Locale::EsEs));
    }

    #[test]
    fn canned_cycle_depth_is_tracked_for_program_end_lift() {
        let mut core = in_program(mill(false, 3, false));
        core.drilling(&["X", "Y", "Z"], &[1.0, 1.0, -5.0], 2.0, 0.0).unwrap();
        core.cancel_canned_cycle().unwrap();
        assert_eq!(core.stop_program().unwrap(), "G0 Z5\nM2\n");
    }

    #[test]
    fn tool_change_lifts_to_safe_height_first() {
        let mut core = flagged(Capabilities { lift_before_tool_change: true, ..Capabilities::default() });
        assert_eq!(core.start_group("at safe", 1, 0.0).unwrap(), "M6 T1\n");
        core.stop_group().unwrap();

        core.linear(&["Z"], &[-2.0]).unwrap();
        assert_eq!(core.start_group("rough", 2, 0.0).unwrap(), "G0 Z5\nM6 T2\n");
        assert_eq!(core.position().z, 5.0);
        core.stop_group().unwrap();

        core.linear(&["Z"], &[-2.0]).unwrap();
        assert_eq!(core.start_group("keep tool", 0, 0.0).unwrap(), "");
    }

    #[test]
    fn forced_axes_are_passed_to_straight_moves() {
        let mut core = flagged(Capabilities { pass_xy_to_linear: true, ..Capabilities::default() });
        assert_eq!(core.rapid_to(Position::new(0.0, 0.0, 5.0)).unwrap(), "G0 X0 Y0\n");
        assert_eq!(core.linear_to(Position::new(0.0, 0.0, 2.0)).unwrap(), "G1 X0 Y0 Z2\n");

        let mut core = flagged(Capabilities { pass_z_to_linear: true, ..Capabilities::default() });
        assert_eq!(core.rapid_to(Position::new(0.0, 0.0, 5.0)).unwrap(), "G0 Z5\n");
        assert_eq!(core.linear_to(Position::new(3.0, 0.0, 5.0)).unwrap(), "G1 X3 Z5\n");
    }

    #[test]
    fn disabled_z_is_never_emitted() {
        let mut core = flagged(Capabilities {
            disable_z: true,
            pass_z_to_linear: true,
            pass_z_to_arc: true,
            relative_arc_center: true,
            ..Capabilities::default()
        });
        assert_eq!(core.linear_to(Position::new(3.0, 0.0, -2.0)).unwrap(), "G1 X3\n");
        assert_eq!(core.position(), Position::new(3.0, 0.0, 5.0));
        assert_eq!(core.rapid_to(Position::new(3.0, 0.0, -4.0)).unwrap(), "");
        let arc = core
            .arc_to(Position::new(0.0, 3.0, -2.0), (0.0, 0.0), ArcDirection::CounterClockwise)
            .unwrap();
        assert_eq!(arc, "G3 X0 Y3 I-3\n");
    }

    #[test]
    fn forced_axes_are_passed_to_arcs() {
        let mut core = flagged(Capabilities {
            pass_xy_to_arc: true,
            pass_z_to_arc: true,
            relative_arc_center: true,
            ..Capabilities::default()
        });
        let arc = core
            .arc_to(Position::new(0.0, 0.0, 5.0), (5.0, 0.0), ArcDirection::Clockwise)
            .unwrap();
        assert_eq!(arc, "G2 X0 Y0 Z5 I5\n");
    }
}
