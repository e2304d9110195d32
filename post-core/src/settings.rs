//! Typed configuration of the reference mill dialect and the positional
//! property adapter hosts use to read and edit it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PostError, Result};
use crate::locale::Labels;

/// Upper bound on decimal precision; `f64` carries no more useful digits.
pub const MAX_DECIMALS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Millimeter,
    Inch,
}

impl Unit {
    pub fn index(self) -> usize {
        match self {
            Unit::Millimeter => 0,
            Unit::Inch => 1,
        }
    }

    fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Unit::Millimeter),
            1 => Some(Unit::Inch),
            _ => None,
        }
    }
}

/// A property value as it crosses the host boundary.
///
/// Hosts may hand in loosely typed values (a number as text, a flag as 0/1);
/// each slot coerces what it receives into its own type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    /// Selected option index plus the localized option labels.
    Choice { selected: usize, options: Vec<String> },
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Real(r) => write!(f, "{r}"),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Choice { selected, options } => match options.get(*selected) {
                Some(label) => write!(f, "{selected} ({label})"),
                None => write!(f, "{selected}"),
            },
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Real(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Positional slots of the mill property catalog. The order is part of the
/// host protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Numbering,
    Increment,
    Condensed,
    Decimals,
    Extension,
    Comments,
    Header,
    Footer,
    RelativeArcs,
    Unit,
}

impl Property {
    pub const ALL: [Property; 10] = [
        Property::Numbering,
        Property::Increment,
        Property::Condensed,
        Property::Decimals,
        Property::Extension,
        Property::Comments,
        Property::Header,
        Property::Footer,
        Property::RelativeArcs,
        Property::Unit,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or(PostError::PropertyIndex {
            index,
            count: Self::ALL.len(),
        })
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self, labels: &Labels) -> &'static str {
        match self {
            Property::Numbering => labels.numbering,
            Property::Increment => labels.increment,
            Property::Condensed => labels.condensed,
            Property::Decimals => labels.decimals,
            Property::Extension => labels.extension,
            Property::Comments => labels.comments,
            Property::Header => labels.header,
            Property::Footer => labels.footer,
            Property::RelativeArcs => labels.relative_arcs,
            Property::Unit => labels.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MillSettings {
    /// Prefix every line with an `N` sequence number.
    pub numbering: bool,
    pub increment: u32,
    /// Drop the spaces between words.
    pub condensed: bool,
    pub decimals: usize,
    /// Output file extension, without the leading dot.
    pub extension: String,
    pub comments: bool,
    pub header: String,
    pub footer: String,
    /// Arc centers (I, J, K) relative to the start point instead of absolute.
    pub relative_arcs: bool,
    pub unit: Unit,
}

impl Default for MillSettings {
    fn default() -> Self {
        Self {
            numbering: false,
            increment: 5,
            condensed: true,
            decimals: 6,
            extension: "nc".to_string(),
            comments: true,
            header: "%".to_string(),
            footer: "%".to_string(),
            relative_arcs: true,
            unit: Unit::Millimeter,
        }
    }
}

impl MillSettings {
    /// Separator placed between words.
    pub fn separator(&self) -> &'static str {
        if self.condensed { "" } else { " " }
    }

    /// Read a slot. The unit slot lists localized options, so it needs labels.
    pub fn get(&self, property: Property, labels: Option<&Labels>) -> Result<PropertyValue> {
        Ok(match property {
            Property::Numbering => PropertyValue::Bool(self.numbering),
            Property::Increment => PropertyValue::Int(i64::from(self.increment)),
            Property::Condensed => PropertyValue::Bool(self.condensed),
            Property::Decimals => PropertyValue::Int(self.decimals as i64),
            Property::Extension => PropertyValue::Text(self.extension.clone()),
            Property::Comments => PropertyValue::Bool(self.comments),
            Property::Header => PropertyValue::Text(self.header.clone()),
            Property::Footer => PropertyValue::Text(self.footer.clone()),
            Property::RelativeArcs => PropertyValue::Bool(self.relative_arcs),
            Property::Unit => {
                let labels = labels.ok_or(PostError::LocaleNotSelected)?;
                PropertyValue::Choice {
                    selected: self.unit.index(),
                    options: vec![labels.millimeter.to_string(), labels.inch.to_string()],
                }
            }
        })
    }

    /// Write a slot after coercing `value`. On error the slot is unchanged.
    pub fn set(&mut self, property: Property, value: PropertyValue) -> Result<()> {
        let index = property.index();
        match property {
            Property::Numbering => self.numbering = coerce_bool(index, &value)?,
            Property::Increment => {
                let raw = coerce_int(index, &value)?;
                self.increment = u32::try_from(raw)
                    .ok()
                    .filter(|inc| *inc >= 1)
                    .ok_or_else(|| out_of_range(index, raw))?;
            }
            Property::Condensed => self.condensed = coerce_bool(index, &value)?,
            Property::Decimals => {
                let raw = coerce_int(index, &value)?;
                self.decimals = usize::try_from(raw)
                    .ok()
                    .filter(|d| *d <= MAX_DECIMALS)
                    .ok_or_else(|| out_of_range(index, raw))?;
            }
            Property::Extension => {
                let text = coerce_text(index, &value)?;
                self.extension = text.trim().trim_start_matches('.').to_string();
            }
            Property::Comments => self.comments = coerce_bool(index, &value)?,
            Property::Header => self.header = coerce_text(index, &value)?,
            Property::Footer => self.footer = coerce_text(index, &value)?,
            Property::RelativeArcs => self.relative_arcs = coerce_bool(index, &value)?,
            Property::Unit => self.unit = coerce_unit(index, &value)?,
        }
        Ok(())
    }
}

fn coercion(index: usize, expected: &'static str, value: &PropertyValue) -> PostError {
    PostError::Coercion { index, expected, value: value.to_string() }
}

fn out_of_range(index: usize, value: i64) -> PostError {
    PostError::OutOfRange { index, value: value.to_string() }
}

fn coerce_bool(index: usize, value: &PropertyValue) -> Result<bool> {
    match value {
        PropertyValue::Bool(b) => Ok(*b),
        PropertyValue::Int(0) => Ok(false),
        PropertyValue::Int(1) => Ok(true),
        PropertyValue::Real(r) if *r == 0.0 => Ok(false),
        PropertyValue::Real(r) if *r == 1.0 => Ok(true),
        PropertyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(coercion(index, "a boolean", value)),
        },
        _ => Err(coercion(index, "a boolean", value)),
    }
}

fn coerce_int(index: usize, value: &PropertyValue) -> Result<i64> {
    match value {
        PropertyValue::Int(i) => Ok(*i),
        PropertyValue::Real(r) if r.is_finite() && r.fract() == 0.0 => Ok(*r as i64),
        PropertyValue::Text(s) => s.trim().parse::<i64>().map_err(|_| coercion(index, "an integer", value)),
        _ => Err(coercion(index, "an integer", value)),
    }
}

fn coerce_text(index: usize, value: &PropertyValue) -> Result<String> {
    match value {
        PropertyValue::Text(s) => Ok(s.clone()),
        PropertyValue::Int(_) | PropertyValue::Real(_) => Ok(value.to_string()),
        _ => Err(coercion(index, "text", value)),
    }
}

fn coerce_unit(index: usize, value: &PropertyValue) -> Result<Unit> {
    let unit = match value {
        PropertyValue::Int(i) => Unit::from_index(*i),
        PropertyValue::Real(r) if r.fract() == 0.0 => Unit::from_index(*r as i64),
        PropertyValue::Choice { selected, .. } => Unit::from_index(*selected as i64),
        PropertyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "mm" | "millimeter" | "millimetre" => Some(Unit::Millimeter),
            "1" | "in" | "inch" => Some(Unit::Inch),
            _ => None,
        },
        _ => None,
    };
    unit.ok_or_else(|| coercion(index, "a unit (0 = millimeter, 1 = inch)", value))
}
