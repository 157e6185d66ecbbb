//! Background colours.

use crate::error::{Result, TransformerError};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::fmt;

/// RGBA colour as the remote service expects it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    /// Red, 0-255
    pub r: u8,
    /// Green, 0-255
    pub g: u8,
    /// Blue, 0-255
    pub b: u8,
    /// Opacity, 0.0-1.0
    #[serde(serialize_with = "serialize_alpha")]
    pub alpha: f64,
}

/// Closed table of named colours
const NAMED_COLORS: &[(&str, Color)] = &[
    ("white", Color::rgb(255, 255, 255)),
    ("black", Color::rgb(0, 0, 0)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("transparent", Color { r: 0, g: 0, b: 0, alpha: 0.0 }),
];

impl Color {
    /// Opaque colour
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    /// Colour with explicit opacity; `alpha` must lie in 0.0..=1.0
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Result<Self> {
        Self { r, g, b, alpha }.validate()
    }

    /// Check the alpha range of a colour built from its fields
    pub fn validate(self) -> Result<Self> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(TransformerError::argument(format!(
                "alpha must be between 0.0 and 1.0, got {}",
                self.alpha
            )));
        }
        Ok(self)
    }

    /// Look up a named colour, ignoring ASCII case
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, color)| *color)
    }

    /// Names accepted by [`Color::named`]
    pub fn names() -> impl Iterator<Item = &'static str> {
        NAMED_COLORS.iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
    }
}

/// Whole alphas go out as integers (`1`, not `1.0`) so payloads stay
/// byte-identical to what the service has already cached.
fn serialize_alpha<S: Serializer>(alpha: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if !(0.0..=1.0).contains(alpha) {
        return Err(S::Error::custom(format!("alpha {alpha} outside 0.0..=1.0")));
    }
    if alpha.fract() == 0.0 {
        serializer.serialize_u8(*alpha as u8)
    } else {
        serializer.serialize_f64(*alpha)
    }
}

/// A colour as a caller supplies it: by name or by value
#[derive(Debug, Clone, PartialEq)]
pub enum ColorRef {
    /// Entry in the named colour table
    Named(String),
    /// Explicit RGBA value
    Rgba(Color),
}

impl ColorRef {
    /// Resolve to a concrete colour
    pub fn resolve(&self) -> Result<Color> {
        match self {
            Self::Rgba(color) => color.validate(),
            Self::Named(name) => Color::named(name).ok_or_else(|| {
                TransformerError::argument(format!(
                    "unknown color {name:?}, expected one of: {}",
                    Color::names().collect::<Vec<_>>().join(", ")
                ))
            }),
        }
    }
}

impl From<&str> for ColorRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ColorRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Color> for ColorRef {
    fn from(color: Color) -> Self {
        Self::Rgba(color)
    }
}
