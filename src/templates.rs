//! Label Presets - the two fixed physical formats
//!
//! Only these two formats exist. A preset is a fixed configuration, selected
//! by size tag; the renderer is the same function for both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::print::LAYOUT_PPI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSize {
    /// Outer box label, 6" x 3.23"
    #[default]
    Outer,
    /// Inner reel label, 3.1" x 1.6"
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelType {
    /// Carries the revision / num block
    #[default]
    Substrate,
    NonSubstrate,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown label size '{0}', expected 'outer' or 'inner'")]
pub struct UnknownSize(pub String);

impl FromStr for LabelSize {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outer" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            _ => Err(UnknownSize(s.to_string())),
        }
    }
}

impl fmt::Display for LabelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outer => f.write_str("outer"),
            Self::Inner => f.write_str("inner"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPreset {
    pub size: LabelSize,
    pub width_in: f64,
    pub height_in: f64,
    pub width_px: u32,
    pub height_px: u32,
    pub border_px: u32,
    pub padding_px: u32,
}

impl LabelPreset {
    fn new(
        size: LabelSize,
        width_in: f64,
        height_in: f64,
        border_px: u32,
        padding_px: u32,
    ) -> Self {
        Self {
            size,
            width_in,
            height_in,
            width_px: inches_to_px(width_in),
            height_px: inches_to_px(height_in),
            border_px,
            padding_px,
        }
    }

    pub fn for_size(size: LabelSize) -> Self {
        match size {
            LabelSize::Outer => Self::new(size, 6.0, 3.23, 2, 8),
            LabelSize::Inner => Self::new(size, 3.1, 1.6, 1, 4),
        }
    }
}

/// Nearest whole layout pixel for a physical length.
fn inches_to_px(inches: f64) -> u32 {
    (inches * f64::from(LAYOUT_PPI)).round() as u32
}
