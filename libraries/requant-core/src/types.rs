//! Mode selectors shared between settings and the engine

use serde::{Deserialize, Serialize};

/// Dither variant added before rounding
///
/// The integer form (`from_index` / `index`) is the host-facing selector:
/// 0 = none, 1 = rectangular, 2 = triangular, 3 = highpass.
///
/// Names are parsed by [`DitherMode::from_str`], so settings files and
/// environment overrides accept any case and the long aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DitherMode {
    /// No dither, plain rounding
    #[default]
    #[serde(rename = "none")]
    None,

    /// Rectangular PDF, uniform in [-0.5, 0.5) LSB
    #[serde(rename = "rect")]
    Rectangular,

    /// Triangular PDF, difference of two uniforms, in (-1, 1) LSB
    #[serde(rename = "tri")]
    Triangular,

    /// First difference of rectangular dither
    ///
    /// Moves dither energy toward high frequencies.
    #[serde(rename = "hp")]
    HighpassRect,
}

impl DitherMode {
    /// Map a host selector to a mode; unknown values fall back to `None`
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Rectangular,
            2 => Self::Triangular,
            3 => Self::HighpassRect,
            _ => Self::None,
        }
    }

    /// Host selector for this mode
    pub fn index(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Rectangular => 1,
            Self::Triangular => 2,
            Self::HighpassRect => 3,
        }
    }

    /// Parse a case-insensitive name or alias
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "rect" | "rectangular" => Some(Self::Rectangular),
            "tri" | "triangular" => Some(Self::Triangular),
            "hp" | "highpass" => Some(Self::HighpassRect),
            _ => None,
        }
    }

    /// Canonical short name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rectangular => "rect",
            Self::Triangular => "tri",
            Self::HighpassRect => "hp",
        }
    }
}

/// How the oversampling loop derives its intra-sample inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Interpolation {
    /// Sub-step `k` sits at `(k + 1) / L` between the previous and current
    /// input, so the last sub-step is the current input itself.
    #[default]
    Linear,

    /// Sub-step `k` uses `k / L`, but the previous input is overwritten
    /// after the first sub-step. Sub-step 0 therefore quantizes the previous
    /// input and every later sub-step the current one.
    Legacy,
}

impl Interpolation {
    /// Parse a case-insensitive name
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Legacy => "legacy",
        }
    }
}

impl TryFrom<String> for Interpolation {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        Self::from_str(&name).ok_or_else(|| format!("unknown interpolation '{}'", name))
    }
}

impl TryFrom<String> for DitherMode {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        Self::from_str(&name).ok_or_else(|| format!("unknown dither mode '{}'", name))
    }
}

/// Longest word length with a normal `f32` step
pub const MAX_WORD_LENGTH: u32 = 32;

/// Quantization step for a signed word of `bits` bits on a [-1, 1) scale
///
/// 16 bits gives 2^-15. `bits` is clamped to `1..=MAX_WORD_LENGTH`, so the
/// step is always a positive power of two.
pub fn step_size_for_word_length(bits: u32) -> f32 {
    let bits = bits.clamp(1, MAX_WORD_LENGTH) as i32;
    2.0_f32.powi(1 - bits)
}
