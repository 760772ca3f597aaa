//! Engine settings

use crate::error::{RequantError, Result};
use crate::types::{step_size_for_word_length, DitherMode, Interpolation, MAX_WORD_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment prefix for overrides (`REQUANT_STEP_SIZE`, `REQUANT_DITHER`, ...)
pub const ENV_PREFIX: &str = "REQUANT";

/// Everything a host can configure on a requantizer
///
/// Values are carried verbatim; `validate` is the only place that judges
/// them. The engine itself accepts whatever it is given.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RequantSettings {
    /// Quantization step (q)
    #[serde(default = "default_step_size")]
    pub step_size: f32,

    /// Target word length in bits; overrides `step_size` when set
    #[serde(default)]
    pub word_length: Option<u32>,

    /// Intra-sample sub-steps averaged per output sample (L)
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: usize,

    #[serde(default)]
    pub dither: DitherMode,

    /// Noise-shaping filter order (0, 1, 2, 3, 5 or 9; anything else disables)
    #[serde(default)]
    pub noise_shape_order: usize,

    #[serde(default)]
    pub interpolation: Interpolation,
}

impl RequantSettings {
    /// Load settings from an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path.to_path_buf()).format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse settings from an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Step size the engine should use
    ///
    /// An out-of-range `word_length` is clamped here and rejected by `validate`.
    pub fn effective_step_size(&self) -> f32 {
        match self.word_length {
            Some(bits) => step_size_for_word_length(bits),
            None => self.step_size,
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if let Some(bits) = self.word_length {
            if !(1..=MAX_WORD_LENGTH).contains(&bits) {
                return Err(RequantError::invalid_setting(format!(
                    "word_length must be between 1 and {}, got {}",
                    MAX_WORD_LENGTH, bits
                )));
            }
        } else if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(RequantError::invalid_setting(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }

        if self.oversample_factor == 0 {
            return Err(RequantError::invalid_setting(
                "oversample_factor must be at least 1",
            ));
        }

        Ok(())
    }
}

// Default values
fn default_step_size() -> f32 {
    0.25
}

fn default_oversample_factor() -> usize {
    1
}

impl Default for RequantSettings {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            word_length: None,
            oversample_factor: default_oversample_factor(),
            dither: DitherMode::default(),
            noise_shape_order: 0,
            interpolation: Interpolation::default(),
        }
    }
}
