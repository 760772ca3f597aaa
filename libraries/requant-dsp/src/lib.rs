//! Requant DSP
//!
//! Reduces the effective bit depth of floating-point audio while keeping the
//! quantization error as inaudible as possible.
//!
//! This crate provides:
//! - Dither generators (rectangular, triangular, highpass)
//! - Error-feedback noise shaping with fixed filters of order 1, 2, 3, 5 and 9
//! - Oversampled requantization, averaged back to the input rate
//! - Per-channel state so blocks of one channel stay continuous
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────┐
//! input ──►(+)─┤ interpolate  ├──►(-)──►(+)──► round to q ──┬──► avg ──► output
//!              └──────────────┘    ▲     ▲                   │
//!                                  │   dither                │
//!                            ┌─────┴──────┐                  │
//!                            │ FIR shaper │◄── out - xr ─────┘
//!                            └────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use requant_dsp::{DitherMode, Requantizer};
//!
//! let mut requantizer = Requantizer::seeded(1);
//! requantizer.set_word_length(8);
//! requantizer.set_dither_mode(DitherMode::Triangular);
//! requantizer.set_noise_shape_order(2);
//!
//! // Interleaved stereo
//! let mut buffer = vec![0.3_f32; 1024];
//! requantizer.process_interleaved(&mut buffer, 2).unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod dither;
mod noise_shaper;
mod requantizer;
mod state;

pub use noise_shaper::{NoiseShapeOrder, NoiseShaper};
pub use requantizer::{Requantizer, DEFAULT_STEP_SIZE};
pub use state::{ChannelState, ChannelStates};

pub use requant_core::{
    step_size_for_word_length, DitherMode, Interpolation, RequantError, RequantSettings, Result,
};
