//! Requant Core
//!
//! Platform-agnostic types, settings and error handling shared by the
//! requantization engine and whatever host drives it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Modes**: `DitherMode` and `Interpolation`
//! - **Settings**: `RequantSettings`, loadable from TOML and environment
//! - **Error Handling**: Unified `RequantError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use requant_core::{DitherMode, RequantSettings};
//!
//! let settings = RequantSettings::from_toml_str(
//!     r#"
//!     word_length = 16
//!     dither = "tri"
//!     noise_shape_order = 5
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.dither, DitherMode::Triangular);
//! assert_eq!(settings.effective_step_size(), 2.0_f32.powi(-15));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use error::{RequantError, Result};
pub use settings::RequantSettings;
pub use types::{step_size_for_word_length, DitherMode, Interpolation, MAX_WORD_LENGTH};
