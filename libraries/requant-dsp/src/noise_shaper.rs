//! Error-feedback noise shaper
//!
//! Feeds past quantization errors back through a short FIR filter so that
//! the requantization noise is pushed out of the most audible band.
//!
//! The filters are fixed, empirically tuned tables. Each supported order
//! has exactly one coefficient vector; nothing is fitted at runtime.

use tracing::warn;

const ORDER_1: [f32; 1] = [1.0];
const ORDER_2: [f32; 2] = [2.0, -1.0];
const ORDER_3: [f32; 3] = [1.623, -0.982, 0.109];
const ORDER_5: [f32; 5] = [2.033, -2.165, 1.959, -1.590, 0.6149];
const ORDER_9: [f32; 9] = [
    2.412, -3.370, 3.937, -4.174, 3.353, -2.205, 1.281, -0.569, 0.0847,
];

/// Noise shaper order (filter length)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseShapeOrder {
    /// No shaping, plain requantization
    #[default]
    Off,

    /// First order: the previous error, fed straight back
    First,

    /// Second order: (1 - z^-1)^2 noise transfer
    Second,

    /// Third order
    Third,

    /// Fifth order
    Fifth,

    /// Ninth order: steepest shaping, most noise above the audible band
    Ninth,
}

impl NoiseShapeOrder {
    /// Map a requested filter order to a supported one
    ///
    /// Returns `None` for orders without a table.
    pub fn from_order(order: usize) -> Option<Self> {
        match order {
            0 => Some(Self::Off),
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            5 => Some(Self::Fifth),
            9 => Some(Self::Ninth),
            _ => None,
        }
    }

    /// Get the filter order (number of taps)
    pub fn order(&self) -> usize {
        self.coefficients().len()
    }

    /// Fixed coefficient table for this order, most recent error first
    pub fn coefficients(&self) -> &'static [f32] {
        match self {
            Self::Off => &[],
            Self::First => &ORDER_1,
            Self::Second => &ORDER_2,
            Self::Third => &ORDER_3,
            Self::Fifth => &ORDER_5,
            Self::Ninth => &ORDER_9,
        }
    }
}

/// FIR error-feedback filter
///
/// Holds only the coefficient selection. The error history it runs over
/// lives in each channel's state so that channels never share memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseShaper {
    order: NoiseShapeOrder,
}

impl NoiseShaper {
    /// Create a noise shaper for a supported order
    pub fn new(order: NoiseShapeOrder) -> Self {
        Self { order }
    }

    /// Create a noise shaper from a raw order; unsupported orders disable shaping
    pub fn from_order(order: usize) -> Self {
        let order = NoiseShapeOrder::from_order(order).unwrap_or_else(|| {
            warn!(
                "Unsupported noise shaping order {}, disabling noise shaping",
                order
            );
            NoiseShapeOrder::Off
        });
        Self { order }
    }

    /// Get the noise shaper order
    pub fn order(&self) -> NoiseShapeOrder {
        self.order
    }

    /// Get the active coefficients
    pub fn coefficients(&self) -> &'static [f32] {
        self.order.coefficients()
    }

    /// Subtract the predicted error from `input`
    ///
    /// `history` holds past errors (output - shaped input), most recent first,
    /// and must be as long as the filter.
    #[inline]
    pub fn shape(&self, input: f32, history: &[f32]) -> f32 {
        let mut x = input;
        for (c, e) in self.coefficients().iter().zip(history) {
            x -= c * e;
        }
        x
    }

    /// Push a new error to the front of `history`, dropping the oldest
    ///
    /// No-op for an empty history.
    #[inline]
    pub fn push_error(history: &mut [f32], error: f32) {
        let len = history.len();
        if len == 0 {
            return;
        }
        history.copy_within(0..len - 1, 1);
        history[0] = error;
    }
}
