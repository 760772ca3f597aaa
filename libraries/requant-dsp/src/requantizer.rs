//! Block-processing requantizer
//!
//! Rounds each sample to a grid of `step_size`, with dither added before
//! rounding and past rounding errors fed back through the noise shaper.
//! With an oversampling factor `L > 1` every input sample is requantized `L`
//! times at interpolated positions and the `L` results are averaged.
//!
//! # Per-sample loop
//!
//! ```text
//! for k in 0..L:
//!     x      = interpolate(previous_input, input, k)
//!     xr     = x - Σ c[i] * history[i]
//!     out_k  = q * round(xr / q + dither())
//!     history.push_front(out_k - xr)
//! output = Σ out_k / L
//! ```

use crate::dither;
use crate::noise_shaper::{NoiseShapeOrder, NoiseShaper};
use crate::state::{ChannelState, ChannelStates};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use requant_core::{
    step_size_for_word_length, DitherMode, Interpolation, RequantError, RequantSettings, Result,
};
use tracing::{debug, warn};

/// Default quantization step (a 3-bit word)
pub const DEFAULT_STEP_SIZE: f32 = 0.25;

/// Noise-shaped, dithered requantizer
///
/// Parameters are global to the engine and take effect on the next processed
/// sample. Channel state is created on first use of a channel index and kept
/// for the engine's lifetime.
///
/// The random source is owned by the engine. Use [`Requantizer::seeded`] or
/// [`Requantizer::with_rng`] for reproducible dither.
///
/// # Example
///
/// ```rust
/// use requant_dsp::{DitherMode, Requantizer};
///
/// let mut requantizer = Requantizer::seeded(7);
/// requantizer.set_word_length(16);
/// requantizer.set_dither_mode(DitherMode::Triangular);
/// requantizer.set_noise_shape_order(5);
/// requantizer.set_oversample_factor(4);
///
/// // Host writes into the engine-owned buffer, processes, reads back
/// let buffer = requantizer.work_buffer(256);
/// for (i, sample) in buffer.iter_mut().enumerate() {
///     *sample = (i as f32 * 0.05).sin() * 0.5;
/// }
/// requantizer.process_block(0, 256).unwrap();
/// ```
pub struct Requantizer<R = StdRng> {
    /// Quantization step (q)
    step_size: f32,
    /// Sub-steps per output sample (L)
    oversample_factor: usize,
    dither: DitherMode,
    shaper: NoiseShaper,
    interpolation: Interpolation,
    states: ChannelStates,
    /// Engine-owned host buffer, grown never shrunk
    work_buffer: Vec<f32>,
    rng: R,
}

/// Parameters that stay fixed for the length of one block
#[derive(Debug, Clone, Copy)]
struct BlockParams {
    step_size: f32,
    oversample_factor: usize,
    interpolation: Interpolation,
    shaper: NoiseShaper,
}

impl Requantizer<StdRng> {
    /// Create a requantizer with an entropy-seeded random source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a requantizer with a deterministic random source
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create a requantizer configured from settings
    pub fn from_settings(settings: &RequantSettings) -> Self {
        let mut requantizer = Self::new();
        requantizer.apply_settings(settings);
        requantizer
    }
}

impl Default for Requantizer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Requantizer<R> {
    /// Create a requantizer drawing dither from `rng`
    ///
    /// Defaults: step 0.25, no oversampling, no dither, no shaping.
    pub fn with_rng(rng: R) -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
            oversample_factor: 1,
            dither: DitherMode::None,
            shaper: NoiseShaper::default(),
            interpolation: Interpolation::default(),
            states: ChannelStates::new(),
            work_buffer: Vec::new(),
            rng,
        }
    }

    /// Apply every field of `settings`
    pub fn apply_settings(&mut self, settings: &RequantSettings) {
        self.set_step_size(settings.effective_step_size());
        self.set_oversample_factor(settings.oversample_factor);
        self.set_dither_mode(settings.dither);
        self.set_noise_shape_order(settings.noise_shape_order);
        self.set_interpolation(settings.interpolation);
    }

    /// Set the quantization step
    ///
    /// Stored verbatim. Zero or negative steps are not meaningful.
    pub fn set_step_size(&mut self, step_size: f32) {
        debug!("Requantizer step size set to {}", step_size);
        self.step_size = step_size;
    }

    /// Set the quantization step for a signed word of `bits` bits
    ///
    /// `bits` is clamped to `1..=MAX_WORD_LENGTH`.
    pub fn set_word_length(&mut self, bits: u32) {
        self.set_step_size(step_size_for_word_length(bits));
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Set the oversampling factor
    ///
    /// Stored verbatim; 1 disables oversampling. A factor of 0 is a caller
    /// error and is processed as 1.
    pub fn set_oversample_factor(&mut self, factor: usize) {
        debug!("Requantizer oversampling factor set to {}", factor);
        self.oversample_factor = factor;
    }

    pub fn oversample_factor(&self) -> usize {
        self.oversample_factor
    }

    pub fn set_dither_mode(&mut self, mode: DitherMode) {
        debug!("Requantizer dither set to {}", mode.as_str());
        self.dither = mode;
    }

    /// Select dither by host index (1 rect, 2 tri, 3 highpass, else none)
    pub fn set_dither_index(&mut self, index: i32) {
        let mode = DitherMode::from_index(index);
        if mode == DitherMode::None && index != 0 {
            warn!("Unknown dither selector {}, dither disabled", index);
        }
        self.set_dither_mode(mode);
    }

    pub fn dither_mode(&self) -> DitherMode {
        self.dither
    }

    pub fn dither_index(&self) -> i32 {
        self.dither.index()
    }

    /// Select the noise-shaping filter by order
    ///
    /// Supported orders are 0, 1, 2, 3, 5 and 9. Anything else disables
    /// shaping and reads back as order 0.
    pub fn set_noise_shape_order(&mut self, order: usize) {
        self.shaper = NoiseShaper::from_order(order);
        debug!(
            "Requantizer noise shaping order set to {}",
            self.shaper.order().order()
        );
    }

    /// Active noise-shaping order (0 when disabled)
    pub fn noise_shape_order(&self) -> usize {
        self.shaper.order().order()
    }

    pub fn noise_shape(&self) -> NoiseShapeOrder {
        self.shaper.order()
    }

    /// Active noise-shaping coefficients, most recent error first
    pub fn noise_shape_coefficients(&self) -> &'static [f32] {
        self.shaper.coefficients()
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        debug!(
            "Requantizer interpolation set to {}",
            interpolation.as_str()
        );
        self.interpolation = interpolation;
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Get the engine-owned working buffer, at least `size` samples long
    ///
    /// The buffer grows to the largest size requested and never shrinks.
    /// Contents carry over between calls.
    pub fn work_buffer(&mut self, size: usize) -> &mut [f32] {
        if self.work_buffer.len() < size {
            debug!(
                "Growing requantizer work buffer from {} to {} samples",
                self.work_buffer.len(),
                size
            );
            self.work_buffer.resize(size, 0.0);
        }
        &mut self.work_buffer[..size]
    }

    /// Current working buffer length
    pub fn work_buffer_len(&self) -> usize {
        self.work_buffer.len()
    }

    /// Get the state for `channel`, creating it if needed
    pub fn ensure_channel(&mut self, channel: usize) -> &mut ChannelState {
        self.states.ensure(channel)
    }

    pub fn channel_state(&self, channel: usize) -> Option<&ChannelState> {
        self.states.get(channel)
    }

    /// Number of channels with allocated state
    pub fn channel_count(&self) -> usize {
        self.states.len()
    }

    /// Requantize the first `size` samples of the working buffer in place
    ///
    /// `channel` selects the state to continue from; unseen channels are
    /// allocated. Fails if `size` exceeds the working buffer.
    pub fn process_block(&mut self, channel: usize, size: usize) -> Result<()> {
        let capacity = self.work_buffer.len();
        if size > capacity {
            return Err(RequantError::BlockTooLarge {
                requested: size,
                capacity,
            });
        }

        let params = self.block_params();
        let state = self.states.ensure(channel);
        run_block(
            &mut self.work_buffer[..size],
            state,
            &params,
            self.dither,
            &mut self.rng,
        );
        Ok(())
    }

    /// Requantize a caller-owned buffer of one channel in place
    pub fn process(&mut self, channel: usize, samples: &mut [f32]) {
        let params = self.block_params();
        let state = self.states.ensure(channel);
        run_block(samples, state, &params, self.dither, &mut self.rng);
    }

    /// Requantize an interleaved buffer (L, R, L, R, ...) in place
    ///
    /// Channel `c` of the buffer uses engine channel `c`. Channels are
    /// processed one after another, so dither draws are consumed in the same
    /// order as separate per-channel `process` calls.
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channels: usize) -> Result<()> {
        if channels == 0 {
            return Err(RequantError::InvalidChannelCount(channels));
        }
        if buffer.len() % channels != 0 {
            return Err(RequantError::MisalignedBuffer {
                len: buffer.len(),
                channels,
            });
        }

        let params = self.block_params();
        for channel in 0..channels {
            let state = self.states.ensure(channel);
            run_block(
                buffer.iter_mut().skip(channel).step_by(channels),
                state,
                &params,
                self.dither,
                &mut self.rng,
            );
        }
        Ok(())
    }

    /// Zero every channel's memory (e.g. on seek)
    ///
    /// Channels stay allocated; parameters and the working buffer are kept.
    pub fn reset(&mut self) {
        self.states.clear_all();
    }

    fn block_params(&self) -> BlockParams {
        BlockParams {
            step_size: self.step_size,
            oversample_factor: self.oversample_factor.max(1),
            interpolation: self.interpolation,
            shaper: self.shaper,
        }
    }
}

/// Prepare the channel and pick the dither generator once for the block
fn run_block<'a, R, I>(
    samples: I,
    state: &mut ChannelState,
    params: &BlockParams,
    mode: DitherMode,
    rng: &mut R,
) where
    R: Rng,
    I: IntoIterator<Item = &'a mut f32>,
{
    state.resize_history(params.shaper.order().order());

    match mode {
        DitherMode::None => run_with(samples, state, params, rng, dither::none::<R>),
        DitherMode::Rectangular => run_with(samples, state, params, rng, dither::rectangular::<R>),
        DitherMode::Triangular => run_with(samples, state, params, rng, dither::triangular::<R>),
        DitherMode::HighpassRect => run_with(samples, state, params, rng, dither::highpass::<R>),
    }
}

fn run_with<'a, R, I, F>(
    samples: I,
    state: &mut ChannelState,
    params: &BlockParams,
    rng: &mut R,
    mut dither: F,
) where
    R: Rng,
    I: IntoIterator<Item = &'a mut f32>,
    F: FnMut(&mut f32, &mut R) -> f32,
{
    for sample in samples {
        *sample = requantize_sample(*sample, state, params, rng, &mut dither);
    }
}

#[inline]
fn requantize_sample<R, F>(
    input: f32,
    state: &mut ChannelState,
    params: &BlockParams,
    rng: &mut R,
    dither: &mut F,
) -> f32
where
    F: FnMut(&mut f32, &mut R) -> f32,
{
    let q = params.step_size;
    let l = params.oversample_factor;
    let start = state.previous_input;
    let mut sum = 0.0_f32;

    for k in 0..l {
        let x = match params.interpolation {
            // Distance back from the current input, exact at k = L - 1
            Interpolation::Linear => input - (input - start) * ((l - 1 - k) as f32 / l as f32),
            Interpolation::Legacy => {
                let x = (input - state.previous_input) * k as f32 / l as f32
                    + state.previous_input;
                state.previous_input = input;
                x
            }
        };

        let xr = params.shaper.shape(x, &state.error_history);
        let d = dither(&mut state.previous_dither, rng);
        let out = q * (xr / q + d).round();
        NoiseShaper::push_error(&mut state.error_history, out - xr);

        sum += out;
    }

    // Legacy already stored it after sub-step 0; both modes end here
    state.previous_input = input;
    sum / l as f32
}
