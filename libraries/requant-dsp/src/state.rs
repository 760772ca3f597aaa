//! Per-channel requantizer memory
//!
//! Each channel carries what the per-sample loop needs to stay continuous
//! across blocks. The arena is indexed densely by channel number and only
//! ever grows: a channel seen once keeps its state for the engine's life.

use tracing::debug;

/// Causal memory of one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    /// Last raw input sample (oversampling interpolation start point)
    pub previous_input: f32,
    /// Last rectangular draw of the highpass dither
    pub previous_dither: f32,
    /// Past quantization errors, most recent first
    pub error_history: Vec<f32>,
}

impl ChannelState {
    /// Match the error history to a filter order
    ///
    /// Growing zero-fills the tail, shrinking drops the oldest errors.
    pub fn resize_history(&mut self, order: usize) {
        self.error_history.resize(order, 0.0);
    }

    /// Zero all memory, keeping the history length
    pub fn clear(&mut self) {
        self.previous_input = 0.0;
        self.previous_dither = 0.0;
        self.error_history.fill(0.0);
    }
}

/// Dense, grow-only arena of channel states
#[derive(Debug, Clone, Default)]
pub struct ChannelStates {
    states: Vec<ChannelState>,
}

impl ChannelStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state for `channel`, allocating it (and any lower missing
    /// channels) on first use
    pub fn ensure(&mut self, channel: usize) -> &mut ChannelState {
        if channel >= self.states.len() {
            debug!(
                "Allocating requantizer state for channels {}..={}",
                self.states.len(),
                channel
            );
            self.states.resize_with(channel + 1, ChannelState::default);
        }
        &mut self.states[channel]
    }

    pub fn get(&self, channel: usize) -> Option<&ChannelState> {
        self.states.get(channel)
    }

    /// Number of channels with allocated state
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Zero every channel's memory without dropping any entry
    pub fn clear_all(&mut self) {
        for state in &mut self.states {
            state.clear();
        }
    }
}
