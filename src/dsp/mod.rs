/// Digital Signal Processing (DSP) module.
///
/// This module provides the stateful building blocks of the streaming
/// pipeline, each operating on planar multi-channel sample buffers:
///
/// # Modules
/// - `biquad`: Butterworth low-pass design and the per-channel DF2T cascade.
/// - `smoother`: centered moving average with a prefix-sum scratchpad.
/// - `decimator`: integer-factor time averaging with a carry-over tail.
/// - `ratio`: log-ratio lanes over sensor/standard channel quads.
/// - `ychain`: the cascaded rational/polynomial correction stages.
pub mod biquad;
pub mod decimator;
pub mod ratio;
pub mod smoother;
pub mod ychain;
