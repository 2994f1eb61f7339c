// Ripple — Audio-reactive bar visualizer engine
//
// Turns live microphone audio, an externally supplied frequency feed, or a
// conversational visual state into a continuously updating set of bar
// heights and colors. The `ripple` binary wraps this in an interactive TUI.

pub mod analysis;
pub mod animator;
pub mod audio;
pub mod bands;
pub mod config;
pub mod sampler;
pub mod state;
pub mod viz;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod test_utils;

pub use analysis::{AnalyserOptions, SpectrumAnalyser};
pub use animator::BarAnimator;
pub use audio::{MicCapture, RingBuffer, SampleTap};
pub use config::RippleConfig;
pub use sampler::{ExternalFeed, ExternalSampler, FrequencySnapshot, MediaSampler};
pub use state::{ActivityProfile, ColorRamp, Rgb, VisualState};
pub use viz::{BarFrame, BarVisualizer, BarWidget, VisualizerOptions};
