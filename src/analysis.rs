// Analysis Module - Windowed FFT spectrum analyser with temporal smoothing
//
// The one place where smoothing state lives: per-bin exponential smoothing
// over successive spectra. Blackman window, magnitude spectrum, decibel
// mapping onto the 0..=255 byte range.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Attach-time configuration for the spectrum analyser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserOptions {
    /// FFT window size in samples. Must be a power of two, at least 32.
    pub fft_size: usize,
    /// Exponential smoothing factor in 0.0..=1.0: 0 tracks each spectrum
    /// instantaneously, 1 freezes the first one.
    pub smoothing_time_constant: f32,
    /// Decibel value mapped to byte 0.
    pub min_decibels: f32,
    /// Decibel value mapped to byte 255.
    pub max_decibels: f32,
    /// Minimum milliseconds between accepted snapshots.
    pub update_interval_ms: f64,
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.7,
            min_decibels: -95.0,
            max_decibels: -10.0,
            update_interval_ms: 32.0,
        }
    }
}

/// Blackman window coefficients for a given size.
fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / n;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        })
        .collect()
}

/// Computes byte frequency spectra from rolling time-domain sample windows.
pub struct SpectrumAnalyser {
    options: AnalyserOptions,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Smoothed linear magnitudes, one per frequency bin.
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyser {
    pub fn new(options: AnalyserOptions) -> Self {
        assert!(
            options.fft_size >= 32 && options.fft_size.is_power_of_two(),
            "fft_size must be a power of two, at least 32"
        );
        assert!(
            (0.0..=1.0).contains(&options.smoothing_time_constant),
            "smoothing_time_constant must be in 0..=1"
        );
        assert!(
            options.min_decibels < options.max_decibels,
            "min_decibels must be below max_decibels"
        );
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(options.fft_size);
        Self {
            options,
            fft,
            window: blackman_window(options.fft_size),
            smoothed: vec![0.0; options.fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); options.fft_size],
        }
    }

    pub fn options(&self) -> &AnalyserOptions {
        &self.options
    }

    /// Number of frequency bins in each output spectrum.
    pub fn bin_count(&self) -> usize {
        self.options.fft_size / 2
    }

    /// Frequency span in Hz represented by one bin, for a given sample rate.
    pub fn bin_width(&self, sample_rate: u32) -> f32 {
        (sample_rate as f32 / 2.0) / self.bin_count() as f32
    }

    /// Forget all smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Analyse the most recent `fft_size` samples of `samples` (zero-padded
    /// on the left when fewer are available) and return the byte spectrum,
    /// low frequency first.
    pub fn process(&mut self, samples: &[f32]) -> Vec<u8> {
        let size = self.options.fft_size;
        let tail = if samples.len() > size {
            &samples[samples.len() - size..]
        } else {
            samples
        };
        let pad = size - tail.len();

        for slot in self.scratch[..pad].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }
        for (i, &sample) in tail.iter().enumerate() {
            self.scratch[pad + i] = Complex::new(sample * self.window[pad + i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.options.smoothing_time_constant;
        let scale = 1.0 / size as f32;
        let min_db = self.options.min_decibels;
        let db_range = self.options.max_decibels - self.options.min_decibels;

        let mut out = Vec::with_capacity(self.smoothed.len());
        for (bin, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            let db = 20.0 * smoothed.log10();
            let scaled = 255.0 * (db - min_db) / db_range;
            out.push(scaled.clamp(0.0, 255.0).floor() as u8);
        }
        out
    }
}
