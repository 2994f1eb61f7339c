// Test utilities and helpers for module tests

#[cfg(test)]
pub mod fixtures {
    //! Test fixtures for common test data

    /// Generate a sample audio buffer with a sine wave at known frequency
    pub fn generate_sine_wave(frequency: f32, sample_rate: f32, duration_secs: f32) -> Vec<f32> {
        let num_samples = (sample_rate * duration_secs) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    /// Generate silent audio buffer
    pub fn generate_silence(sample_rate: f32, duration_secs: f32) -> Vec<f32> {
        vec![0.0; (sample_rate * duration_secs) as usize]
    }

    /// Generate white noise audio buffer
    pub fn generate_white_noise(sample_rate: f32, duration_secs: f32) -> Vec<f32> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let num_samples = (sample_rate * duration_secs) as usize;
        (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// A frequency snapshot whose samples ramp 0, 1, 2, ... across `len`
    pub fn ramp_snapshot(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    /// A frequency snapshot of uniform level
    pub fn flat_snapshot(len: usize, level: u8) -> Vec<u8> {
        vec![level; len]
    }
}

#[cfg(test)]
pub mod mocks {
    //! Mock implementations for testing

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use anyhow::{Result, anyhow};

    use crate::audio::SampleTap;

    /// A scripted audio source: fixed sample content, observable reads,
    /// teardowns, and start failures. Stands in for `MicCapture` so graph
    /// lifetime can be tested without an audio device.
    pub struct ScriptedTap {
        sample_rate: u32,
        samples: Vec<f32>,
        reads: Option<Arc<AtomicUsize>>,
        teardowns: Option<Arc<AtomicUsize>>,
        fail_start: Arc<AtomicBool>,
    }

    impl ScriptedTap {
        /// One second of a sine wave at the given frequency.
        pub fn sine(sample_rate: u32, frequency: f32) -> Self {
            let samples = super::fixtures::generate_sine_wave(frequency, sample_rate as f32, 1.0);
            Self {
                sample_rate,
                samples,
                reads: None,
                teardowns: None,
                fail_start: Arc::new(AtomicBool::new(false)),
            }
        }

        /// A source that has produced no data yet.
        pub fn empty(sample_rate: u32) -> Self {
            Self {
                sample_rate,
                samples: Vec::new(),
                reads: None,
                teardowns: None,
                fail_start: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Count every `read_latest` call into the given counter.
        pub fn counting_reads(mut self, counter: Arc<AtomicUsize>) -> Self {
            self.reads = Some(counter);
            self
        }

        /// Count the drop of this tap into the given counter.
        pub fn counting_teardowns(mut self, counter: Arc<AtomicUsize>) -> Self {
            self.teardowns = Some(counter);
            self
        }

        /// Make `start` fail until the gate is cleared.
        pub fn failing_start(self) -> Self {
            self.fail_start.store(true, Ordering::SeqCst);
            self
        }

        /// Shared flag controlling `start` failures: `true` means fail.
        pub fn start_gate(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.fail_start)
        }
    }

    impl SampleTap for ScriptedTap {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn read_latest(&self, n: usize) -> Vec<f32> {
            if let Some(reads) = &self.reads {
                reads.fetch_add(1, Ordering::SeqCst);
            }
            let n = n.min(self.samples.len());
            self.samples[self.samples.len() - n..].to_vec()
        }

        fn start(&self) -> Result<()> {
            if self.fail_start.load(Ordering::SeqCst) {
                Err(anyhow!("audio start blocked"))
            } else {
                Ok(())
            }
        }
    }

    impl Drop for ScriptedTap {
        fn drop(&mut self) {
            if let Some(teardowns) = &self.teardowns {
                teardowns.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
pub mod assertions {
    //! Custom assertions for testing

    /// Assert two float slices are approximately equal within epsilon
    pub fn assert_float_slice_approx_eq(actual: &[f32], expected: &[f32], epsilon: f32) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "Slices have different lengths"
        );
        for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert!(
                (a - e).abs() < epsilon,
                "Values differ at index {}: {} vs {} (epsilon: {})",
                i,
                a,
                e,
                epsilon
            );
        }
    }

    /// Assert every value of a bar frame lies in 0.0..=1.0
    pub fn assert_bar_values_bounded(values: &[f32]) {
        for (i, v) in values.iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(v),
                "Value out of bounds at index {}: {}",
                i,
                v
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::audio::SampleTap;

    #[test]
    fn test_generate_sine_wave() {
        let samples = fixtures::generate_sine_wave(440.0, 16000.0, 0.1);
        assert_eq!(samples.len(), 1600); // 0.1 sec * 16000 Hz
        // Verify it's not silence
        assert!(samples.iter().any(|&s| s.abs() > 0.1));
    }

    #[test]
    fn test_generate_silence() {
        let samples = fixtures::generate_silence(16000.0, 0.1);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_ramp_snapshot_wraps_at_byte_range() {
        let data = fixtures::ramp_snapshot(300);
        assert_eq!(data[0], 0);
        assert_eq!(data[255], 255);
        assert_eq!(data[256], 0);
    }

    #[test]
    fn test_scripted_tap_reads_and_teardowns() {
        let reads = Arc::new(AtomicUsize::new(0));
        let teardowns = Arc::new(AtomicUsize::new(0));
        {
            let tap = mocks::ScriptedTap::sine(16_000, 440.0)
                .counting_reads(Arc::clone(&reads))
                .counting_teardowns(Arc::clone(&teardowns));
            let chunk = tap.read_latest(512);
            assert_eq!(chunk.len(), 512);
            assert_eq!(reads.load(Ordering::SeqCst), 1);
            assert_eq!(teardowns.load(Ordering::SeqCst), 0);
        }
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scripted_tap_start_gate() {
        let tap = mocks::ScriptedTap::sine(16_000, 440.0).failing_start();
        assert!(tap.start().is_err());
        tap.start_gate().store(false, Ordering::SeqCst);
        assert!(tap.start().is_ok());
    }

    #[test]
    fn test_float_slice_approx_eq() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0001, 2.0001, 3.0001];
        assertions::assert_float_slice_approx_eq(&a, &b, 0.001);
    }

    #[test]
    #[should_panic(expected = "Values differ")]
    fn test_float_slice_approx_eq_fails() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.1, 3.0];
        assertions::assert_float_slice_approx_eq(&a, &b, 0.01);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_bar_values_bounded_fails() {
        assertions::assert_bar_values_bounded(&[0.5, 1.2]);
    }
}
