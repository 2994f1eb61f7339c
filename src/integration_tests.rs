// Integration Tests - Full pipeline behavior across modules

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::analysis::AnalyserOptions;
    use crate::bands;
    use crate::sampler::{ExternalFeed, MediaSampler};
    use crate::state::VisualState;
    use crate::test_utils::assertions::assert_bar_values_bounded;
    use crate::test_utils::mocks::ScriptedTap;
    use crate::viz::{BarVisualizer, VisualizerOptions};

    // ===== Capture -> Analysis -> Bands Pipeline =====

    #[test]
    fn test_sine_capture_reduces_to_low_band_energy() {
        // A 440 Hz tone at 16 kHz: the analyser snapshot must carry signal,
        // and after banding over 80..12000 Hz the energy sits in the first
        // bands, not the last ones
        let mut sampler = MediaSampler::new();
        sampler.attach(
            Box::new(ScriptedTap::sine(16_000, 440.0)),
            AnalyserOptions {
                smoothing_time_constant: 0.0,
                ..AnalyserOptions::default()
            },
        );

        let snapshot = sampler.poll(32.0).expect("snapshot").clone();
        assert!(snapshot.has_signal());

        let values = bands::band_values(
            Some(&snapshot.data),
            snapshot.bin_width,
            15,
            80.0,
            Some(12_000.0),
            0.82,
        );
        assert_eq!(values.len(), 15);
        assert_bar_values_bounded(&values);
        let low: f32 = values[..3].iter().sum();
        let high: f32 = values[12..].iter().sum();
        assert!(low > high, "low {low} should dominate high {high}");
    }

    #[test]
    fn test_noise_capture_spreads_energy_across_bands() {
        use crate::analysis::SpectrumAnalyser;
        use crate::test_utils::fixtures::generate_white_noise;

        let noise = generate_white_noise(16_000.0, 1.0);
        let mut analyser = SpectrumAnalyser::new(AnalyserOptions {
            smoothing_time_constant: 0.0,
            ..AnalyserOptions::default()
        });
        let spectrum = analyser.process(&noise[noise.len() - 512..]);
        let values = bands::band_values(
            Some(&spectrum),
            Some(analyser.bin_width(16_000)),
            15,
            80.0,
            Some(12_000.0),
            0.82,
        );
        // Broadband input: most bands carry some energy
        let active = values.iter().filter(|&&v| v > 0.0).count();
        assert!(active >= 10, "only {active} of 15 bands active");
    }

    #[test]
    fn test_silent_capture_yields_no_usable_signal() {
        let mut sampler = MediaSampler::new();
        sampler.attach(Box::new(ScriptedTap::empty(16_000)), AnalyserOptions::default());
        // An empty source never produces a snapshot, which consumers must
        // treat as "use fallback"
        assert!(sampler.poll(32.0).is_none());
    }

    // ===== Snapshot Ordering =====

    #[test]
    fn test_consumers_observe_most_recent_reduction() {
        // The external feed emits a different buffer per accepted tick; the
        // composer must always reflect the latest one, never a stale one
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.attach_external(ExternalFeed::new(Box::new(move || {
            let call = counter_clone.fetch_add(1, Ordering::SeqCst);
            // Level rises with every call
            Some(vec![(40 + call * 10).min(255) as u8; 64])
        })));

        let first = viz.compose(100.0);
        let second = viz.compose(200.0);
        assert!(first.live && second.live);
        assert!(
            second.values[0] > first.values[0],
            "{} should exceed {}",
            second.values[0],
            first.values[0]
        );
    }

    #[test]
    fn test_snapshot_is_stable_between_accepted_ticks() {
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        viz.attach_external(
            ExternalFeed::new(Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Some(vec![100; 32])
            }))
            .with_fps(10.0),
        );
        // 100 ms pacing: two compose calls 1 ms apart share one snapshot
        let a = viz.compose(100.0);
        let b = viz.compose(101.0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(a.values, b.values);
    }

    // ===== Resource Lifetime Through the Composer =====

    #[test]
    fn test_composer_detach_releases_media_graph_once() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.attach_media(Box::new(
            ScriptedTap::sine(16_000, 440.0).counting_teardowns(Arc::clone(&teardowns)),
        ));
        assert!(viz.has_feed());
        viz.detach();
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(!viz.has_feed());
        // Detaching again is harmless
        viz.detach();
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attaching_external_replaces_media_graph() {
        // The external analyser takes precedence exclusively: binding it
        // tears the media graph down rather than leaving both running
        let teardowns = Arc::new(AtomicUsize::new(0));
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.attach_media(Box::new(
            ScriptedTap::sine(16_000, 440.0).counting_teardowns(Arc::clone(&teardowns)),
        ));
        viz.attach_external(ExternalFeed::new(Box::new(|| Some(vec![200; 64]))));
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);

        let frame = viz.compose(100.0);
        assert!(frame.live);
        // External snapshots carry no bin width, so banding covers the full
        // buffer: uniform data reduces to uniform values
        let expected = (200.0_f32 / 255.0).powf(0.82);
        for &v in &frame.values {
            assert!((v - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_dropping_composer_releases_graph() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        {
            let mut viz = BarVisualizer::new(VisualizerOptions::default());
            viz.attach_media(Box::new(
                ScriptedTap::sine(16_000, 440.0).counting_teardowns(Arc::clone(&teardowns)),
            ));
        }
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    // ===== Media Path End to End =====

    #[test]
    fn test_live_mic_frame_through_composer() {
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.attach_media(Box::new(ScriptedTap::sine(16_000, 440.0)));
        // Composer paces the media path at 48 ms
        assert!(!viz.compose(0.0).live);
        let frame = viz.compose(48.0);
        assert!(frame.live);
        assert_eq!(frame.values.len(), 15);
        assert_bar_values_bounded(&frame.values);
        assert!(frame.loudness > 0.0);
    }

    #[test]
    fn test_start_failure_degrades_to_animator_until_recovery() {
        let tap = ScriptedTap::sine(16_000, 440.0).failing_start();
        let gate = tap.start_gate();
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.set_state(Some(VisualState::Listening));
        viz.attach_media(Box::new(tap));

        // Blocked start: decorative fallback, never an error
        let frame = viz.compose(48.0);
        assert!(!frame.live);
        assert_eq!(frame.state, VisualState::Listening);
        assert_bar_values_bounded(&frame.values);

        // Start succeeds later: live data flows without re-attaching
        gate.store(false, Ordering::SeqCst);
        let frame = viz.compose(96.0);
        assert!(frame.live);
    }

    // ===== State Changes Mid-Stream =====

    #[test]
    fn test_state_change_recolors_without_touching_live_values() {
        let data = vec![150_u8; 64];
        let feed_data = data.clone();
        let mut viz = BarVisualizer::new(VisualizerOptions::default());
        viz.attach_external(ExternalFeed::new(Box::new(move || Some(feed_data.clone()))));

        viz.set_state(Some(VisualState::Listening));
        let listening = viz.compose(100.0);
        viz.set_state(Some(VisualState::Talking));
        let talking = viz.compose(200.0);

        // Same live reduction either way; only the ramp follows the state
        assert_eq!(listening.values, talking.values);
        assert_eq!(listening.ramp, VisualState::Listening.ramp());
        assert_eq!(talking.ramp, VisualState::Talking.ramp());
    }
}
