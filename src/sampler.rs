// Sampler Module - Paced frequency snapshots from live audio or external feeds
//
// Both samplers are polled from the caller's frame loop and self-throttle
// by comparing elapsed time, so driving them faster than their configured
// rate only drops ticks, never oversamples.

use crate::analysis::{AnalyserOptions, SpectrumAnalyser};
use crate::audio::SampleTap;

/// Raw sample values at or below this are treated as silence when deciding
/// whether a snapshot carries a usable signal.
pub const SIGNAL_THRESHOLD: u8 = 3;

/// One instantaneous frequency-domain reading: spectrum energies 0..=255,
/// low frequency first. `bin_width` (Hz per sample) is present only when
/// the snapshot came from the local analyser; externally supplied snapshots
/// are opaque sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySnapshot {
    pub data: Vec<u8>,
    pub bin_width: Option<f32>,
}

impl FrequencySnapshot {
    /// Whether at least one raw sample exceeds the silence threshold.
    pub fn has_signal(&self) -> bool {
        self.data.iter().any(|&v| v > SIGNAL_THRESHOLD)
    }
}

/// Elapsed-time self-throttle: accepts a tick when at least `interval_ms`
/// has passed since the last accepted one, and drops every tick in between.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval_ms: f64,
    last_ms: f64,
}

impl Pacer {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: 0.0,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Accept or drop a tick at `now_ms`.
    pub fn ready(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_ms >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

struct AnalyserGraph {
    tap: Box<dyn SampleTap + Send>,
    analyser: SpectrumAnalyser,
    live: bool,
}

/// Produces frequency snapshots from a live audio source.
///
/// Owns the capture-plus-analyser graph for exactly one attachment.
/// Attaching tears down any previous graph before the new one is built, and
/// detaching (or dropping the sampler) releases the underlying audio
/// resources synchronously, so repeated attach/detach cycles leak nothing.
pub struct MediaSampler {
    graph: Option<AnalyserGraph>,
    pacer: Pacer,
    snapshot: Option<FrequencySnapshot>,
}

impl Default for MediaSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSampler {
    pub fn new() -> Self {
        Self {
            graph: None,
            pacer: Pacer::new(AnalyserOptions::default().update_interval_ms),
            snapshot: None,
        }
    }

    /// Attach a live source, replacing any current graph. If the source
    /// fails to start (platform policy, device busy) the failure is logged
    /// and the sampler stays in a "no data yet" state; the start is retried
    /// on subsequent polls.
    pub fn attach(&mut self, tap: Box<dyn SampleTap + Send>, options: AnalyserOptions) {
        self.detach();
        let live = match tap.start() {
            Ok(()) => true,
            Err(err) => {
                eprintln!("Audio source start failed: {}", err);
                false
            }
        };
        self.pacer = Pacer::new(options.update_interval_ms);
        self.graph = Some(AnalyserGraph {
            tap,
            analyser: SpectrumAnalyser::new(options),
            live,
        });
    }

    /// Tear down the current graph, releasing the audio source. No further
    /// snapshots are delivered until a new source is attached.
    pub fn detach(&mut self) {
        self.graph = None;
        self.snapshot = None;
    }

    pub fn is_attached(&self) -> bool {
        self.graph.is_some()
    }

    /// Advance the sampler. Accepts at most one snapshot per configured
    /// update interval; between accepted ticks (and while the source has no
    /// data) the most recent snapshot is returned unchanged.
    pub fn poll(&mut self, now_ms: f64) -> Option<&FrequencySnapshot> {
        let graph = self.graph.as_mut()?;
        if !graph.live {
            match graph.tap.start() {
                Ok(()) => graph.live = true,
                Err(_) => return self.snapshot.as_ref(),
            }
        }
        if self.pacer.ready(now_ms) {
            let samples = graph.tap.read_latest(graph.analyser.options().fft_size);
            if !samples.is_empty() {
                let bin_width = graph.analyser.bin_width(graph.tap.sample_rate());
                let data = graph.analyser.process(&samples);
                self.snapshot = Some(FrequencySnapshot {
                    data,
                    bin_width: Some(bin_width),
                });
            }
        }
        self.snapshot.as_ref()
    }
}

/// Callback returning one frequency buffer, or nothing when the underlying
/// source has no data for this tick.
pub type FrequencyProvider = Box<dyn FnMut() -> Option<Vec<u8>> + Send>;

/// An externally supplied frequency-data source: a primary provider, an
/// optional fallback consulted only when the primary yields nothing, and a
/// target sampling rate in frames per second.
pub struct ExternalFeed {
    pub primary: FrequencyProvider,
    pub fallback: Option<FrequencyProvider>,
    pub fps: f32,
}

impl ExternalFeed {
    pub const DEFAULT_FPS: f32 = 45.0;

    pub fn new(primary: FrequencyProvider) -> Self {
        Self {
            primary,
            fallback: None,
            fps: Self::DEFAULT_FPS,
        }
    }

    pub fn with_fallback(mut self, fallback: FrequencyProvider) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }
}

/// Produces frequency snapshots (without bin width) from an external feed,
/// throttled to the feed's target frame rate.
pub struct ExternalSampler {
    feed: Option<ExternalFeed>,
    pacer: Pacer,
    snapshot: Option<FrequencySnapshot>,
}

impl Default for ExternalSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalSampler {
    pub fn new() -> Self {
        Self {
            feed: None,
            pacer: Pacer::new(1000.0 / ExternalFeed::DEFAULT_FPS as f64),
            snapshot: None,
        }
    }

    pub fn attach(&mut self, feed: ExternalFeed) {
        self.pacer = Pacer::new(1000.0 / feed.fps.max(1.0) as f64);
        self.feed = Some(feed);
        self.snapshot = None;
    }

    /// Remove the feed. Resets to "no data" immediately, without waiting
    /// for the next tick.
    pub fn detach(&mut self) {
        self.feed = None;
        self.snapshot = None;
    }

    pub fn is_attached(&self) -> bool {
        self.feed.is_some()
    }

    /// Advance the sampler: at most one accepted tick per `1000 / fps` ms,
    /// invoking the primary provider first and the fallback only when the
    /// primary yields nothing.
    pub fn poll(&mut self, now_ms: f64) -> Option<&FrequencySnapshot> {
        let feed = self.feed.as_mut()?;
        if self.pacer.ready(now_ms) {
            let buffer = (feed.primary)().or_else(|| feed.fallback.as_mut().and_then(|f| f()));
            if let Some(data) = buffer {
                self.snapshot = Some(FrequencySnapshot {
                    data,
                    bin_width: None,
                });
            }
        }
        self.snapshot.as_ref()
    }
}
