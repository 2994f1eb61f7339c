// Viz Module - Bar visualizer: source arbitration, height mapping, rendering
//
// Chooses between live-derived bar values and animator-derived values every
// frame, maps each value to a height and a state-keyed color gradient, and
// renders one bottom-anchored layer or two center-mirrored layers.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

use crate::analysis::AnalyserOptions;
use crate::animator::BarAnimator;
use crate::audio::SampleTap;
use crate::bands;
use crate::sampler::{ExternalFeed, ExternalSampler, MediaSampler};
use crate::state::{ColorRamp, VisualState};

/// Default number of bars.
pub const DEFAULT_BAR_COUNT: usize = 15;

/// Pass-band and gamma curve for the live path.
const LIVE_LO_PASS_HZ: f32 = 80.0;
const LIVE_HI_PASS_HZ: f32 = 12_000.0;
const LIVE_CURVE: f32 = 0.82;

/// Fallback animation cadence used by the composer.
const ANIMATOR_INTERVAL_MS: f64 = 150.0;

/// Intensity factor for the mirrored second layer.
const MIRROR_DIM: f32 = 0.7;

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Render-time options for the composer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizerOptions {
    pub bar_count: usize,
    /// Smallest bar height, in percent of the drawing area.
    pub min_height: f32,
    /// Largest bar height, in percent of the drawing area.
    pub max_height: f32,
    /// Force the synthetic animator even when live data is available.
    pub demo: bool,
    /// Render a second, mirrored layer around the center line.
    pub center_align: bool,
}

impl Default for VisualizerOptions {
    fn default() -> Self {
        Self {
            bar_count: DEFAULT_BAR_COUNT,
            min_height: 20.0,
            max_height: 100.0,
            demo: false,
            center_align: false,
        }
    }
}

/// The data source bound to the composer. Selected at attach time; an
/// external feed is preferred exclusively over a media source, and `Silent`
/// always falls through to the animator.
enum FeedBinding {
    Media(MediaSampler),
    External(ExternalSampler),
    Silent,
}

/// One composed frame, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BarFrame {
    /// Chosen bar values in 0.0..=1.0, left to right.
    pub values: Vec<f32>,
    /// Bar heights in percent, clamped to `[min_height, 100]`.
    pub heights: Vec<f32>,
    /// Gradient for the normalized state.
    pub ramp: ColorRamp,
    /// The normalized state this frame was composed for.
    pub state: VisualState,
    /// True when the frame came from live data rather than the animator.
    pub live: bool,
    /// Overall loudness of the latest snapshot, 0.0..=1.0.
    pub loudness: f32,
    /// True when the mirrored second layer should be rendered.
    pub mirrored: bool,
}

/// The visualizer composer: polls the bound feed, arbitrates between live
/// and synthetic values, and produces a renderable `BarFrame` per tick.
pub struct BarVisualizer {
    options: VisualizerOptions,
    state: Option<VisualState>,
    feed: FeedBinding,
    animator: BarAnimator,
}

impl BarVisualizer {
    pub fn new(options: VisualizerOptions) -> Self {
        let animator = BarAnimator::new(None, options.bar_count, ANIMATOR_INTERVAL_MS);
        Self {
            options,
            state: None,
            feed: FeedBinding::Silent,
            animator,
        }
    }

    pub fn options(&self) -> &VisualizerOptions {
        &self.options
    }

    /// Update the visual state. An absent state renders as `Idle`.
    /// Changing it restarts the fallback animation.
    pub fn set_state(&mut self, state: Option<VisualState>) {
        self.state = state;
        self.animator
            .configure(state, self.options.bar_count, ANIMATOR_INTERVAL_MS);
    }

    pub fn set_demo(&mut self, demo: bool) {
        self.options.demo = demo;
    }

    pub fn set_center_align(&mut self, center_align: bool) {
        self.options.center_align = center_align;
    }

    /// Bind a live audio source. Any previous binding is torn down first.
    /// The analyser runs with the composer's settings (512-point FFT,
    /// smoothing 0.4, one snapshot per 48 ms).
    pub fn attach_media(&mut self, tap: Box<dyn SampleTap + Send>) {
        // Old binding goes away before the new graph exists
        self.detach();
        let mut sampler = MediaSampler::new();
        sampler.attach(
            tap,
            AnalyserOptions {
                smoothing_time_constant: 0.4,
                update_interval_ms: 48.0,
                ..AnalyserOptions::default()
            },
        );
        self.feed = FeedBinding::Media(sampler);
    }

    /// Bind an external frequency feed, which takes precedence over any
    /// media source. Any previous binding is torn down first.
    pub fn attach_external(&mut self, feed: ExternalFeed) {
        self.detach();
        let mut sampler = ExternalSampler::new();
        sampler.attach(feed);
        self.feed = FeedBinding::External(sampler);
    }

    /// Remove the current binding, releasing its audio resources. The
    /// composer falls back to the animator.
    pub fn detach(&mut self) {
        self.feed = FeedBinding::Silent;
    }

    pub fn has_feed(&self) -> bool {
        !matches!(self.feed, FeedBinding::Silent)
    }

    /// Compose one frame at `now_ms`.
    pub fn compose(&mut self, now_ms: f64) -> BarFrame {
        let snapshot = match &mut self.feed {
            FeedBinding::Media(sampler) => sampler.poll(now_ms),
            FeedBinding::External(sampler) => sampler.poll(now_ms),
            FeedBinding::Silent => None,
        };

        let has_signal = snapshot.map(|s| s.has_signal()).unwrap_or(false);
        let loudness = bands::loudness(snapshot.map(|s| s.data.as_slice()));
        let live_values = bands::band_values(
            snapshot.map(|s| s.data.as_slice()),
            snapshot.and_then(|s| s.bin_width),
            self.options.bar_count,
            LIVE_LO_PASS_HZ,
            Some(LIVE_HI_PASS_HZ),
            LIVE_CURVE,
        );

        let live = !self.options.demo && has_signal;
        let values = if live {
            live_values
        } else {
            self.animator.poll(now_ms).to_vec()
        };

        let min = self.options.min_height;
        let max = self.options.max_height;
        let heights = values
            .iter()
            .map(|&v| (min + (max - min) * clamp01(v)).clamp(min, 100.0))
            .collect();

        let state = VisualState::normalize(self.state);
        BarFrame {
            values,
            heights,
            ramp: state.ramp(),
            state,
            live,
            loudness,
            mirrored: self.options.center_align,
        }
    }
}

/// A ratatui widget that renders a composed bar frame.
pub struct BarWidget<'a> {
    frame: &'a BarFrame,
}

impl<'a> BarWidget<'a> {
    pub fn new(frame: &'a BarFrame) -> Self {
        Self { frame }
    }

    /// Paint one vertical bar into `buf`. `rows` is the panel height,
    /// `anchor_y` its anchored edge, and `downward` flips growth direction
    /// and gradient for the mirrored layer.
    #[allow(clippy::too_many_arguments)]
    fn draw_bar(
        &self,
        buf: &mut Buffer,
        x0: u16,
        width: u16,
        anchor_y: u16,
        rows: u16,
        height_pct: f32,
        downward: bool,
    ) {
        let filled = ((height_pct / 100.0) * rows as f32).round() as u16;
        if filled == 0 {
            return;
        }
        let filled = filled.min(rows);
        for step in 0..filled {
            // t runs 0 at the bar tip to 1 at the anchored edge; the ramp's
            // `from` color sits at the tip in both orientations, which is
            // what a 180-degree rotation of the gradient produces
            let t = if filled > 1 {
                step as f32 / (filled - 1) as f32
            } else {
                1.0
            };
            let rgb = self.frame.ramp.sample(t);
            let rgb = if downward { rgb.dim(MIRROR_DIM) } else { rgb };
            let distance = filled - 1 - step;
            let y = if downward {
                anchor_y + distance
            } else {
                anchor_y - distance
            };
            let style = Style::default().fg(Color::Rgb(rgb.0, rgb.1, rgb.2));
            for dx in 0..width {
                buf.set_string(x0 + dx, y, "█", style);
            }
        }
    }
}

impl Widget for BarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 1 || area.height < 1 || self.frame.heights.is_empty() {
            return;
        }

        let count = self.frame.heights.len() as u16;
        let slot = (area.width / count).max(1);
        let bar_width = if slot > 1 { slot - 1 } else { 1 };
        let drawn = count.min(area.width / slot).max(1);

        if self.frame.mirrored {
            let top_rows = area.height / 2;
            let bottom_rows = area.height - top_rows;
            if top_rows == 0 {
                return;
            }
            for i in 0..drawn {
                let x0 = area.x + i * slot;
                let height = self.frame.heights[i as usize];
                // Upper layer: bars grow up from the center line
                self.draw_bar(buf, x0, bar_width, area.y + top_rows - 1, top_rows, height, false);
                // Mirrored layer: same values rotated 180 degrees, dimmed
                let mirrored = self.frame.heights[(drawn - 1 - i) as usize];
                self.draw_bar(
                    buf,
                    x0,
                    bar_width,
                    area.y + top_rows,
                    bottom_rows,
                    mirrored,
                    true,
                );
            }
        } else {
            for i in 0..drawn {
                let x0 = area.x + i * slot;
                let height = self.frame.heights[i as usize];
                self.draw_bar(
                    buf,
                    x0,
                    bar_width,
                    area.y + area.height - 1,
                    area.height,
                    height,
                    false,
                );
            }
        }
    }
}
