// Animator Module - Synthetic bar animation driven by visual state alone

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::state::{ActivityProfile, VisualState};

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Compute one animation frame: a low-frequency traveling wave so the bars
/// appear to breathe left to right, plus bounded randomness scaled by the
/// state's jitter budget.
fn animate_columns(
    profile: ActivityProfile,
    columns: usize,
    now_ms: f64,
    rng: &mut StdRng,
) -> Vec<f32> {
    (0..columns)
        .map(|index| {
            let progress = index as f32 / columns as f32;
            let wave = ((now_ms / 320.0) + (progress as f64) * 5.0).sin() as f32;
            let jitter = (rng.gen_range(0.0..1.0_f32) - 0.5) * profile.jitter;
            let base = profile.energy * (0.9 + 0.2 * (progress * std::f32::consts::PI).cos());
            clamp01(base + wave * 0.15 + jitter)
        })
        .collect()
}

/// Produces a continuously evolving set of column values in 0.0..=1.0 from a
/// visual state, with no audio input. Runs on its own fixed-interval timer,
/// independent of any audio sampling.
///
/// Changing the state, column count, or interval restarts the timer: the
/// next `poll` recomputes immediately and no prior animation phase carries
/// over.
pub struct BarAnimator {
    state: VisualState,
    columns: usize,
    interval_ms: f64,
    next_due: Option<f64>,
    values: Vec<f32>,
    rng: StdRng,
}

impl BarAnimator {
    /// Default animator tick interval in milliseconds.
    pub const DEFAULT_INTERVAL_MS: f64 = 140.0;

    pub fn new(state: Option<VisualState>, columns: usize, interval_ms: f64) -> Self {
        Self {
            state: VisualState::normalize(state),
            columns,
            interval_ms,
            next_due: None,
            values: vec![0.0; columns],
            rng: StdRng::from_entropy(),
        }
    }

    /// Reconfigure the animator. Any change restarts the timer.
    pub fn configure(&mut self, state: Option<VisualState>, columns: usize, interval_ms: f64) {
        let state = VisualState::normalize(state);
        if state == self.state && columns == self.columns && interval_ms == self.interval_ms {
            return;
        }
        self.state = state;
        self.columns = columns;
        self.interval_ms = interval_ms;
        self.values = vec![0.0; columns];
        self.next_due = None;
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    /// Advance the animator. Recomputes when the interval has elapsed (or
    /// immediately after construction or reconfiguration) and otherwise
    /// returns the current frame unchanged.
    pub fn poll(&mut self, now_ms: f64) -> &[f32] {
        let due = match self.next_due {
            None => true,
            Some(deadline) => now_ms >= deadline,
        };
        if due {
            self.values = animate_columns(self.state.activity(), self.columns, now_ms, &mut self.rng);
            self.next_due = Some(now_ms + self.interval_ms);
        }
        &self.values
    }
}
