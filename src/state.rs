// State Module - Visual states with their activity profiles and color ramps

/// Discrete conversational/UI state driving color and fallback animation.
///
/// `Talking` and `Speaking` are distinct members with identical visual
/// treatment. The engine never transitions states itself; the surrounding
/// demo logic mutates the state and the engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Connecting,
    Initializing,
    Listening,
    Speaking,
    Talking,
    Thinking,
    Idle,
}

/// All states in display/cycle order.
pub const ALL_STATES: [VisualState; 7] = [
    VisualState::Connecting,
    VisualState::Initializing,
    VisualState::Listening,
    VisualState::Speaking,
    VisualState::Talking,
    VisualState::Thinking,
    VisualState::Idle,
];

impl VisualState {
    /// Map an absent state to `Idle`. Any state may follow any other; this
    /// is a presentation selector, not a workflow gate.
    pub fn normalize(state: Option<VisualState>) -> VisualState {
        state.unwrap_or(VisualState::Idle)
    }

    /// Parse a state name as used on the command line. Unknown names map to
    /// `None` so the caller can fall back to `Idle`.
    pub fn from_name(name: &str) -> Option<VisualState> {
        match name.to_ascii_lowercase().as_str() {
            "connecting" => Some(VisualState::Connecting),
            "initializing" => Some(VisualState::Initializing),
            "listening" => Some(VisualState::Listening),
            "speaking" => Some(VisualState::Speaking),
            "talking" => Some(VisualState::Talking),
            "thinking" => Some(VisualState::Thinking),
            "idle" => Some(VisualState::Idle),
            _ => None,
        }
    }

    /// The state after this one in display order, wrapping around.
    pub fn next(&self) -> VisualState {
        let index = ALL_STATES.iter().position(|s| s == self).unwrap_or(0);
        ALL_STATES[(index + 1) % ALL_STATES.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            VisualState::Connecting => "connecting",
            VisualState::Initializing => "initializing",
            VisualState::Listening => "listening",
            VisualState::Speaking => "speaking",
            VisualState::Talking => "talking",
            VisualState::Thinking => "thinking",
            VisualState::Idle => "idle",
        }
    }

    /// Static activity profile: how energetic and how jittery the fallback
    /// animation is for this state. Never mutated at runtime.
    pub fn activity(&self) -> ActivityProfile {
        match self {
            VisualState::Connecting => ActivityProfile {
                energy: 0.35,
                jitter: 0.15,
            },
            VisualState::Initializing => ActivityProfile {
                energy: 0.45,
                jitter: 0.20,
            },
            VisualState::Listening => ActivityProfile {
                energy: 0.60,
                jitter: 0.25,
            },
            VisualState::Speaking | VisualState::Talking => ActivityProfile {
                energy: 0.85,
                jitter: 0.35,
            },
            VisualState::Thinking => ActivityProfile {
                energy: 0.40,
                jitter: 0.20,
            },
            VisualState::Idle => ActivityProfile {
                energy: 0.20,
                jitter: 0.10,
            },
        }
    }

    /// Static color ramp for the vertical bar gradient. Never mutated at
    /// runtime.
    pub fn ramp(&self) -> ColorRamp {
        match self {
            VisualState::Connecting | VisualState::Initializing => ColorRamp {
                from: Rgb(253, 230, 138),
                via: Rgb(251, 191, 36),
                to: Rgb(245, 158, 11),
            },
            VisualState::Listening => ColorRamp {
                from: Rgb(52, 211, 153),
                via: Rgb(59, 130, 246),
                to: Rgb(96, 165, 250),
            },
            VisualState::Speaking | VisualState::Talking => ColorRamp {
                from: Rgb(10, 150, 255),
                via: Rgb(91, 46, 255),
                to: Rgb(244, 114, 182),
            },
            VisualState::Thinking => ColorRamp {
                from: Rgb(252, 211, 77),
                via: Rgb(251, 146, 60),
                to: Rgb(249, 115, 22),
            },
            VisualState::Idle => ColorRamp {
                from: Rgb(148, 163, 184),
                via: Rgb(203, 213, 245),
                to: Rgb(226, 232, 240),
            },
        }
    }
}

/// Per-state fallback animation budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityProfile {
    /// Baseline bar energy in 0.0..=1.0.
    pub energy: f32,
    /// Bounded randomness budget in 0.0..=1.0.
    pub jitter: f32,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
        )
    }

    /// Scale intensity toward black, used for the mirrored layer.
    pub fn dim(self, factor: f32) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        Rgb(
            (self.0 as f32 * f).round() as u8,
            (self.1 as f32 * f).round() as u8,
            (self.2 as f32 * f).round() as u8,
        )
    }
}

/// Three-stop vertical gradient: `from` at the top of a bar, `via` halfway,
/// `to` at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRamp {
    pub from: Rgb,
    pub via: Rgb,
    pub to: Rgb,
}

impl ColorRamp {
    /// Sample the gradient at position `t` in 0.0..=1.0 (0 = top).
    pub fn sample(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.5 {
            self.from.lerp(self.via, t * 2.0)
        } else {
            self.via.lerp(self.to, (t - 0.5) * 2.0)
        }
    }
}
