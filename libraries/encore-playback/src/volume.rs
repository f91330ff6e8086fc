//! Volume control
//!
//! Level is linear 0.0-1.0, the same scale the persisted session and the
//! audio resource use. Mute is kept separate so unmuting restores the level.

/// Level restored when unmuting at zero volume
const UNMUTE_FALLBACK: f32 = 0.5;

/// Volume controller with mute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// Out-of-range levels are clamped; non-finite levels become 1.0.
    pub fn new(level: f32) -> Self {
        Self {
            level: Self::clamp(level),
            muted: false,
        }
    }

    /// Set volume level (0.0-1.0)
    pub fn set_level(&mut self, level: f32) {
        self.level = Self::clamp(level);
    }

    /// Get current volume level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio
    ///
    /// Unmuting a zero level would still be silent, so it restores 0.5.
    pub fn unmute(&mut self) {
        self.muted = false;
        if self.level == 0.0 {
            self.level = UNMUTE_FALLBACK;
        }
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain sent to the audio resource
    ///
    /// Returns 0.0 if muted, otherwise the level.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }

    fn clamp(level: f32) -> f32 {
        if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
