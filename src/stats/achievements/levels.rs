//! XP and Level system
//!
//! Levels follow a closed-form curve: reaching level `L` takes `(L - 1)^2 * 100` XP.

/// XP per quadratic step of the level curve
const XP_CURVE_FACTOR: u64 = 100;

/// Total XP required to reach `level`. Levels below 1 are treated as 1.
pub fn xp_for_level(level: u32) -> u64 {
    let steps = u64::from(level.max(1) - 1);
    steps.saturating_mul(steps).saturating_mul(XP_CURVE_FACTOR)
}

/// Level reached with `xp` total experience: `floor(sqrt(xp / 100)) + 1`.
///
/// Uses the integer square root, so `xp == xp_for_level(L)` always maps to `L`.
pub fn level_for_xp(xp: u64) -> u32 {
    // floor(sqrt(x)) == isqrt(floor(x)) for x >= 0, and isqrt(u64::MAX / 100) fits a u32
    let steps = (xp / XP_CURVE_FACTOR).isqrt();
    u32::try_from(steps).unwrap_or(u32::MAX - 1) + 1
}

/// Fraction of the way from the current level to the next, in `[0, 1)`
pub fn progress_to_next_level(xp: u64) -> f64 {
    let level = level_for_xp(xp);
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level.saturating_add(1));
    let span = ceiling.saturating_sub(floor).max(1);
    xp.saturating_sub(floor) as f64 / span as f64
}

/// Progression snapshot for display
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserProgress {
    pub experience: u64,
    pub level: u32,
    /// XP at which the current level started
    pub current_level_xp: u64,
    /// XP at which the next level starts
    pub next_level_xp: u64,
    pub progress: f64,
}

impl UserProgress {
    pub fn new(experience: u64) -> Self {
        let level = level_for_xp(experience);
        Self {
            experience,
            level,
            current_level_xp: xp_for_level(level),
            next_level_xp: xp_for_level(level.saturating_add(1)),
            progress: progress_to_next_level(experience),
        }
    }

    /// XP still missing for the next level
    pub fn xp_remaining(&self) -> u64 {
        self.next_level_xp.saturating_sub(self.experience)
    }
}
