use serde::{Deserialize, Serialize};

/// Streak-driven score multiplier: `min(max, 1 + streak / step)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMultiplier {
    pub step: u32,
    pub max: u32,
}

impl StreakMultiplier {
    pub fn factor(&self, streak: u32) -> u32 {
        let step = self.step.max(1);
        (1 + streak / step).min(self.max.max(1))
    }
}

/// Points awarded for one success:
/// `(base * weight + time_bonus + streak * unit) * multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub base_score: u32,
    pub streak_bonus_unit: u32,
    pub time_bonus_divisor_ms: Option<u64>,
    pub streak_multiplier: Option<StreakMultiplier>,
    pub streak_bonus_before_increment: bool,
}

impl ScoringPolicy {
    /// One point per full divisor of remaining time; zero without a clock.
    pub fn time_bonus(&self, remaining_ms: Option<u64>) -> u32 {
        match (self.time_bonus_divisor_ms, remaining_ms) {
            (Some(divisor), Some(remaining)) if divisor > 0 => {
                u32::try_from(remaining / divisor).unwrap_or(u32::MAX)
            }
            _ => 0,
        }
    }

    pub fn streak_bonus(&self, streak: u32) -> u32 {
        self.streak_bonus_unit.saturating_mul(streak)
    }

    pub fn multiplier(&self, streak: u32) -> u32 {
        self.streak_multiplier.map_or(1, |m| m.factor(streak))
    }

    /// Streak the bonus and multiplier see, given the streak before the
    /// success being scored.
    pub fn scored_streak(&self, prior_streak: u32) -> u32 {
        if self.streak_bonus_before_increment {
            prior_streak
        } else {
            prior_streak.saturating_add(1)
        }
    }

    /// `streak` is the value returned by [`Self::scored_streak`].
    pub fn award(&self, weight: u32, remaining_ms: Option<u64>, streak: u32) -> u32 {
        self.base_score
            .saturating_mul(weight.max(1))
            .saturating_add(self.time_bonus(remaining_ms))
            .saturating_add(self.streak_bonus(streak))
            .saturating_mul(self.multiplier(streak))
    }
}
