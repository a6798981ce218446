// Static game rule tables: abilities, rival victory bonuses, prestige tiers.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Boost own portfolio.
    Multiply,
    /// Penalize a rival's portfolio.
    Penalty,
    /// Block the next ability used against you.
    Block,
    /// Copy a rival's best performer.
    Copy,
    /// Cancel a rival's upcoming abilities.
    Cancel,
}

/// Duration and cooldown are measured in trading hours. A zero duration is an
/// instant effect; a zero cooldown means once per rival lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ability {
    pub name: &'static str,
    pub description: &'static str,
    pub duration_hours: u32,
    pub cooldown_hours: u32,
    pub charges: u32,
    pub effect: AbilityEffect,
}

pub static ABILITIES: [Ability; 5] = [
    Ability {
        name: "Overclock",
        description: "+25% portfolio boost",
        duration_hours: 4,
        cooldown_hours: 6,
        charges: 3,
        effect: AbilityEffect::Multiply,
    },
    Ability {
        name: "Short Circuit",
        description: "-20% portfolio penalty to target",
        duration_hours: 4,
        cooldown_hours: 6,
        charges: 3,
        effect: AbilityEffect::Penalty,
    },
    Ability {
        name: "Ghost Shield",
        description: "Block next ability used against you",
        duration_hours: 0,
        cooldown_hours: 10,
        charges: 2,
        effect: AbilityEffect::Block,
    },
    Ability {
        name: "Mirror Hack",
        description: "Copy rival's best performing stock",
        duration_hours: 4,
        cooldown_hours: 0,
        charges: 2,
        effect: AbilityEffect::Copy,
    },
    Ability {
        name: "Null Surge",
        description: "Cancel rival's next 2 abilities",
        duration_hours: 0,
        cooldown_hours: 0,
        charges: 2,
        effect: AbilityEffect::Cancel,
    },
];

impl Ability {
    pub fn is_instant(&self) -> bool {
        self.duration_hours == 0
    }

    pub fn once_per_rival_lock(&self) -> bool {
        self.cooldown_hours == 0
    }
}

/// Look up an ability by name, ignoring case.
pub fn ability(name: &str) -> Option<&'static Ability> {
    ABILITIES.iter().find(|a| a.name.eq_ignore_ascii_case(name.trim()))
}

// ---------------------------------------------------------------------------
// Rival bonuses
// ---------------------------------------------------------------------------

pub const CLOSE_WIN_BONUS: f64 = 0.05;
pub const GOOD_WIN_BONUS: f64 = 0.15;
pub const DOMINANT_WIN_BONUS: f64 = 0.30;
pub const FINAL_HOUR_WIN_BONUS: f64 = 0.50;

/// Bonus fraction for beating a rival by `margin_pct` percentage points.
/// A win sealed in the final hour always earns the final-hour bonus.
/// Returns `None` when `margin_pct` is not a win.
pub fn rival_bonus(margin_pct: f64, final_hour: bool) -> Option<f64> {
    if !margin_pct.is_finite() || margin_pct <= 0.0 {
        return None;
    }
    if final_hour {
        return Some(FINAL_HOUR_WIN_BONUS);
    }
    Some(if margin_pct <= 5.0 {
        CLOSE_WIN_BONUS
    } else if margin_pct <= 15.0 {
        GOOD_WIN_BONUS
    } else {
        DOMINANT_WIN_BONUS
    })
}

// ---------------------------------------------------------------------------
// Prestige tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PrestigeTier {
    Recruit,
    Trader,
    Veteran,
    Elite,
    Champion,
    Legend,
}

impl PrestigeTier {
    pub const ALL: [PrestigeTier; 6] = [
        PrestigeTier::Recruit,
        PrestigeTier::Trader,
        PrestigeTier::Veteran,
        PrestigeTier::Elite,
        PrestigeTier::Champion,
        PrestigeTier::Legend,
    ];

    pub fn min_wins(&self) -> u32 {
        match self {
            PrestigeTier::Recruit => 0,
            PrestigeTier::Trader => 3,
            PrestigeTier::Veteran => 8,
            PrestigeTier::Elite => 15,
            PrestigeTier::Champion => 25,
            PrestigeTier::Legend => 50,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrestigeTier::Recruit => "Recruit",
            PrestigeTier::Trader => "Trader",
            PrestigeTier::Veteran => "Veteran",
            PrestigeTier::Elite => "Elite",
            PrestigeTier::Champion => "Champion",
            PrestigeTier::Legend => "Legend",
        }
    }

    /// Highest tier whose threshold `wins` meets.
    pub fn for_wins(wins: u32) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| wins >= tier.min_wins())
            .unwrap_or(PrestigeTier::Recruit)
    }

    /// Wins still needed to reach the next tier, or `None` at the top.
    pub fn wins_to_next(wins: u32) -> Option<u32> {
        let current = Self::for_wins(wins);
        Self::ALL
            .iter()
            .find(|tier| **tier > current)
            .map(|next| next.min_wins() - wins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_lookup_is_case_insensitive() {
        let a = ability("ghost shield").unwrap();
        assert_eq!(a.effect, AbilityEffect::Block);
        assert!(a.is_instant());
        assert!(!a.once_per_rival_lock());
        assert!(ability("Time Warp").is_none());
    }

    #[test]
    fn mirror_hack_is_once_per_lock() {
        let a = ability("Mirror Hack").unwrap();
        assert!(a.once_per_rival_lock());
        assert_eq!(a.duration_hours, 4);
    }

    #[test]
    fn bonus_by_margin() {
        assert_eq!(rival_bonus(0.0, false), None);
        assert_eq!(rival_bonus(-3.0, true), None);
        assert_eq!(rival_bonus(f64::NAN, false), None);
        assert_eq!(rival_bonus(4.9, false), Some(CLOSE_WIN_BONUS));
        assert_eq!(rival_bonus(5.0, false), Some(CLOSE_WIN_BONUS));
        assert_eq!(rival_bonus(6.0, false), Some(GOOD_WIN_BONUS));
        assert_eq!(rival_bonus(15.0, false), Some(GOOD_WIN_BONUS));
        assert_eq!(rival_bonus(16.0, false), Some(DOMINANT_WIN_BONUS));
        assert_eq!(rival_bonus(1.0, true), Some(FINAL_HOUR_WIN_BONUS));
    }

    #[test]
    fn tiers_by_wins() {
        assert_eq!(PrestigeTier::for_wins(0), PrestigeTier::Recruit);
        assert_eq!(PrestigeTier::for_wins(2), PrestigeTier::Recruit);
        assert_eq!(PrestigeTier::for_wins(3), PrestigeTier::Trader);
        assert_eq!(PrestigeTier::for_wins(24), PrestigeTier::Elite);
        assert_eq!(PrestigeTier::for_wins(500), PrestigeTier::Legend);
    }

    #[test]
    fn wins_to_next_tier() {
        assert_eq!(PrestigeTier::wins_to_next(0), Some(3));
        assert_eq!(PrestigeTier::wins_to_next(10), Some(5));
        assert_eq!(PrestigeTier::wins_to_next(50), None);
    }
}
