// Game phases of the weekly competition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The phase the weekly competition is in at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Lineups may be drafted and locked.
    DraftOpen,
    /// Lineups are locked; culls happen at the scheduled drops.
    TradingWeek,
    /// Last trading hour of the week.
    FinalHour,
    /// Between the end of one week and the next draft.
    Intermission,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::DraftOpen,
        Phase::TradingWeek,
        Phase::FinalHour,
        Phase::Intermission,
    ];

    /// Return the canonical upper-case name, e.g. `DRAFT_OPEN`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::DraftOpen => "DRAFT_OPEN",
            Phase::TradingWeek => "TRADING_WEEK",
            Phase::FinalHour => "FINAL_HOUR",
            Phase::Intermission => "INTERMISSION",
        }
    }

    /// Caption shown next to the countdown while this phase is active.
    pub fn countdown_label(&self) -> &'static str {
        match self {
            Phase::DraftOpen => "Draft Closes In:",
            Phase::TradingWeek => "Next Cull In:",
            Phase::FinalHour => "Chrome War Ends In:",
            Phase::Intermission => "Next Draft Starts In:",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    /// Accepts the canonical names case-insensitively, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DRAFT_OPEN" => Ok(Phase::DraftOpen),
            "TRADING_WEEK" => Ok(Phase::TradingWeek),
            "FINAL_HOUR" => Ok(Phase::FinalHour),
            "INTERMISSION" => Ok(Phase::Intermission),
            other => Err(format!("unknown phase `{other}`")),
        }
    }
}

/// Draft entry is only allowed while the draft window is open.
pub fn entry_allowed(phase: Phase) -> bool {
    phase == Phase::DraftOpen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_draft_open_allows_entry() {
        for phase in Phase::ALL {
            assert_eq!(entry_allowed(phase), phase == Phase::DraftOpen, "{phase}");
        }
    }

    #[test]
    fn parse_accepts_loose_spelling() {
        assert_eq!("final-hour".parse::<Phase>(), Ok(Phase::FinalHour));
        assert_eq!(" Draft_Open ".parse::<Phase>(), Ok(Phase::DraftOpen));
        assert!("halftime".parse::<Phase>().is_err());
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Phase::TradingWeek).unwrap();
        assert_eq!(json, "\"TRADING_WEEK\"");
        let back: Phase = serde_json::from_str("\"INTERMISSION\"").unwrap();
        assert_eq!(back, Phase::Intermission);
    }
}
