// Cull and week-end timers shown alongside the phase banner.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::GamePhaseClock;
use crate::countdown::{countdown_with_style, remaining_secs, CountdownStyle};
use crate::error::ClockError;
use crate::phase::Phase;
use crate::schedule::BoundaryKind;

/// A cull closer than this many seconds is flagged as urgent.
pub const DROP_URGENCY_SECS: i64 = 3_600;

/// A cull is reported as in progress for this long from its instant, one
/// display tick.
pub const DROP_ACTIVE_SECS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropEvent {
    /// 1-based ordinal within the week (Tuesday's cull is #1).
    pub number: u8,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropStatus {
    Upcoming,
    /// A cull instant has just been reached.
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    Active,
    FinalHour,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekTimers {
    pub evaluated_at: DateTime<Utc>,
    pub next_drop: Option<DropEvent>,
    /// The cull whose instant falls within the last `DROP_ACTIVE_SECS`.
    pub active_drop: Option<DropEvent>,
    /// End of the running week, or of next week during intermission.
    pub week_end: DateTime<Utc>,
    pub until_drop_secs: Option<i64>,
    pub until_week_end_secs: i64,
    pub drop_urgent: bool,
    pub final_hour_active: bool,
    pub drop_status: DropStatus,
    pub week_status: WeekStatus,
}

impl WeekTimers {
    /// Compute the timers at `now` from the clock's schedule.
    pub fn at(clock: &GamePhaseClock, now: DateTime<Utc>) -> Result<Self, ClockError> {
        let phase = clock.current_phase(now);
        let schedule = clock.schedule();

        let week_end = schedule
            .next_boundary_where(now, |k| *k == BoundaryKind::WeekEnd)?
            .at;

        let culls_remain = matches!(phase, Phase::DraftOpen | Phase::TradingWeek);
        let has_drops = culls_remain && !schedule.drops().is_empty();
        let drop_after = |from: DateTime<Utc>| -> Result<Option<DropEvent>, ClockError> {
            let t = schedule.next_boundary_where(from, |k| matches!(k, BoundaryKind::Drop { .. }))?;
            Ok(match t.kind {
                BoundaryKind::Drop { number } if t.at < week_end => Some(DropEvent { number, at: t.at }),
                _ => None,
            })
        };
        let next_drop = if has_drops { drop_after(now)? } else { None };
        let active_drop = if has_drops {
            drop_after(now - Duration::seconds(DROP_ACTIVE_SECS))?.filter(|d| d.at <= now)
        } else {
            None
        };

        let until_drop_secs = next_drop.and_then(|d| remaining_secs(d.at, now));
        let until_week_end_secs = remaining_secs(week_end, now).unwrap_or(0);
        let drop_urgent = next_drop.is_some_and(|d| d.at - now < Duration::seconds(DROP_URGENCY_SECS));

        let week_status = match phase {
            Phase::Intermission => WeekStatus::Completed,
            Phase::FinalHour => WeekStatus::FinalHour,
            Phase::DraftOpen | Phase::TradingWeek => WeekStatus::Active,
        };
        let drop_status = if active_drop.is_some() {
            DropStatus::Active
        } else if next_drop.is_some() {
            DropStatus::Upcoming
        } else {
            DropStatus::Completed
        };

        Ok(WeekTimers {
            evaluated_at: now,
            next_drop,
            active_drop,
            week_end,
            until_drop_secs,
            until_week_end_secs,
            drop_urgent,
            final_hour_active: phase == Phase::FinalHour,
            drop_status,
            week_status,
        })
    }

    /// Text for the cull timer line.
    pub fn drop_display(&self) -> String {
        if let Some(drop) = self.active_drop {
            return format!("CULL #{} IN PROGRESS", drop.number);
        }
        match self.next_drop {
            Some(drop) => format!(
                "CULL #{} in {}",
                drop.number,
                countdown_with_style(drop.at, self.evaluated_at, CountdownStyle::Clock)
            ),
            None => "All Culls Complete".to_string(),
        }
    }

    /// Text for the week timer line.
    pub fn week_display(&self) -> String {
        match self.week_status {
            WeekStatus::Completed => "Awaiting Prize Payout".to_string(),
            WeekStatus::FinalHour => "FINAL HOUR ACTIVE".to_string(),
            WeekStatus::Active => format!(
                "Chrome War Ends in {}",
                countdown_with_style(self.week_end, self.evaluated_at, CountdownStyle::Days)
            ),
        }
    }
}
