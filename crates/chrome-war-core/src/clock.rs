// Game phase clock: maps an instant to the current phase, the next
// transition, and the countdown a display should show.
//
// Every operation is a pure function of its timestamp argument and the
// immutable schedule. Hosts that want a live display call `status` on their
// own polling cadence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::countdown::countdown_string;
use crate::error::ClockError;
use crate::phase::{entry_allowed, Phase};
use crate::schedule::{ScheduleRule, Transition};
use crate::timers::WeekTimers;

/// Snapshot of the game clock at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStatus {
    pub evaluated_at: DateTime<Utc>,
    pub phase: Phase,
    /// Caption for the countdown, e.g. "Draft Closes In:".
    pub label: &'static str,
    /// Strictly after `evaluated_at`.
    pub target_time: DateTime<Utc>,
    pub countdown: String,
    pub show_enter_button: bool,
    /// True when `phase` came from an override rather than the schedule.
    pub forced: bool,
}

/// Parse an RFC 3339 timestamp, e.g. `2025-06-02T13:30:00Z`.
///
/// Empty or malformed input is rejected; the current time is never used as
/// a stand-in.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, ClockError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClockError::invalid_input("timestamp is empty"));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ClockError::invalid_input(format!("`{trimmed}` is not an RFC 3339 timestamp: {e}")))
}

#[derive(Debug, Clone, Default)]
pub struct GamePhaseClock {
    schedule: ScheduleRule,
}

impl GamePhaseClock {
    pub fn new(schedule: ScheduleRule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &ScheduleRule {
        &self.schedule
    }

    /// The single phase in effect at `now`.
    pub fn current_phase(&self, now: DateTime<Utc>) -> Phase {
        self.schedule.phase_at(now)
    }

    /// The next scheduled boundary strictly after `now`, whatever its kind.
    pub fn next_boundary(&self, now: DateTime<Utc>) -> Result<Transition, ClockError> {
        self.schedule.next_boundary(now)
    }

    /// Instant of the next scheduled boundary strictly after `now`.
    pub fn next_transition(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        self.next_boundary(now).map(|t| t.at)
    }

    /// Evaluate the full status at `now`.
    ///
    /// With `forced` set, the reported phase is the forced one and the target
    /// is the next instant at which that phase would end under the schedule.
    pub fn status(
        &self,
        now: DateTime<Utc>,
        forced: Option<Phase>,
    ) -> Result<GameStatus, ClockError> {
        let (phase, target) = match forced {
            Some(phase) => {
                let end = ScheduleRule::end_kind(phase);
                let t = self.schedule.next_boundary_where(now, |k| *k == end)?;
                (phase, t)
            }
            None => (self.current_phase(now), self.next_boundary(now)?),
        };
        trace!(%now, %phase, next = ?target.kind, "evaluated game clock");

        Ok(GameStatus {
            evaluated_at: now,
            phase,
            label: phase.countdown_label(),
            target_time: target.at,
            countdown: countdown_string(target.at, now),
            show_enter_button: entry_allowed(phase),
            forced: forced.is_some(),
        })
    }

    /// The draft-open instant of the competition week containing `now`.
    pub fn week_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        self.schedule.week_start(now)
    }

    /// Cull and week-end timers at `now`.
    pub fn week_timers(&self, now: DateTime<Utc>) -> Result<WeekTimers, ClockError> {
        WeekTimers::at(self, now)
    }

    /// Evaluate the status for a raw timestamp supplied by the host.
    ///
    /// A missing timestamp is an error, not a request for the current time.
    pub fn status_from_input(
        &self,
        raw: Option<&str>,
        forced: Option<Phase>,
    ) -> Result<GameStatus, ClockError> {
        let raw = raw.ok_or_else(|| ClockError::invalid_input("timestamp is missing"))?;
        let now = parse_instant(raw)?;
        self.status(now, forced)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::CLOSED;
    use crate::schedule::BoundaryKind;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn et(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn clock() -> GamePhaseClock {
        GamePhaseClock::default()
    }

    // 2025-06-02 is a Monday.

    #[test]
    fn draft_open_one_second_before_close() {
        let now = et(2025, 6, 2, 9, 29, 59);
        let status = clock().status(now, None).unwrap();
        assert_eq!(status.phase, Phase::DraftOpen);
        assert!(status.show_enter_button);
        assert_eq!(status.target_time, et(2025, 6, 2, 9, 30, 0));
        assert_eq!(status.countdown, "00:00:01");
        assert_eq!(status.label, "Draft Closes In:");
    }

    #[test]
    fn trading_starts_exactly_at_draft_close() {
        let now = et(2025, 6, 2, 9, 30, 0);
        let status = clock().status(now, None).unwrap();
        assert_eq!(status.phase, Phase::TradingWeek);
        assert!(!status.show_enter_button);
        // Next boundary is Tuesday's cull.
        assert_eq!(status.target_time, et(2025, 6, 3, 16, 0, 0));
        assert_eq!(status.countdown, "1 day, 06:30:00");
    }

    #[test]
    fn final_hour_on_friday_afternoon() {
        let now = et(2025, 6, 6, 15, 30, 0);
        let c = clock();
        assert_eq!(c.current_phase(now), Phase::FinalHour);
        assert_eq!(c.next_transition(now).unwrap(), et(2025, 6, 6, 16, 0, 0));
    }

    #[test]
    fn week_end_instant_starts_intermission() {
        let now = et(2025, 6, 6, 16, 0, 0);
        let c = clock();
        assert_eq!(c.current_phase(now), Phase::Intermission);
        assert_eq!(c.next_transition(now).unwrap(), et(2025, 6, 9, 0, 0, 0));
    }

    #[test]
    fn saturday_waits_for_monday_draft() {
        let now = et(2025, 6, 7, 12, 0, 0);
        let c = clock();
        assert_eq!(c.current_phase(now), Phase::Intermission);
        let next = c.next_boundary(now).unwrap();
        assert_eq!(next.kind, BoundaryKind::DraftOpen);
        assert_eq!(next.at, et(2025, 6, 9, 0, 0, 0));
    }

    #[test]
    fn midnight_monday_opens_draft() {
        let now = et(2025, 6, 9, 0, 0, 0);
        assert_eq!(clock().current_phase(now), Phase::DraftOpen);
    }

    #[test]
    fn forced_phase_targets_end_of_forced_phase() {
        // Saturday, but forced into the final hour: target is next Friday 16:00.
        let now = et(2025, 6, 7, 12, 0, 0);
        let status = clock().status(now, Some(Phase::FinalHour)).unwrap();
        assert!(status.forced);
        assert_eq!(status.phase, Phase::FinalHour);
        assert_eq!(status.target_time, et(2025, 6, 13, 16, 0, 0));
        assert!(!status.show_enter_button);

        let status = clock().status(now, Some(Phase::DraftOpen)).unwrap();
        assert!(status.show_enter_button);
        assert_eq!(status.target_time, et(2025, 6, 9, 9, 30, 0));
    }

    #[test]
    fn status_countdown_is_never_closed() {
        let c = clock();
        let mut now = et(2025, 6, 1, 0, 0, 0);
        let end = et(2025, 6, 16, 0, 0, 0);
        while now < end {
            let status = c.status(now, None).unwrap();
            assert!(status.target_time > now);
            assert_ne!(status.countdown, CLOSED);
            now += chrono::Duration::minutes(17);
        }
    }

    #[test]
    fn missing_input_is_rejected() {
        let err = clock().status_from_input(None, None).unwrap_err();
        assert!(matches!(err, ClockError::InvalidInput { .. }));
    }

    #[test]
    fn malformed_input_is_rejected() {
        for raw in ["", "   ", "yesterday", "2025-13-40T00:00:00Z", "2025-06-02 09:30"] {
            let err = clock().status_from_input(Some(raw), None).unwrap_err();
            assert!(matches!(err, ClockError::InvalidInput { .. }), "{raw:?}");
        }
    }

    #[test]
    fn offset_input_is_normalized() {
        let status = clock()
            .status_from_input(Some("2025-06-02T09:29:59-04:00"), None)
            .unwrap();
        assert_eq!(status.phase, Phase::DraftOpen);
        assert_eq!(status.evaluated_at, et(2025, 6, 2, 9, 29, 59));
    }

    #[test]
    fn status_serializes_for_display_layers() {
        let status = clock().status(et(2025, 6, 7, 12, 0, 0), None).unwrap();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "INTERMISSION");
        assert_eq!(json["show_enter_button"], false);
        assert_eq!(json["countdown"], "1 day, 12:00:00");
    }
}
