// Weekly timetable: draft window, culls, final hour, and week end.
//
// All boundaries are civil times in a named IANA zone (America/New_York by
// default). Weeks run from Monday 00:00 local.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClockError;
use crate::phase::Phase;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

const SECS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// WeeklyTime
// ---------------------------------------------------------------------------

/// A civil time on a given weekday, e.g. `Mon 09:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeeklyTime {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl WeeklyTime {
    /// Build from a weekday and an hour/minute pair. Returns `None` when the
    /// hour or minute is out of range.
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|time| WeeklyTime { weekday, time })
    }

    /// Seconds since Monday 00:00 of the same week.
    pub fn week_offset_secs(&self) -> i64 {
        i64::from(self.weekday.num_days_from_monday()) * SECS_PER_DAY
            + i64::from(self.time.num_seconds_from_midnight())
    }
}

impl fmt::Display for WeeklyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.time.format("%H:%M"))
    }
}

impl FromStr for WeeklyTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(day), Some(clock), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected `<weekday> HH:MM`, got `{s}`"));
        };
        let weekday: Weekday = day
            .parse()
            .map_err(|_| format!("unknown weekday `{day}`"))?;
        let time = NaiveTime::parse_from_str(clock, "%H:%M")
            .map_err(|e| format!("invalid time `{clock}`: {e}"))?;
        Ok(WeeklyTime { weekday, time })
    }
}

impl TryFrom<String> for WeeklyTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeeklyTime> for String {
    fn from(value: WeeklyTime) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

/// What happens at a scheduled boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryKind {
    DraftOpen,
    DraftClose,
    /// A cull checkpoint; `number` is 1-based in schedule order.
    Drop { number: u8 },
    FinalHourStart,
    WeekEnd,
}

/// A boundary resolved to an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: BoundaryKind,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ScheduleRule
// ---------------------------------------------------------------------------

/// Raw timetable as it appears in configuration. Validated into a
/// [`ScheduleRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub draft_open: WeeklyTime,
    pub draft_close: WeeklyTime,
    pub drops: Vec<WeeklyTime>,
    pub final_hour_start: WeeklyTime,
    pub week_end: WeeklyTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let at = |weekday, hour, minute| WeeklyTime {
            weekday,
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
        };
        ScheduleConfig {
            timezone: DEFAULT_TIMEZONE.to_string(),
            draft_open: at(Weekday::Mon, 0, 0),
            draft_close: at(Weekday::Mon, 9, 30),
            drops: vec![
                at(Weekday::Tue, 16, 0),
                at(Weekday::Wed, 16, 0),
                at(Weekday::Thu, 16, 0),
            ],
            final_hour_start: at(Weekday::Fri, 15, 0),
            week_end: at(Weekday::Fri, 16, 0),
        }
    }
}

/// The validated weekly timetable. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRule {
    timezone: Tz,
    draft_open: WeeklyTime,
    draft_close: WeeklyTime,
    drops: Vec<WeeklyTime>,
    final_hour_start: WeeklyTime,
    week_end: WeeklyTime,
    /// Every boundary, sorted by position in the week.
    boundaries: Vec<(WeeklyTime, BoundaryKind)>,
}

impl Default for ScheduleRule {
    fn default() -> Self {
        Self::chrome_war()
    }
}

impl ScheduleRule {
    /// The standard Chrome War week in US Eastern time.
    pub fn chrome_war() -> Self {
        Self::build(chrono_tz::America::New_York, ScheduleConfig::default())
    }

    /// Validate a raw timetable.
    ///
    /// The week must read `draft_open < draft_close < final_hour_start <
    /// week_end` from Monday 00:00, and every drop must fall inside the
    /// trading window `[draft_close, final_hour_start)`.
    pub fn from_config(config: ScheduleConfig) -> Result<Self, ClockError> {
        let timezone: Tz = config.timezone.parse().map_err(|e| {
            ClockError::invalid_schedule("schedule.timezone", format!("{e}"))
        })?;

        let ordered = [
            ("schedule.draft_open", config.draft_open),
            ("schedule.draft_close", config.draft_close),
            ("schedule.final_hour_start", config.final_hour_start),
            ("schedule.week_end", config.week_end),
        ];
        for pair in ordered.windows(2) {
            let (prev_name, prev) = pair[0];
            let (name, at) = pair[1];
            if at.week_offset_secs() <= prev.week_offset_secs() {
                return Err(ClockError::invalid_schedule(
                    name,
                    format!("{at} must come after {prev_name} ({prev})"),
                ));
            }
        }

        if config.drops.len() > usize::from(u8::MAX) {
            return Err(ClockError::invalid_schedule(
                "schedule.drops",
                format!("at most {} drops are supported", u8::MAX),
            ));
        }

        let trading_start = config.draft_close.week_offset_secs();
        let trading_end = config.final_hour_start.week_offset_secs();
        let mut previous: Option<WeeklyTime> = None;
        for drop in &config.drops {
            let offset = drop.week_offset_secs();
            if offset < trading_start || offset >= trading_end {
                return Err(ClockError::invalid_schedule(
                    "schedule.drops",
                    format!(
                        "{drop} is outside the trading window {} .. {}",
                        config.draft_close, config.final_hour_start
                    ),
                ));
            }
            if let Some(prev) = previous {
                if offset <= prev.week_offset_secs() {
                    return Err(ClockError::invalid_schedule(
                        "schedule.drops",
                        format!("drops must be listed in order without repeats ({prev}, {drop})"),
                    ));
                }
            }
            previous = Some(*drop);
        }

        Ok(Self::build(timezone, config))
    }

    fn build(timezone: Tz, config: ScheduleConfig) -> Self {
        let mut boundaries = vec![
            (config.draft_open, BoundaryKind::DraftOpen),
            (config.draft_close, BoundaryKind::DraftClose),
            (config.final_hour_start, BoundaryKind::FinalHourStart),
            (config.week_end, BoundaryKind::WeekEnd),
        ];
        for (i, drop) in config.drops.iter().enumerate() {
            let number = u8::try_from(i + 1).unwrap_or(u8::MAX);
            boundaries.push((*drop, BoundaryKind::Drop { number }));
        }
        boundaries.sort_by_key(|(at, _)| at.week_offset_secs());

        ScheduleRule {
            timezone,
            draft_open: config.draft_open,
            draft_close: config.draft_close,
            drops: config.drops,
            final_hour_start: config.final_hour_start,
            week_end: config.week_end,
            boundaries,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn drops(&self) -> &[WeeklyTime] {
        &self.drops
    }

    /// Convert back to the raw configuration form.
    pub fn to_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            timezone: self.timezone.name().to_string(),
            draft_open: self.draft_open,
            draft_close: self.draft_close,
            drops: self.drops.clone(),
            final_hour_start: self.final_hour_start,
            week_end: self.week_end,
        }
    }

    /// The phase in effect at `now`: the phase opened by the latest draft
    /// open, draft close, final-hour start or week end at or before `now`.
    ///
    /// Boundaries are resolved to instants exactly as `next_boundary_where`
    /// resolves them, so the phase only ever changes at an instant that
    /// `next_boundary` reports, even when a configured time falls in a DST
    /// gap or overlap.
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        self.resolved_boundaries(now)
            .filter(|(_, _, kind)| !matches!(kind, BoundaryKind::Drop { .. }))
            .filter(|(at, _, _)| *at <= now)
            .max_by_key(|(at, order, _)| (*at, *order))
            .map(|(_, _, kind)| Self::phase_opened_by(kind))
            .unwrap_or(Phase::Intermission)
    }

    /// The boundary at which `phase` ends.
    pub fn end_kind(phase: Phase) -> BoundaryKind {
        match phase {
            Phase::DraftOpen => BoundaryKind::DraftClose,
            Phase::TradingWeek => BoundaryKind::FinalHourStart,
            Phase::FinalHour => BoundaryKind::WeekEnd,
            Phase::Intermission => BoundaryKind::DraftOpen,
        }
    }

    fn phase_opened_by(kind: BoundaryKind) -> Phase {
        match kind {
            BoundaryKind::DraftOpen => Phase::DraftOpen,
            BoundaryKind::DraftClose | BoundaryKind::Drop { .. } => Phase::TradingWeek,
            BoundaryKind::FinalHourStart => Phase::FinalHour,
            BoundaryKind::WeekEnd => Phase::Intermission,
        }
    }

    /// The first boundary strictly after `now` whose kind matches `wanted`.
    pub fn next_boundary_where(
        &self,
        now: DateTime<Utc>,
        wanted: impl Fn(&BoundaryKind) -> bool,
    ) -> Result<Transition, ClockError> {
        self.resolved_boundaries(now)
            .filter(|(at, _, kind)| *at > now && wanted(kind))
            .min_by_key(|(at, order, _)| (*at, *order))
            .map(|(at, _, kind)| Transition { kind, at })
            .ok_or_else(|| {
                ClockError::invalid_input(format!(
                    "no schedule boundary after {now} within the supported date range"
                ))
            })
    }

    /// The next boundary of any kind strictly after `now`.
    pub fn next_boundary(&self, now: DateTime<Utc>) -> Result<Transition, ClockError> {
        self.next_boundary_where(now, |_| true)
    }

    /// The draft-open instant of the competition week containing `now`:
    /// the latest draft open at or before `now`. Identifies the week for
    /// anything recorded once per week.
    pub fn week_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        self.resolved_boundaries(now)
            .filter(|(at, _, kind)| *kind == BoundaryKind::DraftOpen && *at <= now)
            .map(|(at, _, _)| at)
            .max()
            .ok_or_else(|| {
                ClockError::invalid_input(format!(
                    "no draft open at or before {now} within the supported date range"
                ))
            })
    }

    /// Every boundary of the previous, current and next local week around
    /// `now`, resolved to instants. The middle value orders boundaries that
    /// resolve to the same instant by their place in the timetable.
    fn resolved_boundaries(
        &self,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = (DateTime<Utc>, i64, BoundaryKind)> + '_ {
        let local = now.with_timezone(&self.timezone);
        let monday = local
            .date_naive()
            .checked_sub_days(Days::new(u64::from(local.weekday().num_days_from_monday())));

        monday
            .and_then(|m| m.checked_sub_days(Days::new(7)))
            .into_iter()
            .flat_map(move |first| {
                (0..3u64).flat_map(move |week| {
                    self.boundaries.iter().filter_map(move |(at, kind)| {
                        let date = week_day(first, week, at.weekday)?;
                        let instant = self.resolve_local(date.and_time(at.time))?;
                        let order = week as i64 * 7 * SECS_PER_DAY + at.week_offset_secs();
                        Some((instant, order, *kind))
                    })
                })
            })
    }

    /// Map a local civil time to an instant. Ambiguous times (DST fall-back)
    /// take the earlier instant; skipped times (spring-forward) move one hour
    /// later.
    fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
            LocalResult::None => {
                debug!("{naive} does not exist in {}; shifting past the gap", self.timezone.name());
                let shifted = naive.checked_add_signed(chrono::Duration::hours(1))?;
                self.timezone
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|t| t.with_timezone(&Utc))
            }
        }
    }
}

fn week_day(monday: NaiveDate, week: u64, weekday: Weekday) -> Option<NaiveDate> {
    monday.checked_add_days(Days::new(week * 7 + u64::from(weekday.num_days_from_monday())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
