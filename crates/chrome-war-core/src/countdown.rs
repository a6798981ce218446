// Countdown formatting for phase and cull timers.

use chrono::{DateTime, Duration, Utc};

/// Shown instead of a duration once the target has been reached.
pub const CLOSED: &str = "closed";

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Which registered format to render a countdown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStyle {
    /// `HH:MM:SS`; hours keep accumulating past 24.
    Clock,
    /// `"<n> day(s), HH:MM:SS"` once at least one full day remains, otherwise
    /// the clock form.
    Days,
}

/// Countdown from `now` to `target`, in the day form when a full day or more
/// remains. Returns [`CLOSED`] when `target <= now`.
pub fn countdown_string(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    countdown_with_style(target, now, CountdownStyle::Days)
}

/// Countdown from `now` to `target` in the given style. Returns [`CLOSED`]
/// when `target <= now`.
pub fn countdown_with_style(
    target: DateTime<Utc>,
    now: DateTime<Utc>,
    style: CountdownStyle,
) -> String {
    match remaining_secs(target, now) {
        Some(secs) => format_secs(secs, style),
        None => CLOSED.to_string(),
    }
}

/// Whole seconds left until `target`, rounded up so that any positive
/// remainder counts as at least one second. `None` once `target <= now`.
pub fn remaining_secs(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    if target <= now {
        return None;
    }
    let delta: Duration = target - now;
    let whole = delta.num_seconds();
    let has_fraction = delta - Duration::seconds(whole) > Duration::zero();
    Some(if has_fraction { whole + 1 } else { whole })
}

/// Render a non-negative number of seconds.
pub fn format_secs(total: i64, style: CountdownStyle) -> String {
    let total = total.max(0);
    match style {
        CountdownStyle::Days if total >= SECS_PER_DAY => {
            let days = total / SECS_PER_DAY;
            let unit = if days == 1 { "day" } else { "days" };
            format!("{days} {unit}, {}", clock(total % SECS_PER_DAY))
        }
        _ => clock(total),
    }
}

fn clock(total: i64) -> String {
    let hours = total / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Decode a string produced by this module back into seconds. Returns `None`
/// for [`CLOSED`] or anything unrecognised.
pub fn parse_countdown(s: &str) -> Option<i64> {
    let (days, clock_part) = match s.split_once(", ") {
        Some((day_part, rest)) => {
            let (n, unit) = day_part.split_once(' ')?;
            if unit != "day" && unit != "days" {
                return None;
            }
            (n.parse::<i64>().ok()?, rest)
        }
        None => (0, s),
    };

    let mut fields = clock_part.split(':');
    let (Some(h), Some(m), Some(sec), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return None;
    };
    let (h, m, sec) = (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?, sec.parse::<i64>().ok()?);
    if m >= 60 || sec >= 60 {
        return None;
    }
    Some(days * SECS_PER_DAY + h * SECS_PER_HOUR + m * SECS_PER_MINUTE + sec)
}
