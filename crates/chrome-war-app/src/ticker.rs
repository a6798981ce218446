// Polling loop that re-evaluates the game clock on a fixed cadence and
// forwards each snapshot to the display task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use chrome_war_core::{GamePhaseClock, GameStatus, Phase, WeekTimers};

/// One evaluation of the clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClockSnapshot {
    Ready {
        status: GameStatus,
        timers: WeekTimers,
    },
    /// The clock could not be evaluated; the display shows a placeholder.
    Unavailable {
        at: DateTime<Utc>,
        message: String,
    },
}

/// Evaluate the clock at `now`. Errors become `Unavailable`.
pub fn snapshot(clock: &GamePhaseClock, forced: Option<Phase>, now: DateTime<Utc>) -> ClockSnapshot {
    let result = clock
        .status(now, forced)
        .and_then(|status| Ok((status, clock.week_timers(now)?)));
    match result {
        Ok((status, timers)) => ClockSnapshot::Ready { status, timers },
        Err(e) => {
            warn!("clock evaluation failed at {now}: {e}");
            ClockSnapshot::Unavailable {
                at: now,
                message: e.to_string(),
            }
        }
    }
}

/// Single console line for a snapshot.
pub fn render_line(snapshot: &ClockSnapshot) -> String {
    match snapshot {
        ClockSnapshot::Ready { status, timers } => {
            let mut line = format!(
                "[{}] {} {} | {} | {}",
                status.phase,
                status.label,
                status.countdown,
                timers.drop_display(),
                timers.week_display()
            );
            if status.show_enter_button {
                line.push_str(" | ENTER DRAFT");
            }
            if status.forced {
                line.push_str(" (forced)");
            }
            line
        }
        ClockSnapshot::Unavailable { .. } => "[--] --:--:--".to_string(),
    }
}

/// Run the ticker against the system clock until the receiver is dropped.
pub async fn run(
    clock: GamePhaseClock,
    forced: Option<Phase>,
    cadence: Duration,
    tx: mpsc::Sender<ClockSnapshot>,
) {
    run_with(clock, forced, cadence, tx, Utc::now).await
}

/// Like [`run`], reading the time from `now` on every tick.
pub async fn run_with<F>(
    clock: GamePhaseClock,
    forced: Option<Phase>,
    cadence: Duration,
    tx: mpsc::Sender<ClockSnapshot>,
    now: F,
) where
    F: Fn() -> DateTime<Utc>,
{
    let mut interval = tokio::time::interval(cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snap = snapshot(&clock, forced, now());
                if tx.send(snap).await.is_err() {
                    debug!("snapshot receiver dropped, stopping ticker");
                    break;
                }
            }
            _ = tx.closed() => {
                debug!("snapshot receiver closed, stopping ticker");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn monday(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        // 2025-06-02 is on EDT (UTC-4).
        Utc.with_ymd_and_hms(2025, 6, 2, h + 4, m, s).unwrap()
    }

    #[test]
    fn snapshot_during_draft() {
        let snap = snapshot(&GamePhaseClock::default(), None, monday(9, 0, 0));
        match &snap {
            ClockSnapshot::Ready { status, timers } => {
                assert_eq!(status.phase, Phase::DraftOpen);
                assert_eq!(status.countdown, "00:30:00");
                assert_eq!(timers.next_drop.map(|d| d.number), Some(1));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        let line = render_line(&snap);
        assert!(line.starts_with("[DRAFT_OPEN] Draft Closes In: 00:30:00"), "{line}");
        assert!(line.ends_with("ENTER DRAFT"), "{line}");
    }

    #[test]
    fn forced_snapshot_is_marked() {
        let snap = snapshot(
            &GamePhaseClock::default(),
            Some(Phase::FinalHour),
            monday(9, 0, 0),
        );
        let line = render_line(&snap);
        assert!(line.starts_with("[FINAL_HOUR] Chrome War Ends In:"), "{line}");
        assert!(line.ends_with("(forced)"), "{line}");
    }

    #[test]
    fn unavailable_renders_placeholder() {
        let snap = ClockSnapshot::Unavailable {
            at: monday(9, 0, 0),
            message: "boom".into(),
        };
        assert_eq!(render_line(&snap), "[--] --:--:--");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_reevaluate_from_the_time_source() {
        let base = monday(9, 29, 58);
        let offset = Arc::new(AtomicI64::new(0));
        let source = {
            let offset = offset.clone();
            move || base + chrono::Duration::seconds(offset.fetch_add(1, Ordering::SeqCst))
        };

        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(run_with(
            GamePhaseClock::default(),
            None,
            Duration::from_secs(1),
            tx,
            source,
        ));

        let mut phases = Vec::new();
        let mut countdowns = Vec::new();
        for _ in 0..3 {
            match rx.recv().await {
                Some(ClockSnapshot::Ready { status, .. }) => {
                    phases.push(status.phase);
                    countdowns.push(status.countdown);
                }
                other => panic!("unexpected snapshot {other:?}"),
            }
        }
        assert_eq!(
            phases,
            vec![Phase::DraftOpen, Phase::DraftOpen, Phase::TradingWeek]
        );
        assert_eq!(countdowns[0], "00:00:02");
        assert_eq!(countdowns[1], "00:00:01");

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        run_with(
            GamePhaseClock::default(),
            None,
            Duration::from_millis(250),
            tx,
            || monday(10, 0, 0),
        )
        .await;
    }
}
