// Chrome War console entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Report the signed-in player, if any
// 4. One-shot mode: `--at <RFC 3339 timestamp>` prints a JSON status and exits
// 5. Otherwise spawn the ticker and redraw the status line until Ctrl+C

use std::io::Write;
use std::sync::Arc;

use chrome_war_app::config;
use chrome_war_app::draft;
use chrome_war_app::providers::{
    IdentityProvider, MemoryStore, Session, StaticIdentity, UserProfile,
};
use chrome_war_app::ticker::{self, ClockSnapshot};
use chrome_war_core::GamePhaseClock;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Chrome War starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, timezone={}, {} culls, refresh={:?}",
        config.league.name,
        config.schedule.timezone(),
        config.schedule.drops().len(),
        config.display.refresh_interval
    );
    let clock = GamePhaseClock::new(config.schedule.clone());
    let forced = config.display.forced_phase;

    // 3. Identity
    let identity = match &config.credentials.user_id {
        Some(user_id) => StaticIdentity::signed_in(Session {
            user_id: user_id.clone(),
            email: config.credentials.email.clone(),
        }),
        None => StaticIdentity::signed_out(),
    };
    let store = Arc::new(MemoryStore::new());
    let desk = draft::DraftDesk::new(clock.clone(), store.clone())
        .with_blocked_states(config.eligibility.blocked_states.clone())
        .with_forced_phase(forced);

    match draft::current_user(&identity).await {
        Ok(session) => {
            store
                .insert_profile(UserProfile::new(session.user_id.clone()))
                .context("failed to seed player profile")?;
            let lineup = desk.load_draft(&session, chrono::Utc::now()).await?;
            info!(
                "Signed in as {} ({}/{} slots drafted)",
                session.user_id,
                lineup.filled(),
                chrome_war_core::lineup::TOTAL_SLOTS
            );
        }
        Err(e) => info!("No player session: {}", e),
    }

    // 4. One-shot mode
    let mut args = std::env::args().skip(1);
    if let Some(flag) = args.next() {
        anyhow::ensure!(flag == "--at", "unknown argument `{flag}` (expected --at <timestamp>)");
        let raw = args.next();
        let status = clock
            .status_from_input(raw.as_deref(), forced)
            .context("failed to evaluate game clock")?;
        let timers = clock.week_timers(status.evaluated_at)?;
        let snap = ClockSnapshot::Ready { status, timers };
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    // 5. Live display
    println!("{} - {}", config.league.name, config.league.tagline);

    let (tx, mut rx) = mpsc::channel(16);
    let ticker_handle = tokio::spawn(ticker::run(
        clock,
        forced,
        config.display.refresh_interval,
        tx,
    ));

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            snap = rx.recv() => {
                let Some(snap) = snap else {
                    error!("Ticker stopped unexpectedly");
                    break;
                };
                write!(stdout, "\r\x1b[2K{}", ticker::render_line(&snap))?;
                stdout.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }
    writeln!(stdout)?;

    drop(rx);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), ticker_handle).await;

    if let Err(e) = identity.sign_out().await {
        error!("Sign-out failed: {}", e);
    }

    info!("Chrome War shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal shows the countdown).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("chrome-war.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chrome_war=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
