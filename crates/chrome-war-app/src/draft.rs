// Draft desk: saving, loading and locking a player's weekly lineup.
//
// Every operation names the acting session and the evaluation instant
// explicitly; the desk holds no session state of its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use chrome_war_core::lineup::{CoreKey, DraftLineup, LineupError, LockedLineup};
use chrome_war_core::{entry_allowed, ClockError, GamePhaseClock, Phase};

use crate::providers::{AuthError, IdentityProvider, RecordStore, Session, StoreError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("the draft is closed ({phase})")]
    DraftClosed { phase: Phase },

    #[error("a lineup is already locked for this week")]
    AlreadyLocked,

    #[error("core {0} has already been locked by another player")]
    CoreTaken(CoreKey),

    #[error("draft entry is not available in {state}")]
    Ineligible { state: String },

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Lineup(#[from] LineupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

// ---------------------------------------------------------------------------
// DraftDesk
// ---------------------------------------------------------------------------

pub struct DraftDesk {
    clock: GamePhaseClock,
    store: Arc<dyn RecordStore>,
    blocked_states: Vec<String>,
    forced_phase: Option<Phase>,
}

impl DraftDesk {
    pub fn new(clock: GamePhaseClock, store: Arc<dyn RecordStore>) -> Self {
        DraftDesk {
            clock,
            store,
            blocked_states: Vec::new(),
            forced_phase: None,
        }
    }

    /// Residents of these states may not enter the draft.
    pub fn with_blocked_states(mut self, states: Vec<String>) -> Self {
        self.blocked_states = states;
        self
    }

    /// Gate entry on `phase` instead of the schedule (demo mode).
    pub fn with_forced_phase(mut self, phase: Option<Phase>) -> Self {
        self.forced_phase = phase;
        self
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        self.forced_phase
            .unwrap_or_else(|| self.clock.current_phase(now))
    }

    /// Save the in-progress lineup. Partial lineups are fine.
    pub async fn save_draft(
        &self,
        session: &Session,
        lineup: &DraftLineup,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        self.ensure_open(now)?;
        let symbols = lineup.symbols();
        self.store
            .upsert_draft_lineup(&session.user_id, &symbols)
            .await?;
        debug!(user = %session.user_id, filled = symbols.len(), "saved draft");
        Ok(())
    }

    /// Load what the player has for the week containing `now`: this week's
    /// locked lineup if there is one, otherwise the saved draft. A player with
    /// no profile yet gets an empty lineup.
    pub async fn load_draft(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<DraftLineup, DraftError> {
        let profile = match self.store.get_user_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound { .. }) => return Ok(DraftLineup::new()),
            Err(e) => return Err(e.into()),
        };
        let week = self.clock.week_start(now)?;
        match profile.lock_for(week) {
            Some(locked) => Ok(DraftLineup::from_symbols(locked.symbols())?),
            None => Ok(DraftLineup::from_symbols(&profile.draft_lineup)?),
        }
    }

    /// Lock a complete lineup for the week containing `now`.
    ///
    /// The once-per-week and unique-core checks happen inside the store's
    /// atomic `lock_lineup_if_unique`.
    pub async fn lock_lineup(
        &self,
        session: &Session,
        lineup: &DraftLineup,
        now: DateTime<Utc>,
    ) -> Result<LockedLineup, DraftError> {
        self.ensure_open(now)?;
        let locked = LockedLineup::try_from(lineup)?;
        let week = self.clock.week_start(now)?;

        let profile = self.store.get_user_profile(&session.user_id).await?;
        if let Some(state) = &profile.state {
            if self.blocked_states.iter().any(|s| s.eq_ignore_ascii_case(state)) {
                warn!(user = %session.user_id, %state, "draft entry from blocked state");
                return Err(DraftError::Ineligible {
                    state: state.clone(),
                });
            }
        }

        match self
            .store
            .lock_lineup_if_unique(&session.user_id, week, &locked)
            .await
        {
            Ok(()) => {}
            Err(StoreError::AlreadyLocked { .. }) => return Err(DraftError::AlreadyLocked),
            Err(StoreError::CoreTaken(key)) => {
                debug!(user = %session.user_id, core = %key, "core already taken");
                return Err(DraftError::CoreTaken(key));
            }
            Err(e) => return Err(e.into()),
        }
        info!(user = %session.user_id, core = %locked.core_key, week = %week, "locked lineup");
        Ok(locked)
    }

    fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), DraftError> {
        let phase = self.phase_at(now);
        if entry_allowed(phase) {
            Ok(())
        } else {
            Err(DraftError::DraftClosed { phase })
        }
    }
}

/// The signed-in session, or `AuthError::NotSignedIn`.
pub async fn current_user(identity: &dyn IdentityProvider) -> Result<Session, DraftError> {
    identity
        .current_user()
        .await?
        .ok_or(DraftError::Auth(AuthError::NotSignedIn))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
