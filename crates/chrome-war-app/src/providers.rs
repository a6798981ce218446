// External collaborators: identity provider and record store.
//
// The game only talks to these through the traits below. The in-memory
// implementations back the console binary and the tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chrome_war_core::lineup::{CoreKey, LockedLineup};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no user is signed in")]
    NotSignedIn,

    #[error("identity provider failed: {0}")]
    Provider(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no profile for user {user_id}")]
    NotFound { user_id: String },

    #[error("user {user_id} already locked a lineup for the week of {week_start}")]
    AlreadyLocked {
        user_id: String,
        week_start: DateTime<Utc>,
    },

    #[error("core {0} is already locked this week")]
    CoreTaken(CoreKey),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

/// A lineup locked for one competition week, identified by the week's
/// draft-open instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyLock {
    pub week_start: DateTime<Utc>,
    pub lineup: LockedLineup,
}

/// A player's stored profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Two-letter US state code of residence, if known.
    pub state: Option<String>,
    /// Saved, possibly partial, draft in slot order. Cleared by a lock.
    pub draft_lineup: Vec<String>,
    /// The most recent lock, whichever week it belongs to.
    pub last_lock: Option<WeeklyLock>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        UserProfile {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// The lineup locked for the week starting at `week_start`, if any.
    pub fn lock_for(&self, week_start: DateTime<Utc>) -> Option<&LockedLineup> {
        self.last_lock
            .as_ref()
            .filter(|l| l.week_start == week_start)
            .map(|l| &l.lineup)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<Session>, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, StoreError>;

    /// Replace the saved draft for `user_id`.
    async fn upsert_draft_lineup(&self, user_id: &str, symbols: &[String])
        -> Result<(), StoreError>;

    /// Record `lineup` as `user_id`'s lock for the week starting at
    /// `week_start` and clear the saved draft.
    ///
    /// Must be atomic: the uniqueness checks and the write are one operation.
    /// Fails with `AlreadyLocked` when the user has a lock for that week and
    /// with `CoreTaken` when another user locked the same core key that week.
    async fn lock_lineup_if_unique(
        &self,
        user_id: &str,
        week_start: DateTime<Utc>,
        lineup: &LockedLineup,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory identity
// ---------------------------------------------------------------------------

/// Holds at most one signed-in session.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    session: Mutex<Option<Session>>,
}

impl StaticIdentity {
    pub fn signed_in(session: Session) -> Self {
        StaticIdentity {
            session: Mutex::new(Some(session)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<Session>, AuthError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| AuthError::Provider(format!("session lock poisoned: {e}")))?;
        Ok(guard.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| AuthError::Provider(format!("session lock poisoned: {e}")))?;
        *guard = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory record store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn insert_profile(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.profiles()?.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    fn profiles(&self) -> Result<MutexGuard<'_, HashMap<String, UserProfile>>, StoreError> {
        self.profiles
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("profile lock poisoned: {e}")))
    }

    fn not_found(user_id: &str) -> StoreError {
        StoreError::NotFound {
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        self.profiles()?
            .get(user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(user_id))
    }

    async fn upsert_draft_lineup(
        &self,
        user_id: &str,
        symbols: &[String],
    ) -> Result<(), StoreError> {
        let mut profiles = self.profiles()?;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| Self::not_found(user_id))?;
        profile.draft_lineup = symbols.to_vec();
        Ok(())
    }

    async fn lock_lineup_if_unique(
        &self,
        user_id: &str,
        week_start: DateTime<Utc>,
        lineup: &LockedLineup,
    ) -> Result<(), StoreError> {
        // One guard for the checks and the write.
        let mut profiles = self.profiles()?;

        let own = profiles.get(user_id).ok_or_else(|| Self::not_found(user_id))?;
        if own.lock_for(week_start).is_some() {
            return Err(StoreError::AlreadyLocked {
                user_id: user_id.to_string(),
                week_start,
            });
        }

        let taken = profiles.values().any(|p| {
            p.user_id != user_id
                && p.lock_for(week_start)
                    .is_some_and(|l| l.core_key == lineup.core_key)
        });
        if taken {
            return Err(StoreError::CoreTaken(lineup.core_key.clone()));
        }

        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| Self::not_found(user_id))?;
        profile.draft_lineup.clear();
        profile.last_lock = Some(WeeklyLock {
            week_start,
            lineup: lineup.clone(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
