//! Shared compare-and-swap access to profile rows.
//!
//! Every balance/inventory mutation in the engines goes through
//! [`update_guarded`]: read the row and its version, apply a pure mutation
//! to the typed state, write back predicated on the version still matching.
//! A predicate miss is surfaced as a retryable `ConcurrentModification`,
//! never merged or overwritten.

use chrono::Utc;
use economy_core::types::UserEconomyState;
use economy_core::{EconomyError, Result};
use economy_db::models::DbProfile;
use economy_db::repositories::ProfileRepository;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

/// Load a profile's typed state plus the version to guard writes with.
pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<(UserEconomyState, i64)> {
    let row = ProfileRepository::get(pool, user_id)
        .await?
        .ok_or(EconomyError::UserNotFound(user_id))?;
    let version = row.version;
    Ok((row.into_state()?, version))
}

/// Write a mutated state back, gated on the version read by [`load`].
pub async fn store(
    pool: &PgPool,
    state: &UserEconomyState,
    expected_version: i64,
) -> Result<()> {
    let row = DbProfile::from_state(state, expected_version, Utc::now());
    if ProfileRepository::update_guarded(pool, &row, expected_version).await? {
        Ok(())
    } else {
        economy_metrics::counters::cas_conflicts("profile");
        Err(EconomyError::ConcurrentModification("profile"))
    }
}

/// Load-mutate-store with a bounded number of retries on predicate misses.
///
/// `attempts = 1` is the normal path: the loser of a race sees the conflict
/// and decides whether to retry. Larger values are reserved for
/// must-eventually-succeed steps that run after an irreversible write (e.g.
/// post-settlement balance movement), where giving up would tear state.
pub async fn update_guarded<F>(
    pool: &PgPool,
    user_id: Uuid,
    attempts: u32,
    mut mutate: F,
) -> Result<UserEconomyState>
where
    F: FnMut(&mut UserEconomyState) -> Result<()>,
{
    let mut last_err = EconomyError::ConcurrentModification("profile");
    for attempt in 0..attempts.max(1) {
        let (mut state, version) = load(pool, user_id).await?;
        mutate(&mut state)?;
        match store(pool, &state, version).await {
            Ok(()) => return Ok(state),
            Err(err @ EconomyError::ConcurrentModification(_)) => {
                debug!(user = %user_id, attempt, "Profile write lost the race");
                last_err = err;
            }
            Err(other) => return Err(other),
        }
    }
    if attempts > 1 {
        warn!(user = %user_id, attempts, "Profile update exhausted retries");
    }
    Err(last_err)
}

/// Create an empty profile if the user has none yet (idempotent).
pub async fn ensure_exists(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let row = DbProfile::new(user_id, Utc::now());
    ProfileRepository::insert_if_absent(pool, &row).await?;
    Ok(())
}
