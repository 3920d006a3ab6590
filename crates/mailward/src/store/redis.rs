//! Redis-backed attempt store.
//!
//! The active challenge lives under its own key written with `SET NX`, so
//! the first-writer-wins guarantee holds across processes. Key TTLs are a
//! garbage-collection backstop only; code expiry is always decided by the
//! stored timestamp, and the keys deliberately outlive it so an expired
//! submission still reads as expired rather than missing.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use wicket_common::WicketError;
use wicket_common::constants::{CHALLENGE_LINGER_SECS, store_keys};

use super::{AttemptId, AttemptStore};
use crate::challenge::{ActiveChallenge, OtpAttemptState};

/// Attempt store shared across service instances, reached through an
/// auto-reconnecting connection manager.
#[derive(Clone)]
pub struct RedisAttemptStore {
    conn: ConnectionManager,
}

impl RedisAttemptStore {
    /// Connect to Redis at `url`
    pub async fn connect(url: &str) -> Result<Self, WicketError> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = ConnectionManager::new(client).await.map_err(store_err)?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn challenge_key(attempt: &AttemptId) -> String {
        format!("{}{}", store_keys::CHALLENGE_PREFIX, attempt)
    }

    fn last_sent_key(attempt: &AttemptId) -> String {
        format!("{}{}", store_keys::LAST_SENT_PREFIX, attempt)
    }
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn fetch(&self, attempt: &AttemptId) -> Result<OtpAttemptState, WicketError> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn
            .get(Self::challenge_key(attempt))
            .await
            .map_err(store_err)?;
        let active = match raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        let last_sent_at: Option<i64> = conn
            .get(Self::last_sent_key(attempt))
            .await
            .map_err(store_err)?;

        Ok(OtpAttemptState {
            active,
            last_sent_at,
        })
    }

    async fn install_challenge(
        &self,
        attempt: &AttemptId,
        challenge: &ActiveChallenge,
        sent_at: i64,
    ) -> Result<bool, WicketError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(challenge)?;
        let guard_secs = (challenge.expires_at - sent_at).max(0) as u64 + CHALLENGE_LINGER_SECS;

        // NX: only the first writer for this attempt lands.
        let written: Option<String> = redis::cmd("SET")
            .arg(Self::challenge_key(attempt))
            .arg(&payload)
            .arg("NX")
            .arg("EX")
            .arg(guard_secs)
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;

        if written.is_none() {
            return Ok(false);
        }

        // Only the winner stamps the dispatch time.
        conn.set_ex::<_, _, ()>(Self::last_sent_key(attempt), sent_at, guard_secs)
            .await
            .map_err(store_err)?;

        Ok(true)
    }

    async fn clear_challenge(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(Self::challenge_key(attempt))
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn remove(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(vec![Self::challenge_key(attempt), Self::last_sent_key(attempt)])
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

fn store_err(err: redis::RedisError) -> WicketError {
    WicketError::Store(err.to_string())
}
