//! Attempt-scoped persistence for challenge state.
//!
//! Durability and distribution are the store's concern; the engine only
//! needs a mutable record per attempt plus one conditional write, so that
//! duplicate concurrent requests cannot each issue a code.

mod memory;
mod redis;

pub use self::redis::RedisAttemptStore;
pub use memory::MemoryAttemptStore;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};
use wicket_common::WicketError;

use crate::challenge::{ActiveChallenge, OtpAttemptState};

/// Opaque key tying challenge state to one authentication attempt.
///
/// Hosts that already key their attempts (a session id, a flow execution
/// id) wrap that key; [`AttemptId::generate`] mints one otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(String);

impl AttemptId {
    /// Mint a random 128-bit attempt id
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AttemptId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AttemptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-attempt challenge state storage
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Read the attempt's state; an unknown attempt reads as empty
    async fn fetch(&self, attempt: &AttemptId) -> Result<OtpAttemptState, WicketError>;

    /// Write `challenge` and stamp `last_sent_at = sent_at` only if the
    /// attempt has no active challenge. Returns whether this caller's
    /// write landed; a `false` means another request got there first and
    /// its code is the live one.
    async fn install_challenge(
        &self,
        attempt: &AttemptId,
        challenge: &ActiveChallenge,
        sent_at: i64,
    ) -> Result<bool, WicketError>;

    /// Drop the active challenge, keeping `last_sent_at`
    async fn clear_challenge(&self, attempt: &AttemptId) -> Result<(), WicketError>;

    /// Delete the attempt's record entirely
    async fn remove(&self, attempt: &AttemptId) -> Result<(), WicketError>;
}
