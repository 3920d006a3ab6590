//! In-process attempt store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wicket_common::WicketError;

use super::{AttemptId, AttemptStore};
use crate::challenge::{ActiveChallenge, OtpAttemptState};

/// Single-process store backed by a shared map.
///
/// Clones share the underlying map, so one instance can be handed to the
/// manager while the host (or a test) keeps its own handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttemptStore {
    records: Arc<RwLock<HashMap<AttemptId, OtpAttemptState>>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts currently tracked
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn fetch(&self, attempt: &AttemptId) -> Result<OtpAttemptState, WicketError> {
        Ok(self
            .records
            .read()
            .await
            .get(attempt)
            .cloned()
            .unwrap_or_default())
    }

    async fn install_challenge(
        &self,
        attempt: &AttemptId,
        challenge: &ActiveChallenge,
        sent_at: i64,
    ) -> Result<bool, WicketError> {
        let mut records = self.records.write().await;
        let record = records.entry(attempt.clone()).or_default();
        if record.active.is_some() {
            return Ok(false);
        }
        record.active = Some(challenge.clone());
        record.last_sent_at = Some(sent_at);
        Ok(true)
    }

    async fn clear_challenge(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        if let Some(record) = self.records.write().await.get_mut(attempt) {
            record.active = None;
        }
        Ok(())
    }

    async fn remove(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        self.records.write().await.remove(attempt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(code: &str) -> ActiveChallenge {
        ActiveChallenge {
            code: code.to_string(),
            expires_at: 300,
        }
    }

    #[tokio::test]
    async fn test_unknown_attempt_reads_empty() {
        let store = MemoryAttemptStore::new();
        let state = store.fetch(&AttemptId::from("nope")).await.unwrap();
        assert_eq!(state, OtpAttemptState::default());
    }

    #[tokio::test]
    async fn test_install_is_first_writer_wins() {
        let store = MemoryAttemptStore::new();
        let attempt = AttemptId::from("a1");

        assert!(
            store
                .install_challenge(&attempt, &challenge("111111"), 10)
                .await
                .unwrap()
        );
        assert!(
            !store
                .install_challenge(&attempt, &challenge("222222"), 20)
                .await
                .unwrap()
        );

        let state = store.fetch(&attempt).await.unwrap();
        assert_eq!(state.active.unwrap().code, "111111");
        assert_eq!(state.last_sent_at, Some(10));
    }

    #[tokio::test]
    async fn test_clear_keeps_last_sent() {
        let store = MemoryAttemptStore::new();
        let attempt = AttemptId::from("a1");
        store
            .install_challenge(&attempt, &challenge("111111"), 10)
            .await
            .unwrap();

        store.clear_challenge(&attempt).await.unwrap();
        let state = store.fetch(&attempt).await.unwrap();
        assert!(state.active.is_none());
        assert_eq!(state.last_sent_at, Some(10));

        // A cleared attempt accepts a fresh challenge again.
        assert!(
            store
                .install_challenge(&attempt, &challenge("333333"), 40)
                .await
                .unwrap()
        );
        let state = store.fetch(&attempt).await.unwrap();
        assert_eq!(state.last_sent_at, Some(40));
    }

    #[tokio::test]
    async fn test_remove_forgets_everything() {
        let store = MemoryAttemptStore::new();
        let attempt = AttemptId::from("a1");
        store
            .install_challenge(&attempt, &challenge("111111"), 10)
            .await
            .unwrap();

        store.remove(&attempt).await.unwrap();
        assert!(store.is_empty().await);
        let state = store.fetch(&attempt).await.unwrap();
        assert_eq!(state.last_sent_at, None);
    }

    #[tokio::test]
    async fn test_concurrent_installs_single_winner() {
        let store = MemoryAttemptStore::new();
        let attempt = AttemptId::from("race");

        let mut handles = Vec::new();
        for i in 0..8i64 {
            let store = store.clone();
            let attempt = attempt.clone();
            handles.push(tokio::spawn(async move {
                store
                    .install_challenge(&attempt, &challenge(&format!("{i:06}")), i)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
