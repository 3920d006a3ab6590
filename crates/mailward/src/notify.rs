//! Code delivery port.
//!
//! The engine does not know or care how a code travels to the user; it
//! only distinguishes "this user has no address at all" (fatal to the
//! attempt) from "the transport hiccupped" (logged and carried on).

use async_trait::async_trait;
use thiserror::Error;
use wicket_common::UserIdentity;

/// Why a dispatch did not reach the user
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The identity has no registered delivery address
    #[error("identity has no delivery address")]
    MissingAddress,

    /// The transport failed after an address was available
    #[error("delivery transport failed: {0}")]
    Transport(String),
}

/// Delivers a one-time code to the user's registered address
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch `code` to `user`. `ttl_secs` is the validity window, for
    /// use in the message copy.
    async fn send(
        &self,
        user: &dyn UserIdentity,
        code: &str,
        ttl_secs: u64,
    ) -> Result<(), DeliveryError>;
}

/// Logs the dispatch instead of delivering it. Development aid only; the
/// logged line contains the code.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        user: &dyn UserIdentity,
        code: &str,
        ttl_secs: u64,
    ) -> Result<(), DeliveryError> {
        let email = user.email().ok_or(DeliveryError::MissingAddress)?;
        tracing::info!(
            username = %user.username(),
            email = %email,
            code = %code,
            ttl_secs,
            "one-time code (not delivered)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoAddressUser;

    impl UserIdentity for NoAddressUser {
        fn username(&self) -> &str {
            "ghost"
        }

        fn email(&self) -> Option<&str> {
            None
        }
    }

    #[tokio::test]
    async fn test_log_notifier_reports_missing_address() {
        let result = LogNotifier.send(&NoAddressUser, "123456", 300).await;
        assert!(matches!(result, Err(DeliveryError::MissingAddress)));
    }
}
