//! One-time code lifecycle: per-attempt state, submission evaluation,
//! resend arithmetic.

mod generator;
mod manager;

pub use generator::CodeGenerator;
pub use manager::OtpChallengeManager;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use wicket_common::SubmissionOutcome;

/// The code currently in flight for an attempt.
///
/// A code and its expiry only exist together; regeneration replaces the
/// pair wholesale, never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveChallenge {
    /// The secret digits
    pub code: String,
    /// Unix time at and after which the code is no longer acceptable
    pub expires_at: i64,
}

/// Everything the engine remembers about one authentication attempt.
///
/// `last_sent_at` lives outside [`ActiveChallenge`] because it must
/// survive a reset: cancelling and re-entering the step does not shorten
/// the wait before the next resend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpAttemptState {
    #[serde(default)]
    pub active: Option<ActiveChallenge>,

    /// Unix time of the most recent dispatch, successful or not
    #[serde(default)]
    pub last_sent_at: Option<i64>,
}

impl OtpAttemptState {
    /// Whether a code is currently in flight
    pub fn is_challenged(&self) -> bool {
        self.active.is_some()
    }
}

/// Check an entered code against the attempt state.
///
/// Match is exact: case-sensitive, no trimming, no normalization. A
/// matching code at or past `expires_at` is `Expired`, never `Valid`;
/// mismatch is reported without looking at expiry at all, so the caller
/// can keep the two audit trails separate.
pub fn evaluate_submission(state: &OtpAttemptState, entered: &str, now: i64) -> SubmissionOutcome {
    let Some(active) = &state.active else {
        return SubmissionOutcome::NoActiveCode;
    };

    if !codes_match(entered, &active.code) {
        return SubmissionOutcome::Invalid;
    }

    if now >= active.expires_at {
        SubmissionOutcome::Expired
    } else {
        SubmissionOutcome::Valid
    }
}

/// Whole seconds until a resend may be requested; 0 when nothing was ever
/// sent. Saturates at 0 and never increases as `now` advances.
pub fn resend_wait_remaining(state: &OtpAttemptState, resend_wait_secs: u64, now: i64) -> u64 {
    match state.last_sent_at {
        None => 0,
        Some(sent_at) => {
            let elapsed = now.saturating_sub(sent_at).max(0) as u64;
            resend_wait_secs.saturating_sub(elapsed)
        }
    }
}

/// Equality over SHA-256 digests: the comparison cost does not depend on
/// how much of a prefix the guess shares with the real code.
fn codes_match(entered: &str, expected: &str) -> bool {
    Sha256::digest(entered.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenged(code: &str, expires_at: i64) -> OtpAttemptState {
        OtpAttemptState {
            active: Some(ActiveChallenge {
                code: code.to_string(),
                expires_at,
            }),
            last_sent_at: Some(0),
        }
    }

    #[test]
    fn test_valid_before_expiry() {
        let state = challenged("493817", 300);
        assert_eq!(
            evaluate_submission(&state, "493817", 299),
            SubmissionOutcome::Valid
        );
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let state = challenged("493817", 300);
        assert_eq!(
            evaluate_submission(&state, "493817", 300),
            SubmissionOutcome::Expired
        );
        assert_eq!(
            evaluate_submission(&state, "493817", 301),
            SubmissionOutcome::Expired
        );
    }

    #[test]
    fn test_mismatch_is_invalid_even_after_expiry() {
        let state = challenged("493817", 300);
        assert_eq!(
            evaluate_submission(&state, "111111", 10),
            SubmissionOutcome::Invalid
        );
        // Expiry is never consulted for a mismatch.
        assert_eq!(
            evaluate_submission(&state, "111111", 9999),
            SubmissionOutcome::Invalid
        );
    }

    #[test]
    fn test_no_normalization() {
        let state = challenged("493817", 300);
        assert_eq!(
            evaluate_submission(&state, " 493817", 10),
            SubmissionOutcome::Invalid
        );
        assert_eq!(
            evaluate_submission(&state, "0493817", 10),
            SubmissionOutcome::Invalid
        );
        assert_eq!(
            evaluate_submission(&state, "", 10),
            SubmissionOutcome::Invalid
        );
    }

    #[test]
    fn test_no_active_code() {
        let state = OtpAttemptState::default();
        assert_eq!(
            evaluate_submission(&state, "493817", 10),
            SubmissionOutcome::NoActiveCode
        );
    }

    #[test]
    fn test_resend_wait_counts_down_and_floors() {
        let state = challenged("493817", 300);
        let waits: Vec<u64> = [0, 10, 29, 30, 31, 500]
            .iter()
            .map(|now| resend_wait_remaining(&state, 30, *now))
            .collect();
        assert_eq!(waits, vec![30, 20, 1, 0, 0, 0]);

        // Monotonically non-increasing.
        for pair in waits.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_resend_always_allowed_before_first_send() {
        let state = OtpAttemptState::default();
        assert_eq!(resend_wait_remaining(&state, 3600, 0), 0);
    }

    #[test]
    fn test_reset_keeps_resend_wait() {
        let mut state = challenged("493817", 300);
        let before = resend_wait_remaining(&state, 30, 10);
        state.active = None;
        assert_eq!(resend_wait_remaining(&state, 30, 10), before);
    }
}
