//! Challenge decision logic.
//!
//! Every inbound interaction with the challenge step funnels through the
//! manager: first display, page reload, code entry, resend request,
//! cancel. The manager decides the transition and drives the side effects
//! (generation, conditional store write, dispatch); it keeps no state of
//! its own between calls.

use tracing::{debug, info, warn};
use wicket_common::{
    AbortReason, ChallengePresentation, ChallengeStart, FailureKind, FlowTransition, FormAction,
    FormSubmission, StepRequirement, SubmissionOutcome, UserIdentity, UserMessage, WicketError,
};

use super::{ActiveChallenge, CodeGenerator, OtpAttemptState, evaluate_submission,
    resend_wait_remaining};
use crate::clock::Clock;
use crate::config::OtpPolicy;
use crate::notify::{DeliveryError, Notifier};
use crate::store::{AttemptId, AttemptStore};

/// Email OTP challenge step engine
pub struct OtpChallengeManager<S, N, C> {
    policy: OtpPolicy,
    generator: CodeGenerator,
    store: S,
    notifier: N,
    clock: C,
}

impl<S, N, C> OtpChallengeManager<S, N, C>
where
    S: AttemptStore,
    N: Notifier,
    C: Clock,
{
    pub fn new(policy: OtpPolicy, store: S, notifier: N, clock: C) -> Self {
        let generator = CodeGenerator::from_policy(&policy);
        Self {
            policy,
            generator,
            store,
            notifier,
            clock,
        }
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure a code is in flight for `attempt`, issuing and
    /// dispatching one if needed.
    ///
    /// Reloading the challenge page lands here too: an attempt that
    /// already has an active code gets the same presentation back and no
    /// second email. When two duplicate requests race, the store's
    /// conditional write picks one winner and only the winner dispatches.
    pub async fn ensure_challenge_issued(
        &self,
        attempt: &AttemptId,
        user: &dyn UserIdentity,
    ) -> Result<ChallengeStart, WicketError> {
        let now = self.clock.now();
        let state = self.store.fetch(attempt).await?;

        if let Some(active) = &state.active {
            debug!(attempt = %attempt, "challenge already active, re-displaying");
            return Ok(ChallengeStart::Show(self.presentation(
                active, &state, now, false,
            )));
        }

        // Without an address no code can ever arrive, so the whole
        // attempt ends rather than re-prompting forever.
        if user.email().is_none() {
            warn!(
                attempt = %attempt,
                username = %user.username(),
                "no delivery address on file, aborting attempt"
            );
            return Ok(ChallengeStart::Aborted(AbortReason::NoDeliveryAddress));
        }

        let challenge = ActiveChallenge {
            code: self.generator.generate(),
            expires_at: now + self.policy.ttl_secs as i64,
        };

        if !self
            .store
            .install_challenge(attempt, &challenge, now)
            .await?
        {
            // A duplicate request won the race; its code is the live one
            // and it owns the dispatch.
            debug!(attempt = %attempt, "lost issuance race, presenting existing challenge");
            let state = self.store.fetch(attempt).await?;
            let Some(active) = state.active.clone() else {
                return Err(WicketError::Internal(
                    "challenge vanished during issuance".to_string(),
                ));
            };
            return Ok(ChallengeStart::Show(self.presentation(
                &active, &state, now, false,
            )));
        }

        if self.policy.disable_mailing {
            debug!(attempt = %attempt, "mailing disabled, skipping dispatch");
        } else {
            match self
                .notifier
                .send(user, &challenge.code, self.policy.ttl_secs)
                .await
            {
                Ok(()) => {
                    debug!(
                        attempt = %attempt,
                        username = %user.username(),
                        expires_at = challenge.expires_at,
                        "one-time code dispatched"
                    );
                }
                Err(DeliveryError::MissingAddress) => {
                    // Address disappeared between the check and the send.
                    warn!(
                        attempt = %attempt,
                        username = %user.username(),
                        "delivery address vanished, aborting attempt"
                    );
                    self.store.clear_challenge(attempt).await?;
                    return Ok(ChallengeStart::Aborted(AbortReason::NoDeliveryAddress));
                }
                Err(DeliveryError::Transport(err)) => {
                    // The challenge stays issued: surfacing transport
                    // trouble would leak infrastructure details, and the
                    // user can fall back to a resend.
                    warn!(
                        attempt = %attempt,
                        username = %user.username(),
                        error = %err,
                        "failed to dispatch one-time code"
                    );
                }
            }
        }

        Ok(ChallengeStart::Show(ChallengePresentation {
            expires_at: challenge.expires_at,
            expires_in_secs: self.policy.ttl_secs,
            resend_wait_secs: self.policy.resend_wait_secs,
            dispatched: true,
        }))
    }

    /// Classify a submitted challenge form and advance the state machine
    pub async fn handle_form(
        &self,
        attempt: &AttemptId,
        user: &dyn UserIdentity,
        form: &FormSubmission,
        requirement: StepRequirement,
    ) -> Result<FlowTransition, WicketError> {
        match form.action() {
            FormAction::Cancel => {
                self.reset_challenge(attempt).await?;
                info!(attempt = %attempt, username = %user.username(), "challenge cancelled");
                Ok(FlowTransition::Aborted(AbortReason::Cancelled))
            }

            FormAction::Resend => {
                let now = self.clock.now();
                let state = self.store.fetch(attempt).await?;
                let wait_secs = self.resend_wait_remaining(&state, now);

                if wait_secs > 0 {
                    debug!(attempt = %attempt, wait_secs, "resend throttled");
                    return Ok(FlowTransition::ReShow {
                        error: Some(UserMessage::ResendThrottled { wait_secs }),
                    });
                }

                self.reset_challenge(attempt).await?;
                match self.ensure_challenge_issued(attempt, user).await? {
                    ChallengeStart::Show(_) => Ok(FlowTransition::ReShow { error: None }),
                    ChallengeStart::Aborted(reason) => Ok(FlowTransition::Aborted(reason)),
                }
            }

            FormAction::Submit(entered) => {
                let now = self.clock.now();
                let state = self.store.fetch(attempt).await?;

                match evaluate_submission(&state, entered, now) {
                    SubmissionOutcome::Valid => {
                        // Spend the code; a replay must find nothing.
                        self.reset_challenge(attempt).await?;
                        info!(attempt = %attempt, username = %user.username(), "one-time code accepted");
                        Ok(FlowTransition::Success)
                    }

                    SubmissionOutcome::Expired => {
                        // The dead code is cleared so the re-shown form
                        // issues a fresh one; the throttle stamp stays.
                        self.reset_challenge(attempt).await?;
                        info!(attempt = %attempt, username = %user.username(), "one-time code expired");
                        Ok(FlowTransition::Failure(FailureKind::ExpiredCode))
                    }

                    SubmissionOutcome::Invalid => {
                        info!(attempt = %attempt, username = %user.username(), "one-time code rejected");
                        match requirement {
                            StepRequirement::Required => {
                                Ok(FlowTransition::Failure(FailureKind::InvalidCode))
                            }
                            StepRequirement::Alternative | StepRequirement::Conditional => {
                                Ok(FlowTransition::Attempted)
                            }
                        }
                    }

                    SubmissionOutcome::NoActiveCode => {
                        // Ordinarily unreachable: the form is only shown
                        // once a code exists. Recover by issuing one.
                        warn!(attempt = %attempt, "submission with no active code");
                        match self.ensure_challenge_issued(attempt, user).await? {
                            ChallengeStart::Show(_) => Ok(FlowTransition::ReShow { error: None }),
                            ChallengeStart::Aborted(reason) => {
                                Ok(FlowTransition::Aborted(reason))
                            }
                        }
                    }
                }
            }
        }
    }

    /// Seconds until this attempt may request another dispatch
    pub fn resend_wait_remaining(&self, state: &OtpAttemptState, now: i64) -> u64 {
        resend_wait_remaining(state, self.policy.resend_wait_secs, now)
    }

    /// Drop the active code. The dispatch timestamp survives, so the
    /// resend wait cannot be reset by cancelling and re-entering.
    pub async fn reset_challenge(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        self.store.clear_challenge(attempt).await
    }

    /// Forget the attempt entirely once the enclosing flow concludes
    pub async fn conclude_attempt(&self, attempt: &AttemptId) -> Result<(), WicketError> {
        debug!(attempt = %attempt, "attempt concluded, dropping challenge state");
        self.store.remove(attempt).await
    }

    fn presentation(
        &self,
        active: &ActiveChallenge,
        state: &OtpAttemptState,
        now: i64,
        dispatched: bool,
    ) -> ChallengePresentation {
        ChallengePresentation {
            expires_at: active.expires_at,
            expires_in_secs: active.expires_at.saturating_sub(now).max(0) as u64,
            resend_wait_secs: self.resend_wait_remaining(state, now),
            dispatched,
        }
    }
}
