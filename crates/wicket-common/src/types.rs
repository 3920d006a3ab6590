//! Core types shared across Wicket components.

use serde::{Deserialize, Serialize};

use crate::constants::{events, form_fields};

/// Read-only view of the user working through the challenge.
///
/// Owned by the host's identity store; the engine only ever needs a
/// username for logging and an address to deliver codes to.
pub trait UserIdentity: Send + Sync {
    fn username(&self) -> &str;

    /// Registered delivery address, if any
    fn email(&self) -> Option<&str>;
}

/// How the host flow has configured this execution of the challenge step.
///
/// Selects what an invalid submission means: a `Required` step keeps
/// re-challenging and feeds the host's lockout counter, while an
/// `Alternative` or `Conditional` step merely records that it was tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRequirement {
    /// The step must be passed for the attempt to continue
    Required,
    /// One of several interchangeable steps
    Alternative,
    /// Executed only when some host-side condition holds
    Conditional,
}

/// Result of checking a submitted code against the stored challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Code matches and is still within its validity window
    Valid,
    /// Code matches but its validity window has passed
    Expired,
    /// Code does not match
    Invalid,
    /// No code has been issued for this attempt
    NoActiveCode,
}

/// A failed submission that still leaves the challenge on screen.
///
/// Both kinds count against the host's brute-force lockout; they carry
/// distinct audit codes so the event stream can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Submitted code did not match the issued one
    InvalidCode,
    /// Submitted code matched but was past its expiry
    ExpiredCode,
}

impl FailureKind {
    /// Audit event code for the host's event sink
    pub fn event_code(&self) -> &'static str {
        match self {
            Self::InvalidCode => events::INVALID_CREDENTIALS,
            Self::ExpiredCode => events::EXPIRED_CODE,
        }
    }

    /// Message to render on the re-shown form
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::InvalidCode => UserMessage::InvalidCredentials,
            Self::ExpiredCode => UserMessage::ExpiredCode,
        }
    }
}

/// Why the whole authentication attempt must end here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbortReason {
    /// The user has no address a code could ever reach. Surfaced to the
    /// user as the generic credentials error so account probing cannot
    /// distinguish a missing address from a wrong code.
    NoDeliveryAddress,
    /// The user abandoned the challenge; the host restarts the flow
    Cancelled,
}

impl AbortReason {
    /// Audit event code for the host's event sink
    pub fn event_code(&self) -> &'static str {
        match self {
            Self::NoDeliveryAddress => events::INVALID_USER,
            Self::Cancelled => events::CHALLENGE_CANCELLED,
        }
    }

    /// Message to render, if the abort is user-visible at all
    pub fn user_message(&self) -> Option<UserMessage> {
        match self {
            Self::NoDeliveryAddress => Some(UserMessage::InvalidCredentials),
            Self::Cancelled => None,
        }
    }
}

/// Localizable message shown on the challenge form.
///
/// Hosts look the `key` up in their message bundle and splice in `args`;
/// the `Display` impl is an English fallback. Messages stay generic on
/// purpose: they never reveal which internal branch produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum UserMessage {
    /// Generic credentials failure (wrong code, unusable account)
    InvalidCredentials,
    /// The entered code was correct but no longer valid
    ExpiredCode,
    /// A new code cannot be requested yet
    ResendThrottled { wait_secs: u64 },
}

impl UserMessage {
    /// Message bundle key
    pub fn key(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "auth.invalid-credentials",
            Self::ExpiredCode => "auth.otp.expired-code",
            Self::ResendThrottled { .. } => "auth.otp.resend-wait",
        }
    }

    /// Positional arguments for the localized template
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::ResendThrottled { wait_secs } => vec![wait_secs.to_string()],
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials."),
            Self::ExpiredCode => {
                write!(f, "The code has expired. A new one has been sent to you.")
            }
            Self::ResendThrottled { wait_secs } => {
                write!(f, "Wait {wait_secs} seconds before requesting a new code.")
            }
        }
    }
}

/// What the host should do after the engine classified an inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowTransition {
    /// Render the challenge form again, optionally with a message
    ReShow { error: Option<UserMessage> },
    /// The code checked out; the step is passed and its record is spent
    Success,
    /// Failed submission: re-show with `kind.user_message()`, emit
    /// `kind.event_code()`, and bump the lockout counter
    Failure(FailureKind),
    /// The optional step was tried and not passed; move on
    Attempted,
    /// End the whole attempt
    Aborted(AbortReason),
}

/// Render descriptor for the challenge screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengePresentation {
    /// Unix time at which the active code stops being acceptable
    pub expires_at: i64,
    /// Seconds of validity left on the active code
    pub expires_in_secs: u64,
    /// Seconds until a resend may be requested (0 = available now)
    pub resend_wait_secs: u64,
    /// Whether this interaction dispatched a code (false on re-display)
    pub dispatched: bool,
}

/// Outcome of asking the engine to make sure a challenge is on foot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeStart {
    /// Render the entry form
    Show(ChallengePresentation),
    /// No challenge can proceed; end the attempt
    Aborted(AbortReason),
}

/// What the user asked for, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction<'a> {
    Cancel,
    Resend,
    /// The entered code; an absent field submits as empty
    Submit(&'a str),
}

/// Decoded fields of a submitted challenge form.
///
/// `cancel` and `resend` are presence flags (HTML buttons post their name
/// whatever the value); `otp` carries the entered digits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

impl FormSubmission {
    /// Build from decoded form field pairs, ignoring unknown fields
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut form = Self::default();
        for (name, value) in fields {
            match name {
                form_fields::CANCEL => form.cancel = Some(value.to_string()),
                form_fields::RESEND => form.resend = Some(value.to_string()),
                form_fields::OTP => form.otp = Some(value.to_string()),
                _ => {}
            }
        }
        form
    }

    /// A plain code submission
    pub fn submission(code: impl Into<String>) -> Self {
        Self {
            otp: Some(code.into()),
            ..Self::default()
        }
    }

    /// A cancel request
    pub fn cancellation() -> Self {
        Self {
            cancel: Some(String::new()),
            ..Self::default()
        }
    }

    /// A resend request
    pub fn resend_request() -> Self {
        Self {
            resend: Some(String::new()),
            ..Self::default()
        }
    }

    /// Classify the form. Cancel wins over resend wins over submission;
    /// a missing code field is treated as an empty (and thus never
    /// matching) entry rather than rejected.
    pub fn action(&self) -> FormAction<'_> {
        if self.cancel.is_some() {
            FormAction::Cancel
        } else if self.resend.is_some() {
            FormAction::Resend
        } else {
            FormAction::Submit(self.otp.as_deref().unwrap_or_default())
        }
    }
}
