//! Shared constants for Wicket components.

/// Default number of digits in a generated one-time code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default code validity window (5 minutes)
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default minimum delay between consecutive code dispatches
pub const DEFAULT_RESEND_WAIT_SECS: u64 = 0;

/// How long a stored challenge outlives its code expiry before the store
/// may garbage-collect it. Expiry itself is decided by timestamp
/// comparison, never by store eviction: an expired-but-present code must
/// still be reported as expired rather than missing.
pub const CHALLENGE_LINGER_SECS: u64 = 1800;

/// Form field names read from a submitted challenge form
pub mod form_fields {
    /// The user-entered digits
    pub const OTP: &str = "otp";

    /// Presence flag: abandon the challenge and restart the flow
    pub const CANCEL: &str = "cancel";

    /// Presence flag: request a fresh code
    pub const RESEND: &str = "resend";
}

/// Store key prefixes
pub mod store_keys {
    /// Active challenge: otp:challenge:{attempt_id}
    pub const CHALLENGE_PREFIX: &str = "otp:challenge:";

    /// Last dispatch timestamp: otp:last-sent:{attempt_id}
    pub const LAST_SENT_PREFIX: &str = "otp:last-sent:";
}

/// Audit event codes forwarded to the host's event sink
pub mod events {
    /// Matching code submitted after its validity window
    pub const EXPIRED_CODE: &str = "expired_code";

    /// Submitted code did not match
    pub const INVALID_CREDENTIALS: &str = "invalid_user_credentials";

    /// Attempt aborted because no code could ever be delivered
    pub const INVALID_USER: &str = "invalid_user";

    /// User abandoned the challenge
    pub const CHALLENGE_CANCELLED: &str = "challenge_cancelled";
}
