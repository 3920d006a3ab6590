//! # Mailward - Wicket Email OTP Engine
//!
//! One challenge step for a multi-step login flow: the user has already
//! proven who they claim to be and must now prove possession of their
//! registered email address by entering a short-lived numeric code.
//!
//! The engine owns the code lifecycle (issue, verify, expire, resend,
//! reset) and nothing else. Delivery, page rendering, flow sequencing,
//! and lockout policy stay with the host, behind the [`notify::Notifier`]
//! and [`store::AttemptStore`] ports and the outcome types of
//! `wicket-common`.
//!
//! ## Architecture
//! ```text
//! Host flow ──> OtpChallengeManager ──> AttemptStore (per-attempt state)
//!                        │
//!                        └──> Notifier (code delivery, best effort)
//! ```

pub mod challenge;
pub mod clock;
pub mod config;
pub mod notify;
pub mod store;

pub use challenge::{
    ActiveChallenge, CodeGenerator, OtpAttemptState, OtpChallengeManager, evaluate_submission,
    resend_wait_remaining,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OtpPolicy;
pub use notify::{DeliveryError, LogNotifier, Notifier};
pub use store::{AttemptId, AttemptStore, MemoryAttemptStore, RedisAttemptStore};
