//! Challenge policy configuration.

use serde::Deserialize;
use std::path::Path;
use wicket_common::WicketError;
use wicket_common::constants::{DEFAULT_CODE_LENGTH, DEFAULT_RESEND_WAIT_SECS, DEFAULT_TTL_SECS};

/// Immutable policy for one challenge-step instance.
///
/// Every field has a default, so an empty config is a working config.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpPolicy {
    /// Number of digits in a generated code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a code stays acceptable after issuance
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Minimum seconds between consecutive dispatches to one attempt
    #[serde(default = "default_resend_wait_secs")]
    pub resend_wait_secs: u64,

    /// Fixed code overriding the generator. Test environments only.
    #[serde(default)]
    pub hardcoded_otp: Option<String>,

    /// Issue challenges without dispatching anything. Combined with
    /// `hardcoded_otp` this lets integration environments run the step
    /// without a mail sink.
    #[serde(default)]
    pub disable_mailing: bool,
}

// Default value functions
fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}
fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}
fn default_resend_wait_secs() -> u64 {
    DEFAULT_RESEND_WAIT_SECS
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_secs: default_ttl_secs(),
            resend_wait_secs: default_resend_wait_secs(),
            hardcoded_otp: None,
            disable_mailing: false,
        }
    }
}

impl OtpPolicy {
    /// Load policy from a config file, with `MAILWARD_*` environment
    /// overrides applied on top
    pub fn load(config_path: &str) -> Result<Self, WicketError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!("Config file not found, using defaults");
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("MAILWARD").try_parsing(true))
            .build()
            .map_err(|err| WicketError::Config(err.to_string()))?;

        let policy: Self = settings
            .try_deserialize()
            .map_err(|err| WicketError::Config(err.to_string()))?;

        policy.validate()?;
        Ok(policy)
    }

    /// Reject values no challenge could be run with
    pub fn validate(&self) -> Result<(), WicketError> {
        if self.code_length == 0 {
            return Err(WicketError::Config(
                "code_length must be at least 1".to_string(),
            ));
        }
        if let Some(code) = &self.hardcoded_otp {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(WicketError::Config(
                    "hardcoded_otp must be a non-empty digit string".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_yields_defaults() {
        let policy: OtpPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.code_length, 6);
        assert_eq!(policy.ttl_secs, 300);
        assert_eq!(policy.resend_wait_secs, 0);
        assert_eq!(policy.hardcoded_otp, None);
        assert!(!policy.disable_mailing);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let policy: OtpPolicy =
            serde_json::from_str(r#"{"code_length": 8, "resend_wait_secs": 30}"#).unwrap();
        assert_eq!(policy.code_length, 8);
        assert_eq!(policy.ttl_secs, 300);
        assert_eq!(policy.resend_wait_secs, 30);
    }

    #[test]
    fn test_zero_length_rejected() {
        let policy = OtpPolicy {
            code_length: 0,
            ..OtpPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(WicketError::Config(_))));
    }

    #[test]
    fn test_non_digit_hardcoded_code_rejected() {
        let policy = OtpPolicy {
            hardcoded_otp: Some("12a456".to_string()),
            ..OtpPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(WicketError::Config(_))));

        let policy = OtpPolicy {
            hardcoded_otp: Some("123456".to_string()),
            ..OtpPolicy::default()
        };
        assert!(policy.validate().is_ok());
    }
}
