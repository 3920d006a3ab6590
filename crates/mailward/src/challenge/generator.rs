//! One-time code generation.

use rand::Rng;

use crate::config::OtpPolicy;

/// Produces the numeric codes handed to the notifier.
///
/// Digits come from the thread-local CSPRNG, one uniform draw per
/// position, so codes carry no structure beyond their length.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    fixed: Option<String>,
}

impl CodeGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            fixed: None,
        }
    }

    /// Generator honoring the policy's `hardcoded_otp` override
    pub fn from_policy(policy: &OtpPolicy) -> Self {
        Self {
            length: policy.code_length,
            fixed: policy.hardcoded_otp.clone(),
        }
    }

    /// Generate a fresh code
    pub fn generate(&self) -> String {
        if let Some(fixed) = &self.fixed {
            return fixed.clone();
        }

        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| char::from(b'0' + rng.random_range(0u8..10)))
            .collect()
    }
}
