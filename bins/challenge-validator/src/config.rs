// Runtime settings for the challenge validator
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use validator_common::ChallengeConfig;

pub const DEFAULT_CHALLENGE_PATH: &str = "../challenge.yaml";
pub const DEFAULT_OUTPUT_PATH: &str = "output.json";
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    pub challenge_path: PathBuf,
    pub workspace_root: PathBuf,
    pub output_path: PathBuf,
    /// Applied to steps without their own `timeoutSeconds`
    pub step_timeout: Option<Duration>,
    pub echo_output: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            challenge_path: PathBuf::from(DEFAULT_CHALLENGE_PATH),
            workspace_root: PathBuf::from("."),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            step_timeout: timeout_from_secs(DEFAULT_STEP_TIMEOUT_SECS),
            echo_output: true,
        }
    }
}

/// `0` disables the timeout
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl ValidatorSettings {
    /// Load the challenge file named by these settings
    pub fn load_challenge(&self) -> Result<ChallengeConfig> {
        let challenge = ChallengeConfig::load(&self.challenge_path)
            .with_context(|| format!("Failed to load challenge {}", self.challenge_path.display()))?;

        info!(
            path = %self.challenge_path.display(),
            test_cases = challenge.test_cases.len(),
            steps = challenge.steps.len(),
            "Loaded challenge"
        );

        Ok(challenge)
    }
}
