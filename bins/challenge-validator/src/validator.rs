/// Validator Extension Contract
///
/// Per-challenge hooks used by the hosting service to configure, open and
/// present a challenge. Every hook has a default that reads the loaded
/// challenge and has no side effects; a challenge may override any of them.
///
/// Scoring is not part of this contract: `evaluator::reconcile` is fixed.

use crate::plugins::Plugins;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator_common::types::{
    PrerequisitesResult, ProblemConfiguration, ProblemOpenedResult, TestCaseDefinition, User,
};
use validator_common::ChallengeConfig;

pub const DEFAULT_INSTRUCTIONS: &str = "These are instructions.";

#[async_trait]
pub trait ChallengeValidator: Send + Sync {
    fn challenge(&self) -> &ChallengeConfig;

    async fn get_test_cases(&self) -> Vec<TestCaseDefinition> {
        self.challenge().test_cases.clone()
    }

    async fn get_problem_configuration(&self) -> ProblemConfiguration {
        self.challenge().configuration.clone()
    }

    /// Most challenges have no prerequisites
    async fn prerequisites(&self, _user: &User) -> PrerequisitesResult {
        PrerequisitesResult { satisfied: true }
    }

    /// The databag is substituted into the statement by the hosting service
    async fn open_problem(&self, _user: &User) -> ProblemOpenedResult {
        let mut opened = ProblemOpenedResult {
            opened: true,
            instructions: self
                .challenge()
                .configuration
                .settings
                .get("instructions")
                .cloned()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            ..ProblemOpenedResult::default()
        };
        opened
            .databag
            .insert("date".to_string(), Utc::now().timestamp_millis().to_string());
        opened
    }

    async fn get_problem_statement(&self, _user_id: &str) -> String {
        self.challenge().statement.clone()
    }
}

/// Validator used when a challenge does not customize any hook
#[derive(Debug, Clone)]
pub struct DefaultValidator {
    challenge: Arc<ChallengeConfig>,
    plugins: Plugins,
}

impl DefaultValidator {
    pub fn new(challenge: Arc<ChallengeConfig>, plugins: Plugins) -> Self {
        Self { challenge, plugins }
    }

    pub fn plugins(&self) -> &Plugins {
        &self.plugins
    }
}

#[async_trait]
impl ChallengeValidator for DefaultValidator {
    fn challenge(&self) -> &ChallengeConfig {
        &self.challenge
    }
}
