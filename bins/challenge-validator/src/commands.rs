// CLI commands: validate a workspace, or exercise the validator contract
use crate::config::ValidatorSettings;
use crate::consistency::{self, Finding};
use crate::engine::ShellEngine;
use crate::evaluator;
use crate::executor;
use crate::plugins::Plugins;
use crate::report;
use crate::validator::{ChallengeValidator, DefaultValidator};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use validator_common::types::{
    PrerequisitesResult, ProblemConfiguration, ProblemOpenedResult, User, Verdict,
};

/// Fixed user the `test` command opens the challenge as
pub const SYNTHETIC_USER_ID: &str = "some-user-id";

/// Run the full pipeline and write the verdict file
pub async fn validate(settings: &ValidatorSettings) -> Result<Verdict> {
    let challenge = settings.load_challenge()?;

    for finding in consistency::check(&challenge.test_cases) {
        warn!(finding = %finding, "Challenge consistency check failed");
    }

    let engine = ShellEngine::new(settings.echo_output);
    let run = executor::execute_validation(&challenge, settings, &engine)
        .await
        .into_result()
        .context("Validation run aborted")?;

    for step in &run.steps {
        info!(
            step = %step.name,
            succeeded = step.outcome.is_ok(),
            artifact = ?step.result_artifact,
            "Step summary"
        );
    }
    for condition in &run.conditions {
        warn!(run_id = %run.run_id, condition = %condition, "Degraded validation");
    }

    report::write_output(&run.verdict, &settings.output_path)?;
    info!(
        run_id = %run.run_id,
        path = %settings.output_path.display(),
        "Verdict written"
    );

    println!();
    print!("{}", report::render_table(&run.verdict));

    Ok(run.verdict)
}

/// What the contract exercise observed
#[derive(Debug)]
pub struct ContractReport {
    pub configuration: ProblemConfiguration,
    pub prerequisites: PrerequisitesResult,
    pub opened: ProblemOpenedResult,
    pub statement: String,
    /// Scored against no outcomes: every case unsolved
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

/// Call every hook of the contract as the synthetic user
pub async fn exercise_contract(validator: &dyn ChallengeValidator) -> ContractReport {
    let configuration = validator.get_problem_configuration().await;
    let test_cases = validator.get_test_cases().await;
    let findings = consistency::check(&test_cases);

    let user = User::new(SYNTHETIC_USER_ID);
    let prerequisites = validator.prerequisites(&user).await;
    let opened = validator.open_problem(&user).await;
    let statement = validator.get_problem_statement(&user.id).await;

    let verdict = evaluator::reconcile(&validator.get_test_cases().await, &[]);

    ContractReport {
        configuration,
        prerequisites,
        opened,
        statement,
        verdict,
        findings,
    }
}

/// `test` command
pub async fn test(settings: &ValidatorSettings, deny_findings: bool) -> Result<()> {
    let challenge = Arc::new(settings.load_challenge()?);
    let validator = DefaultValidator::new(challenge, Plugins::default());

    let report = exercise_contract(&validator).await;

    if report.configuration.ide_enabled {
        println!("configuration.ideEnabled: {}", report.configuration.ide_enabled);
    }
    match report.configuration.input_type {
        Some(input_type) => println!("configuration.inputType: {}", input_type),
        None => println!("configuration.inputType: (not set)"),
    }
    println!("prerequisites satisfied: {}", report.prerequisites.satisfied);
    match validator
        .plugins()
        .source_control
        .user_exists(SYNTHETIC_USER_ID)
        .await
    {
        Ok(exists) => println!("source control user exists: {}", exists),
        Err(e) => warn!(error = %format!("{:#}", e), "Source control plugin failed"),
    }
    println!("problem opened: {}", report.opened.opened);
    println!("statement: {} bytes", report.statement.len());

    for tc in &report.verdict.test_cases {
        println!("Evaluating case {} - {} / {}", tc.id, tc.actual_points, tc.max_points);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report.verdict).context("Failed to serialize verdict")?
    );

    if report.findings.is_empty() {
        println!("Validation failures: none");
    } else {
        println!("Validation failures:");
        for finding in &report.findings {
            println!("  - {}", finding);
        }
    }

    if deny_findings && !report.findings.is_empty() {
        bail!("{} consistency check(s) failed", report.findings.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_common::ChallengeConfig;

    fn validator(yaml: &str) -> DefaultValidator {
        let challenge = ChallengeConfig::from_yaml_str(yaml).unwrap();
        DefaultValidator::new(Arc::new(challenge), Plugins::default())
    }

    #[tokio::test]
    async fn test_exercise_consistent_challenge() {
        let validator = validator(
            r#"
configuration:
  - inputType: GitRepo
statement: Solve it.
testcases:
  - id: TEST_1
    maxPoints: 10
  - id: TEST_2
    maxPoints: 10
  - id: TEST_3
    maxPoints: 80
validate:
  - name: test
    cmd: make test
    results: junit.xml
"#,
        );

        let report = exercise_contract(&validator).await;

        assert!(report.findings.is_empty());
        assert!(report.prerequisites.satisfied);
        assert!(report.opened.opened);
        assert_eq!(report.statement, "Solve it.");
        assert_eq!(report.verdict.test_cases.len(), 3);
        assert_eq!(report.verdict.total_points, 0.0);
        assert!(!report.verdict.passed);
    }

    #[tokio::test]
    async fn test_exercise_reports_findings() {
        let validator = validator(
            r#"
testcases:
  - id: A
    maxPoints: 50
  - id: A
    maxPoints: 40
validate:
  - name: test
    cmd: make test
    results: junit.xml
"#,
        );

        let report = exercise_contract(&validator).await;

        assert!(report.findings.contains(&Finding::PointsDoNotSumTo100 { total: 90.0 }));
        assert!(report.findings.contains(&Finding::DuplicateId {
            id: "A".to_string(),
            occurrences: 2
        }));
    }

    #[tokio::test]
    async fn test_deny_findings_fails_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("challenge.yaml");
        std::fs::write(
            &path,
            r#"
testcases:
  - id: ONLY
    maxPoints: 100
validate:
  - name: test
    cmd: make test
    results: junit.xml
"#,
        )
        .unwrap();
        let settings = ValidatorSettings {
            challenge_path: path,
            ..ValidatorSettings::default()
        };

        assert!(test(&settings, false).await.is_ok());
        assert!(test(&settings, true).await.is_err());
    }
}
