/// Validation Executor - Step Sequencing and Pipeline Orchestration
///
/// **Responsibility:**
/// Run the challenge's steps in order, collect their result artifacts and
/// hand the merged outcomes to the evaluator.
///
/// **Architecture:**
/// 1. Use an ExecutionEngine to run each step (engine.rs)
/// 2. Use the results module to extract and merge outcomes (results.rs)
/// 3. Use the evaluator to reconcile against declared test cases (evaluator.rs)
///
/// **Failure Policy:**
/// - A failing step is recorded and the next step still runs
/// - A step's declared artifact is collected even when the step failed
///   (test runners commonly exit non-zero when tests fail)
/// - Only configuration problems abort the run, including reports that were
///   produced but contain no test cases at all
///
/// Steps run strictly one after another; later steps may depend on files
/// produced by earlier ones.

use crate::config::ValidatorSettings;
use crate::engine::{CommandOutput, ExecutionEngine};
use crate::evaluator;
use crate::results;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;
use validator_common::types::{ValidationStep, Verdict};
use validator_common::{ChallengeConfig, Degradation, Outcome, ValidatorError};

/// What happened to one step
#[derive(Debug)]
pub struct StepReport {
    pub name: String,
    pub outcome: Outcome<CommandOutput>,
    /// Absolute artifact path, present whenever the step declared one
    pub result_artifact: Option<PathBuf>,
}

/// Everything a validation run produced
#[derive(Debug)]
pub struct ValidationRun {
    pub run_id: Uuid,
    pub steps: Vec<StepReport>,
    /// Non-fatal conditions, steps first, then artifacts
    pub conditions: Vec<Degradation>,
    pub verdict: Verdict,
}

pub fn working_dir(workspace_root: &Path, step: &ValidationStep) -> PathBuf {
    workspace_root.join(&step.working_directory)
}

/// workspace root + working directory + declared path
pub fn resolve_artifact(workspace_root: &Path, step: &ValidationStep) -> Option<PathBuf> {
    step.result_artifact
        .as_ref()
        .map(|artifact| working_dir(workspace_root, step).join(artifact))
}

/// Run every step in order; no step failure stops the sequence.
pub async fn run_all(
    engine: &dyn ExecutionEngine,
    workspace_root: &Path,
    steps: &[ValidationStep],
    settings: &ValidatorSettings,
) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(steps.len());

    for (idx, step) in steps.iter().enumerate() {
        info!(
            step = %step.name,
            index = idx + 1,
            total = steps.len(),
            "Running validation step"
        );

        let cwd = working_dir(workspace_root, step);
        let timeout = step.timeout.or(settings.step_timeout);

        let outcome = match engine.run(&step.command, &cwd, timeout).await {
            Ok(output) => {
                info!(
                    step = %step.name,
                    execution_ms = output.execution_time_ms,
                    stdout_bytes = output.stdout.len(),
                    stderr_bytes = output.stderr.len(),
                    "Step succeeded"
                );
                Outcome::Ok(output)
            }
            Err(e) => {
                // Continue on error: artifacts of this and other steps are still collected
                error!(step = %step.name, error = %e, "Step failed");
                let (output, reason) = match e {
                    ValidatorError::Execution { exit_code, stderr } => (
                        CommandOutput {
                            stderr,
                            ..CommandOutput::default()
                        },
                        match exit_code {
                            Some(code) => format!("exited with code {}", code),
                            None => "terminated by signal".to_string(),
                        },
                    ),
                    other => (CommandOutput::default(), other.to_string()),
                };
                Outcome::Degraded(
                    output,
                    Degradation::StepFailed {
                        step: step.name.clone(),
                        reason,
                    },
                )
            }
        };

        reports.push(StepReport {
            name: step.name.clone(),
            outcome,
            result_artifact: resolve_artifact(workspace_root, step),
        });
    }

    reports
}

/// Run the whole pipeline for a loaded challenge
///
/// `Degraded` carries the first non-fatal condition; all of them are in
/// `ValidationRun::conditions`. `Fatal` means no verdict could be produced.
pub async fn execute_validation(
    challenge: &ChallengeConfig,
    settings: &ValidatorSettings,
    engine: &dyn ExecutionEngine,
) -> Outcome<ValidationRun> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("validation", run_id = %run_id);

    async move {
        if challenge.test_cases.is_empty() {
            return Outcome::Fatal(ValidatorError::configuration("no test cases declared"));
        }

        let workspace_root = match settings.workspace_root.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                return Outcome::Fatal(ValidatorError::configuration(format!(
                    "workspace root {} is not usable: {}",
                    settings.workspace_root.display(),
                    e
                )))
            }
        };

        info!(
            workspace = %workspace_root.display(),
            steps = challenge.steps.len(),
            test_cases = challenge.test_cases.len(),
            "Starting validation run"
        );

        let steps = run_all(engine, &workspace_root, &challenge.steps, settings).await;

        let mut conditions: Vec<Degradation> = steps
            .iter()
            .filter_map(|s| s.outcome.degradation().cloned())
            .collect();

        let artifacts: Vec<PathBuf> = steps
            .iter()
            .filter_map(|s| s.result_artifact.clone())
            .collect();

        let aggregation = results::aggregate(&artifacts);

        if aggregation.found_no_test_cases() {
            error!("Unable to find testcases in any result file");
            return Outcome::Fatal(ValidatorError::configuration(
                "no test-suite/test-case elements found in the result files",
            ));
        }
        if aggregation.outcomes.is_empty() {
            warn!("No build outcomes were produced; every test case scores zero");
        }

        conditions.extend(aggregation.conditions);

        let verdict = evaluator::reconcile(&challenge.test_cases, &aggregation.outcomes);

        info!(
            score = verdict.total_points,
            max_score = verdict.max_points(),
            passed = verdict.passed,
            conditions = conditions.len(),
            "Validation run completed"
        );

        let first_condition = conditions.first().cloned();
        let run = ValidationRun {
            run_id,
            steps,
            conditions,
            verdict,
        };

        match first_condition {
            Some(reason) => Outcome::Degraded(run, reason),
            None => Outcome::Ok(run),
        }
    }
    .instrument(span)
    .await
}
