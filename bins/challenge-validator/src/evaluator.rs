/// Reconciler - Challenge Scoring Logic
///
/// **Core Responsibility:**
/// Match declared test cases against extracted build outcomes and assign points.
///
/// **Critical Properties:**
/// - Knows nothing about shells, steps or result files
/// - Pure function: (definitions, outcomes) → verdict
/// - Deterministic: same input, identical verdict
///
/// **Scoring Rules:**
/// - Match by exact, case-sensitive equality of the trimmed outcome name and the test case id
/// - First matching outcome wins; later duplicates are ignored
/// - Matched and not failed: full `max_points`
/// - Matched and failed, or unmatched: 0 points
/// - Outcomes that match no test case are ignored
/// - total_points = sum of actual points, passed = every case solved
///
/// The verdict lists test cases in declaration order.

use tracing::{debug, warn};
use validator_common::types::{BuildOutcome, EvaluatedTestCase, TestCaseDefinition, Verdict};

/// Find the first outcome for a test case id
fn find_outcome<'a>(outcomes: &'a [BuildOutcome], id: &str) -> Option<&'a BuildOutcome> {
    outcomes.iter().find(|o| o.name.trim() == id)
}

/// Score a single test case against all outcomes
pub fn evaluate_test(definition: &TestCaseDefinition, outcomes: &[BuildOutcome]) -> EvaluatedTestCase {
    let mut evaluated = EvaluatedTestCase::unsolved(definition);

    match find_outcome(outcomes, &definition.id) {
        Some(outcome) if !outcome.failed => {
            evaluated.mark_solved();
            debug!(test_id = %definition.id, points = evaluated.actual_points, "Test case solved");
        }
        Some(_) => {
            debug!(test_id = %definition.id, "Test case failed");
        }
        None => {
            warn!(test_id = %definition.id, "No matching build outcome for test case");
        }
    }

    evaluated
}

/// Reconcile declared test cases with aggregated outcomes
pub fn reconcile(definitions: &[TestCaseDefinition], outcomes: &[BuildOutcome]) -> Verdict {
    let test_cases = definitions
        .iter()
        .map(|definition| evaluate_test(definition, outcomes))
        .collect();

    Verdict::from_cases(test_cases)
}
