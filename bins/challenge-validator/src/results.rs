/// Result Extractor and Aggregator
///
/// **Core Responsibility:**
/// Turn JUnit-style XML reports into a flat, ordered list of `BuildOutcome`s.
///
/// **Degradation Rules:**
/// - Missing file: no outcomes, `ArtifactMissing` reported
/// - Malformed XML: no outcomes, `ArtifactUnparseable` reported
/// - No `<testcase>` records: no outcomes, `NoOutcomeRecords` reported
///
/// Extraction never fails on its own; one bad artifact must not hide the
/// outcomes of the others. Whether an empty aggregation aborts the run is
/// decided by the executor (`Aggregation::found_no_test_cases`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use validator_common::types::BuildOutcome;
use validator_common::{Degradation, Outcome};

/// Child elements that mark a test case as failed
const FAILURE_MARKERS: [&str; 2] = ["failure", "error"];

/// Extract outcomes from one result file
pub fn extract(path: &Path) -> Outcome<Vec<BuildOutcome>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "The test run did not produce an output file");
            return Outcome::Degraded(
                Vec::new(),
                Degradation::ArtifactMissing {
                    path: path.to_path_buf(),
                },
            );
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to read result file");
            return Outcome::Degraded(
                Vec::new(),
                Degradation::ArtifactUnparseable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            );
        }
    };

    debug!(path = %path.display(), bytes = content.len(), "Found the output file");
    parse_report(&content, path)
}

/// Parse report content; `path` is only used for reporting.
pub fn parse_report(content: &str, path: &Path) -> Outcome<Vec<BuildOutcome>> {
    let doc = match roxmltree::Document::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to parse result file");
            return Outcome::Degraded(
                Vec::new(),
                Degradation::ArtifactUnparseable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            );
        }
    };

    let mut outcomes = Vec::new();

    for suite in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "testsuite")
    {
        for case in suite
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "testcase")
        {
            let Some(name) = case.attribute("name") else {
                debug!(path = %path.display(), "Skipping <testcase> without a name");
                continue;
            };

            let failed = case
                .children()
                .any(|c| c.is_element() && FAILURE_MARKERS.contains(&c.tag_name().name()));

            outcomes.push(BuildOutcome {
                name: name.trim().to_string(),
                failed,
            });
        }
    }

    if outcomes.is_empty() {
        warn!(path = %path.display(), "Unable to find testcases");
        return Outcome::Degraded(
            outcomes,
            Degradation::NoOutcomeRecords {
                path: path.to_path_buf(),
            },
        );
    }

    info!(
        path = %path.display(),
        outcomes = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.failed).count(),
        "Extracted build outcomes"
    );

    Outcome::Ok(outcomes)
}

/// Outcomes merged across every declared artifact
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Concatenated in artifact order; duplicates preserved
    pub outcomes: Vec<BuildOutcome>,
    pub conditions: Vec<Degradation>,
}

impl Aggregation {
    /// Reports were produced but none of them holds a single test case.
    /// Missing or unparseable artifacts alone do not count.
    pub fn found_no_test_cases(&self) -> bool {
        let mut existing = self
            .conditions
            .iter()
            .filter(|c| !matches!(c, Degradation::ArtifactMissing { .. }))
            .peekable();

        self.outcomes.is_empty()
            && existing.peek().is_some()
            && existing.all(|c| matches!(c, Degradation::NoOutcomeRecords { .. }))
    }
}

/// Extract each path in order and concatenate.
pub fn aggregate(paths: &[PathBuf]) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for path in paths {
        match extract(path) {
            Outcome::Ok(outcomes) => aggregation.outcomes.extend(outcomes),
            Outcome::Degraded(outcomes, reason) => {
                aggregation.outcomes.extend(outcomes);
                aggregation.conditions.push(reason);
            }
            // extract() never produces Fatal
            Outcome::Fatal(e) => warn!(path = %path.display(), error = %e, "Unexpected extraction error"),
        }
    }

    aggregation
}
