use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Points may be fractional (e.g. 100 split over three cases).
pub type Points = f64;

/// Declared test case of a challenge, as authored in the challenge file.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseDefinition {
    pub id: String,
    pub description: String,
    pub max_points: Points,
    pub kind: TestCaseKind,
}

/// Code review challenges anchor each test case to a comment location.
/// A missing anchor is an authoring problem, not a load failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestCaseKind {
    #[default]
    Standard,
    CodeReview {
        new_file_name: Option<String>,
        new_file_comment_line: Option<u32>,
    },
}

impl TestCaseKind {
    pub fn is_missing_anchor(&self) -> bool {
        matches!(
            self,
            Self::CodeReview { new_file_name, new_file_comment_line }
                if new_file_name.is_none() || new_file_comment_line.is_none()
        )
    }
}

/// Whole numbers are written without a fraction (`10`, not `10.0`).
fn serialize_points<S: Serializer>(points: &Points, serializer: S) -> Result<S::Ok, S::Error> {
    if points.fract() == 0.0 && *points >= 0.0 && *points <= u32::MAX as f64 {
        serializer.serialize_u64(*points as u64)
    } else {
        serializer.serialize_f64(*points)
    }
}

/// One external command of the validation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationStep {
    pub name: String,
    pub command: String,
    /// Relative to the workspace root. Empty means the root itself.
    pub working_directory: PathBuf,
    /// Result artifact, relative to `working_directory`.
    pub result_artifact: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// A single record extracted from a test report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub name: String,
    pub failed: bool,
}

impl BuildOutcome {
    pub fn passed(name: impl Into<String>) -> Self {
        Self { name: name.into(), failed: false }
    }

    pub fn failed(name: impl Into<String>) -> Self {
        Self { name: name.into(), failed: true }
    }
}

/// Scored test case. Binary: either full credit or none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedTestCase {
    pub id: String,
    #[serde(serialize_with = "serialize_points")]
    pub max_points: Points,
    #[serde(serialize_with = "serialize_points")]
    pub actual_points: Points,
    pub solved: bool,
}

impl EvaluatedTestCase {
    pub fn unsolved(definition: &TestCaseDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            max_points: definition.max_points,
            actual_points: 0.0,
            solved: false,
        }
    }

    pub fn mark_solved(&mut self) {
        self.actual_points = self.max_points;
        self.solved = true;
    }
}

/// Final score report of one validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    #[serde(serialize_with = "serialize_points")]
    pub total_points: Points,
    pub passed: bool,
    pub test_cases: Vec<EvaluatedTestCase>,
}

impl Verdict {
    /// Totals are always derived from the emitted cases.
    pub fn from_cases(test_cases: Vec<EvaluatedTestCase>) -> Self {
        let total_points = test_cases.iter().map(|tc| tc.actual_points).sum();
        let passed = test_cases.iter().all(|tc| tc.solved);
        Self {
            total_points,
            passed,
            test_cases,
        }
    }

    pub fn max_points(&self) -> Points {
        self.test_cases.iter().map(|tc| tc.max_points).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemInputType {
    GitRepo,
    Url,
    CodeReview,
}

impl ProblemInputType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GitRepo" => Some(Self::GitRepo),
            "Url" => Some(Self::Url),
            "CodeReview" => Some(Self::CodeReview),
            _ => None,
        }
    }
}

impl fmt::Display for ProblemInputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitRepo => write!(f, "GitRepo"),
            Self::Url => write!(f, "Url"),
            Self::CodeReview => write!(f, "CodeReview"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemConfiguration {
    pub input_type: Option<ProblemInputType>,
    pub ide_enabled: bool,
    /// Any other configuration keys, stringified
    pub settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrerequisitesResult {
    pub satisfied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemOpenedResult {
    pub opened: bool,
    pub instructions: String,
    pub databag: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, max_points: Points, solved: bool) -> EvaluatedTestCase {
        EvaluatedTestCase {
            id: id.to_string(),
            max_points,
            actual_points: if solved { max_points } else { 0.0 },
            solved,
        }
    }

    #[test]
    fn test_verdict_totals_from_cases() {
        let verdict = Verdict::from_cases(vec![case("T1", 20.0, true), case("T2", 80.0, false)]);
        assert_eq!(verdict.total_points, 20.0);
        assert_eq!(verdict.max_points(), 100.0);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_empty_verdict_passes_vacuously() {
        let verdict = Verdict::from_cases(vec![]);
        assert_eq!(verdict.total_points, 0.0);
        assert!(verdict.passed);
    }

    #[test]
    fn test_mark_solved_awards_full_points() {
        let definition = TestCaseDefinition {
            id: "T1".to_string(),
            description: String::new(),
            max_points: 35.0,
            kind: TestCaseKind::Standard,
        };
        let mut evaluated = EvaluatedTestCase::unsolved(&definition);
        assert_eq!(evaluated.actual_points, 0.0);
        assert!(!evaluated.solved);

        evaluated.mark_solved();
        assert_eq!(evaluated.actual_points, 35.0);
        assert!(evaluated.solved);
    }

    #[test]
    fn test_evaluated_case_serializes_camel_case() {
        let json = serde_json::to_value(case("TEST_1", 10.0, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "TEST_1", "maxPoints": 10, "actualPoints": 10, "solved": true})
        );
    }

    #[test]
    fn test_fractional_points_keep_their_fraction() {
        let json = serde_json::to_value(case("TEST_1", 33.5, false)).unwrap();
        assert_eq!(json["maxPoints"], serde_json::json!(33.5));
        assert_eq!(json["actualPoints"], serde_json::json!(0));

        let verdict = Verdict::from_cases(vec![case("A", 33.5, true), case("B", 66.5, true)]);
        assert_eq!(serde_json::to_value(&verdict).unwrap()["totalPoints"], serde_json::json!(100));
    }

    #[test]
    fn test_missing_review_anchor() {
        let anchored = TestCaseKind::CodeReview {
            new_file_name: Some("src/lib.rs".to_string()),
            new_file_comment_line: Some(3),
        };
        let unanchored = TestCaseKind::CodeReview {
            new_file_name: Some("src/lib.rs".to_string()),
            new_file_comment_line: None,
        };
        assert!(!anchored.is_missing_anchor());
        assert!(unanchored.is_missing_anchor());
        assert!(!TestCaseKind::Standard.is_missing_anchor());
    }

    #[test]
    fn test_input_type_parse() {
        assert_eq!(ProblemInputType::parse("GitRepo"), Some(ProblemInputType::GitRepo));
        assert_eq!(ProblemInputType::parse("CodeReview"), Some(ProblemInputType::CodeReview));
        assert_eq!(ProblemInputType::parse("gitrepo"), None);
    }
}
