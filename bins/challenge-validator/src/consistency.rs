// Authoring-quality checks over declared test cases.
// Findings are reported, never enforced: scoring runs regardless.
use std::collections::BTreeMap;
use std::fmt;
use validator_common::types::{Points, TestCaseDefinition};

pub const REQUIRED_TOTAL_POINTS: Points = 100.0;

/// Fractional splits such as 3 x 33.333333 still count as 100
const POINTS_TOLERANCE: Points = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    TooFewTestCases { count: usize },
    PointsDoNotSumTo100 { total: Points },
    DuplicateId { id: String, occurrences: usize },
    PointsOutOfRange { id: String, max_points: Points },
    MissingReviewAnchor { id: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewTestCases { count } => {
                write!(f, "Must have more than one test case (found {})", count)
            }
            Self::PointsDoNotSumTo100 { total } => write!(
                f,
                "Total points of test cases do not add up to {} (found {})",
                REQUIRED_TOTAL_POINTS, total
            ),
            Self::DuplicateId { id, occurrences } => write!(
                f,
                "Test case ids must be unique: '{}' appears {} times",
                id, occurrences
            ),
            Self::PointsOutOfRange { id, max_points } => write!(
                f,
                "Test case '{}' has maxPoints {} (expected more than 0 and at most 100)",
                id, max_points
            ),
            Self::MissingReviewAnchor { id } => write!(
                f,
                "Code review test case '{}' needs newFileName and newFileCommentLine",
                id
            ),
        }
    }
}

/// Run every check; an empty list means the challenge is consistent
pub fn check(test_cases: &[TestCaseDefinition]) -> Vec<Finding> {
    let mut findings = Vec::new();

    if test_cases.len() <= 1 {
        findings.push(Finding::TooFewTestCases {
            count: test_cases.len(),
        });
    }

    let total: Points = test_cases.iter().map(|tc| tc.max_points).sum();
    if (total - REQUIRED_TOTAL_POINTS).abs() > POINTS_TOLERANCE {
        findings.push(Finding::PointsDoNotSumTo100 { total });
    }

    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    for tc in test_cases {
        *occurrences.entry(tc.id.as_str()).or_default() += 1;
    }
    // Report duplicates in declaration order, once per id
    for tc in test_cases {
        if let Some(count) = occurrences.remove(tc.id.as_str()) {
            if count > 1 {
                findings.push(Finding::DuplicateId {
                    id: tc.id.clone(),
                    occurrences: count,
                });
            }
        }
    }

    for tc in test_cases {
        // Written so that NaN is out of range too
        if !(tc.max_points > 0.0 && tc.max_points <= REQUIRED_TOTAL_POINTS) {
            findings.push(Finding::PointsOutOfRange {
                id: tc.id.clone(),
                max_points: tc.max_points,
            });
        }
    }

    for tc in test_cases.iter().filter(|tc| tc.kind.is_missing_anchor()) {
        findings.push(Finding::MissingReviewAnchor { id: tc.id.clone() });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_common::types::TestCaseKind;

    fn make_definition(id: &str, max_points: Points) -> TestCaseDefinition {
        TestCaseDefinition {
            id: id.to_string(),
            description: String::new(),
            max_points,
            kind: TestCaseKind::Standard,
        }
    }

    #[test]
    fn test_consistent_challenge() {
        let cases = vec![
            make_definition("TEST_1", 10.0),
            make_definition("TEST_2", 10.0),
            make_definition("TEST_3", 80.0),
        ];
        assert!(check(&cases).is_empty());
    }

    #[test]
    fn test_fractional_split_sums_to_100() {
        let third = 100.0 / 3.0;
        let cases = vec![
            make_definition("A", third),
            make_definition("B", third),
            make_definition("C", third),
        ];
        assert!(check(&cases).is_empty());

        let cases = vec![
            make_definition("A", 33.4),
            make_definition("B", 33.3),
            make_definition("C", 33.3),
        ];
        assert!(check(&cases).is_empty());
    }

    #[test]
    fn test_single_case_is_flagged() {
        let findings = check(&[make_definition("ONLY", 100.0)]);
        assert_eq!(findings, vec![Finding::TooFewTestCases { count: 1 }]);
    }

    #[test]
    fn test_points_must_sum_to_100() {
        let findings = check(&[make_definition("A", 30.0), make_definition("B", 30.0)]);
        assert_eq!(findings, vec![Finding::PointsDoNotSumTo100 { total: 60.0 }]);
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let cases = vec![
            make_definition("A", 25.0),
            make_definition("B", 25.0),
            make_definition("A", 25.0),
            make_definition("A", 25.0),
        ];
        assert_eq!(
            check(&cases),
            vec![Finding::DuplicateId {
                id: "A".to_string(),
                occurrences: 3
            }]
        );
    }

    #[test]
    fn test_points_out_of_range() {
        let findings = check(&[make_definition("A", 0.0), make_definition("B", 100.0)]);
        assert_eq!(
            findings,
            vec![Finding::PointsOutOfRange {
                id: "A".to_string(),
                max_points: 0.0
            }]
        );
    }

    #[test]
    fn test_missing_review_anchor_is_flagged() {
        let mut review = make_definition("REVIEW_1", 50.0);
        review.kind = TestCaseKind::CodeReview {
            new_file_name: None,
            new_file_comment_line: Some(12),
        };
        let cases = vec![review, make_definition("REVIEW_2", 50.0)];

        assert_eq!(
            check(&cases),
            vec![Finding::MissingReviewAnchor {
                id: "REVIEW_1".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_challenge() {
        let findings = check(&[]);
        assert!(findings.contains(&Finding::TooFewTestCases { count: 0 }));
        assert!(findings.contains(&Finding::PointsDoNotSumTo100 { total: 0.0 }));
    }

    #[test]
    fn test_finding_messages() {
        assert_eq!(
            Finding::PointsDoNotSumTo100 { total: 90.0 }.to_string(),
            "Total points of test cases do not add up to 100 (found 90)"
        );
    }
}
