// Challenge file loading (challenge.yaml)
use crate::error::{Result, ValidatorError};
use crate::types::{
    Points, ProblemConfiguration, ProblemInputType, TestCaseDefinition, TestCaseKind,
    ValidationStep,
};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RawChallenge {
    #[serde(default)]
    configuration: RawConfiguration,
    #[serde(default)]
    testcases: Vec<RawTestCase>,
    #[serde(default)]
    statement: String,
    #[serde(default)]
    validate: Vec<RawStep>,
}

/// `configuration` is either a list of single-key maps or a plain map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConfiguration {
    Entries(Vec<BTreeMap<String, Value>>),
    Map(BTreeMap<String, Value>),
}

impl Default for RawConfiguration {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTestCase {
    id: String,
    #[serde(default)]
    description: String,
    max_points: Points,
    new_file_name: Option<String>,
    new_file_comment_line: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStep {
    Command(CommandStep),
    Legacy(LegacyStep),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandStep {
    name: String,
    cmd: String,
    working_directory: Option<PathBuf>,
    results: Option<PathBuf>,
    timeout_seconds: Option<u64>,
}

/// `{compile, run, results}` entries expand to two steps
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStep {
    compile: Option<String>,
    run: String,
    working_directory: Option<PathBuf>,
    results: Option<PathBuf>,
    timeout_seconds: Option<u64>,
}

/// Immutable, fully-typed challenge loaded once per run
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeConfig {
    pub configuration: ProblemConfiguration,
    pub test_cases: Vec<TestCaseDefinition>,
    pub statement: String,
    pub steps: Vec<ValidationStep>,
}

impl ChallengeConfig {
    /// Load and validate a challenge file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ValidatorError::configuration(format!(
                "challenge file does not exist: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ValidatorError::configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: RawChallenge = serde_yaml::from_str(content)
            .map_err(|e| ValidatorError::configuration(format!("failed to parse challenge: {}", e)))?;

        let configuration = parse_configuration(raw.configuration)?;
        let test_cases: Vec<TestCaseDefinition> = raw
            .testcases
            .into_iter()
            .map(|tc| convert_test_case(tc, configuration.input_type))
            .collect();

        if test_cases.is_empty() {
            return Err(ValidatorError::configuration("challenge declares no test cases"));
        }

        let steps: Vec<ValidationStep> = raw.validate.into_iter().flat_map(expand_step).collect();

        if steps.is_empty() {
            return Err(ValidatorError::configuration("challenge declares no validation steps"));
        }
        if steps.iter().all(|s| s.result_artifact.is_none()) {
            return Err(ValidatorError::configuration(
                "no validation step declares a results file",
            ));
        }

        Ok(Self {
            configuration,
            test_cases,
            statement: raw.statement,
            steps,
        })
    }
}

fn parse_configuration(raw: RawConfiguration) -> Result<ProblemConfiguration> {
    // First occurrence of a key wins
    let mut merged: BTreeMap<String, Value> = BTreeMap::new();
    match raw {
        RawConfiguration::Entries(entries) => {
            for entry in entries {
                for (key, value) in entry {
                    merged.entry(key).or_insert(value);
                }
            }
        }
        RawConfiguration::Map(map) => merged = map,
    }

    let mut configuration = ProblemConfiguration::default();

    if let Some(value) = merged.remove("inputType") {
        let raw_type = value_to_string(&value);
        configuration.input_type = Some(ProblemInputType::parse(&raw_type).ok_or_else(|| {
            ValidatorError::configuration(format!("unknown inputType: {}", raw_type))
        })?);
    }

    if let Some(value) = merged.remove("ideEnabled") {
        configuration.ide_enabled = match value {
            Value::Bool(b) => b,
            other => value_to_string(&other).eq_ignore_ascii_case("true"),
        };
    }

    configuration.settings = merged
        .into_iter()
        .map(|(k, v)| (k, value_to_string(&v)))
        .collect();

    Ok(configuration)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Range and anchor problems are left to the consistency checks.
fn convert_test_case(raw: RawTestCase, input_type: Option<ProblemInputType>) -> TestCaseDefinition {
    let kind = if input_type == Some(ProblemInputType::CodeReview) {
        TestCaseKind::CodeReview {
            new_file_name: raw.new_file_name,
            new_file_comment_line: raw.new_file_comment_line,
        }
    } else {
        TestCaseKind::Standard
    };

    TestCaseDefinition {
        id: raw.id,
        description: raw.description,
        max_points: raw.max_points,
        kind,
    }
}

fn step_timeout(seconds: Option<u64>) -> Option<Duration> {
    seconds.filter(|s| *s > 0).map(Duration::from_secs)
}

fn expand_step(raw: RawStep) -> Vec<ValidationStep> {
    match raw {
        RawStep::Command(step) => vec![ValidationStep {
            name: step.name,
            command: step.cmd,
            working_directory: step.working_directory.unwrap_or_default(),
            result_artifact: step.results,
            timeout: step_timeout(step.timeout_seconds),
        }],
        RawStep::Legacy(step) => {
            let working_directory = step.working_directory.unwrap_or_default();
            let timeout = step_timeout(step.timeout_seconds);
            let mut steps = Vec::with_capacity(2);
            if let Some(compile) = step.compile {
                steps.push(ValidationStep {
                    name: "compile".to_string(),
                    command: compile,
                    working_directory: working_directory.clone(),
                    result_artifact: None,
                    timeout,
                });
            }
            steps.push(ValidationStep {
                name: "run".to_string(),
                command: step.run,
                working_directory,
                result_artifact: step.results,
                timeout,
            });
            steps
        }
    }
}
