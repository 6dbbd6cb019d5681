//! Typed result of a pipeline stage
//!
//! **Variants:**
//! - `Ok`: the stage produced its value normally
//! - `Degraded`: the stage hit a non-fatal condition and produced a fallback
//!   value (typically empty); the run continues
//! - `Fatal`: the run cannot produce a verdict

use crate::error::ValidatorError;
use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions absorbed by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    StepFailed { step: String, reason: String },
    ArtifactMissing { path: PathBuf },
    ArtifactUnparseable { path: PathBuf, message: String },
    NoOutcomeRecords { path: PathBuf },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepFailed { step, reason } => write!(f, "step '{}' failed: {}", step, reason),
            Self::ArtifactMissing { path } => {
                write!(f, "result artifact does not exist: {}", path.display())
            }
            Self::ArtifactUnparseable { path, message } => {
                write!(f, "unable to parse {}: {}", path.display(), message)
            }
            Self::NoOutcomeRecords { path } => {
                write!(f, "no test cases found in {}", path.display())
            }
        }
    }
}

#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Degraded(T, Degradation),
    Fatal(ValidatorError),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            Self::Degraded(_, reason) => Some(reason),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => Some(value),
            Self::Fatal(_) => None,
        }
    }

    /// Keep the value of `Ok` and `Degraded`, surface `Fatal` as an error.
    pub fn into_result(self) -> Result<T, ValidatorError> {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => Ok(value),
            Self::Fatal(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Degraded(value, reason) => Outcome::Degraded(f(value), reason),
            Self::Fatal(err) => Outcome::Fatal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_keeps_value() {
        let outcome: Outcome<Vec<u32>> = Outcome::Degraded(
            vec![],
            Degradation::ArtifactMissing {
                path: PathBuf::from("/tmp/results.xml"),
            },
        );
        assert!(!outcome.is_ok());
        assert!(!outcome.is_fatal());
        assert!(outcome.degradation().is_some());
        assert_eq!(outcome.into_result().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_fatal_surfaces_error() {
        let outcome: Outcome<u32> = Outcome::Fatal(ValidatorError::configuration("missing"));
        assert!(outcome.value().is_none());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_map_preserves_variant() {
        let outcome = Outcome::Degraded(
            2u32,
            Degradation::StepFailed {
                step: "build".to_string(),
                reason: "exit 1".to_string(),
            },
        )
        .map(|v| v * 10);
        assert_eq!(outcome.value(), Some(&20));
        assert!(matches!(outcome.degradation(), Some(Degradation::StepFailed { .. })));
    }

    #[test]
    fn test_degradation_display() {
        let reason = Degradation::NoOutcomeRecords {
            path: PathBuf::from("out.xml"),
        };
        assert_eq!(reason.to_string(), "no test cases found in out.xml");
    }
}
