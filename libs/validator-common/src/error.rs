use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("command exited with {}: {stderr}", describe_exit(.exit_code))]
    Execution {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {}s", .after.as_secs())]
    TimedOut { command: String, after: Duration },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}

impl ValidatorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Only configuration problems abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
