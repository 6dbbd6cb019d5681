pub mod challenge;
pub mod error;
pub mod outcome;
pub mod types;

pub use challenge::ChallengeConfig;
pub use error::{Result, ValidatorError};
pub use outcome::{Degradation, Outcome};
