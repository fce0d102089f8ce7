use leon::{ParseError, RenderError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unprocessed extra args: [{}]", .0.join(" "))]
    ExtraArgs(Vec<String>),

    #[error("Argument \"{}\" requires at least {} argument(s), got {}", .name, .required, .got)]
    NotEnoughArgs {
        name: String,
        required: usize,
        got: usize,
    },

    #[error("Branching argument must be one of [{}]", .0.join(" "))]
    Branching(Vec<String>),

    #[error("validation for \"{}\" failed: [{}] {}", .key, .validator, .reason)]
    Validation {
        key: String,
        validator: String,
        reason: String,
    },

    #[error("Failed to convert \"{}\" to {} for argument \"{}\"", .value, .kind, .name)]
    Conversion {
        name: String,
        value: String,
        kind: &'static str,
    },

    #[error("{}", .0)]
    Processor(String),

    #[error("The sub process `{}` exited with a non-success code.", .0)]
    SubProcessExit(String),

    #[error("Error with sub process: {}", .0)]
    SubProcess(#[from] std::io::Error),

    #[error("Error parsing placeholder string: {}", .0)]
    Parse(#[from] ParseError),

    #[error("Error rendering placeholder template string: {}", .0)]
    Render(#[from] RenderError),
}

impl Error {
    pub fn processor(message: impl Into<String>) -> Self {
        Self::Processor(message.into())
    }

    pub fn not_enough_args(name: &str, required: usize, got: usize) -> Self {
        Self::NotEnoughArgs {
            name: name.to_string(),
            required,
            got,
        }
    }

    pub fn validation(key: &str, validator: &str, reason: String) -> Self {
        Self::Validation {
            key: key.to_string(),
            validator: validator.to_string(),
            reason,
        }
    }

    /// Whether the error stems from the grammar not matching the provided
    /// arguments, in which case callers print the rendered usage after it.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::ExtraArgs(_) | Self::NotEnoughArgs { .. } | Self::Branching(_)
        )
    }
}
