use std::error::Error as StdError;
use std::fmt::{self, Display};

use ensemble_model::ModelProviderError;

/// The error type for agent and team responses.
#[derive(Debug)]
pub enum RespondError {
    /// The model provider returned an error.
    Provider(Box<dyn ModelProviderError>),
    /// The model kept requesting tool calls past the turn limit.
    TurnLimitExceeded,
}

impl Display for RespondError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespondError::Provider(err) => {
                write!(f, "model provider error: {err}")
            }
            RespondError::TurnLimitExceeded => {
                write!(f, "tool call turn limit exceeded")
            }
        }
    }
}

impl StdError for RespondError {}

impl From<Box<dyn ModelProviderError>> for RespondError {
    #[inline]
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        RespondError::Provider(err)
    }
}
