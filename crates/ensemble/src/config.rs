//! Environment-derived configuration.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// API keys read from the environment (or a `.env` file) at startup.
///
/// Keys are optional at load time; each assistant requests the keys it
/// needs when its team is built, so running `stocks` does not require an
/// OpenRouter key and a missing CoinGecko key only degrades the market
/// data tool.
#[derive(Clone, Default)]
pub struct Config {
    xai_api_key: Option<String>,
    openrouter_api_key: Option<String>,
    coingecko_api_key: Option<String>,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            xai_api_key: read_var("XAI_API_KEY"),
            openrouter_api_key: read_var("OPENROUTER_API_KEY"),
            coingecko_api_key: read_var("COINGECKO_API_KEY"),
        }
    }

    /// Returns the xAI API key.
    #[inline]
    pub fn xai_api_key(&self) -> Result<&str, MissingKeyError> {
        self.xai_api_key
            .as_deref()
            .ok_or(MissingKeyError { name: "XAI_API_KEY" })
    }

    /// Returns the OpenRouter API key.
    #[inline]
    pub fn openrouter_api_key(&self) -> Result<&str, MissingKeyError> {
        self.openrouter_api_key.as_deref().ok_or(MissingKeyError {
            name: "OPENROUTER_API_KEY",
        })
    }

    /// Returns the CoinGecko API key, if one was provided.
    #[inline]
    pub fn coingecko_api_key(&self) -> Option<&str> {
        self.coingecko_api_key.as_deref()
    }
}

#[cfg(test)]
impl Config {
    /// A configuration with every key set, for construction tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            xai_api_key: Some("test-key".to_owned()),
            openrouter_api_key: Some("test-key".to_owned()),
            coingecko_api_key: Some("test-key".to_owned()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("xai_api_key", &self.xai_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "coingecko_api_key",
                &self.coingecko_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// A required environment variable was not set.
#[derive(Clone, Copy, Debug)]
pub struct MissingKeyError {
    name: &'static str,
}

impl Display for MissingKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} environment variable is not set", self.name)
    }
}

impl StdError for MissingKeyError {}
