use std::fmt::Debug;

use serde::Serialize;

/// Live-search mode, for backends that support it (xAI).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// The model decides whether to search.
    Auto,
    /// Always search.
    On,
    /// Never search.
    Off,
}

/// Live-search parameters attached to every request of a provider.
///
/// These are static configuration of an agent's backend binding, not
/// runtime input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SearchParameters {
    /// The search mode.
    pub mode: SearchMode,
    /// Cap on the number of search results the backend may consume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_search_results: Option<u32>,
    /// Whether the backend should include citations in the response.
    pub return_citations: bool,
}

impl SearchParameters {
    /// Creates parameters with search always on and the given result cap.
    #[inline]
    pub fn always_on(max_search_results: u32) -> Self {
        Self {
            mode: SearchMode::On,
            max_search_results: Some(max_search_results),
            return_citations: false,
        }
    }
}

/// Builder for [`HostedConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostedConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    search_parameters: Option<SearchParameters>,
}

impl HostedConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            search_parameters: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Attaches live-search parameters.
    #[inline]
    pub fn with_search_parameters(
        mut self,
        search_parameters: SearchParameters,
    ) -> Self {
        self.search_parameters = Some(search_parameters);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HostedConfig {
        HostedConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| "grok-3".to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| "https://api.x.ai/v1".to_string()),
            search_parameters: self.search_parameters,
        }
    }
}

impl Debug for HostedConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("search_parameters", &self.search_parameters)
            .finish()
    }
}

/// Configuration for the hosted model provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostedConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) search_parameters: Option<SearchParameters>,
}

impl Debug for HostedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("search_parameters", &self.search_parameters)
            .finish()
    }
}
