use std::sync::LazyLock;
use std::time::Duration;

use ensemble_core::tool::{Tool, ToolResult};
use regex::Regex;
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_MAX_RESULTS: usize = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// The HTML endpoint rejects clients that look like bots.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Result anchors in the DuckDuckGo HTML page:
//   <a class="result__a" href="...">TITLE</a>
//   <a class="result__snippet">SNIPPET</a>
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("title regex")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)
        .expect("snippet regex")
});

#[derive(Deserialize, JsonSchema)]
pub struct WebSearchParameters {
    #[schemars(
        description = "Simple search query, e.g. 'AVAX crypto twitter' or 'weather in Tokyo'. Avoid site: or complex operators."
    )]
    query: String,
    #[schemars(description = "Maximum number of results to return.")]
    max_results: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
struct SearchHit {
    title: String,
    url: String,
    snippet: String,
}

/// A web search tool backed by the DuckDuckGo HTML endpoint, which
/// needs no API key.
///
/// A failed or rate-limited search is reported as a "No results"
/// sentinel rather than an error, so agents summarizing sentiment can
/// say "no recent chatter" instead of crashing the session.
pub struct WebSearchTool {
    client: Client,
    endpoint: String,
    parameter_schema: Value,
}

impl WebSearchTool {
    /// Creates a web search tool.
    #[inline]
    pub fn new() -> Self {
        Self::with_endpoint(SEARCH_ENDPOINT)
    }

    fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            parameter_schema: schema_for!(WebSearchParameters).to_value(),
        }
    }
}

impl Default for WebSearchTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WebSearchTool {
    type Input = WebSearchParameters;

    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web. Use simple queries like 'AVAX crypto twitter' or \
         'AVAX cryptocurrency'. Avoid site: or complex operators. Returns \
         search results or a message if the search failed (e.g. rate limit)."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WebSearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let max_results = input.max_results.unwrap_or(DEFAULT_MAX_RESULTS);

        async move {
            debug!("searching the web for: {}", input.query);
            let resp = client
                .get(endpoint)
                .query(&[("q", input.query.as_str())])
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);
            let html = match resp {
                Ok(resp) => match resp.text().await {
                    Ok(html) => html,
                    Err(err) => {
                        warn!("search response unreadable: {err}");
                        return Ok(search_failed());
                    }
                },
                Err(err) => {
                    warn!("search request failed: {err}");
                    return Ok(search_failed());
                }
            };

            let hits = parse_results(&html, max_results);
            if hits.is_empty() {
                return Ok("No results found. Report: no recent news or \
                           developments."
                    .to_owned());
            }
            // Serializing a vec of plain strings cannot fail.
            Ok(serde_json::to_string_pretty(&hits)
                .unwrap_or_else(|_| search_failed()))
        }
    }
}

fn search_failed() -> String {
    "No results (search failed or rate limited). Report: no recent news or \
     developments."
        .to_owned()
}

fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let snippets: Vec<String> = SNIPPET_RE
        .captures_iter(html)
        .map(|cap| {
            super::html::strip_html_tags(cap.get(1).map_or("", |m| m.as_str()))
        })
        .collect();

    TITLE_RE
        .captures_iter(html)
        .enumerate()
        .take(max_results)
        .map(|(i, cap)| SearchHit {
            title: super::html::strip_html_tags(
                cap.get(2).map_or("", |m| m.as_str()),
            ),
            url: extract_real_url(cap.get(1).map_or("", |m| m.as_str())),
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .filter(|hit| !hit.url.is_empty() && !hit.title.is_empty())
        .collect()
}

/// DuckDuckGo wraps result URLs in a redirect
/// (`//duckduckgo.com/l/?uddg=REAL_URL&...`); unwrap to the destination.
fn extract_real_url(raw: &str) -> String {
    let Some(pos) = raw.find("uddg=") else {
        return raw.to_owned();
    };
    let rest = &raw[pos + 5..];
    let end = rest.find('&').unwrap_or(rest.len());
    urlencoding::decode(&rest[..end])
        .map(|url| url.into_owned())
        .unwrap_or_else(|_| rest[..end].to_owned())
}
