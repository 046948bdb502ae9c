use std::time::Duration;

use ensemble_core::tool::{Tool, ToolResult};
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const KEY_STATISTICS_URL: &str = "https://finance.yahoo.com/quote";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// Key-statistics pages run large; keep the extracted text within a
// prompt-friendly bound.
const MAX_CONTENT_LEN: usize = 16 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Deserialize, JsonSchema)]
pub struct KeyStatisticsParameters {
    #[schemars(description = "Stock ticker symbol, e.g. 'AAPL'.")]
    ticker: String,
}

/// A tool fetching a company's key statistics page from Yahoo Finance
/// and reducing it to plain text for the financial info agent.
pub struct KeyStatisticsTool {
    client: Client,
    base_url: String,
    parameter_schema: Value,
}

impl KeyStatisticsTool {
    /// Creates a key statistics tool.
    #[inline]
    pub fn new() -> Self {
        Self::with_base_url(KEY_STATISTICS_URL)
    }

    fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            parameter_schema: schema_for!(KeyStatisticsParameters).to_value(),
        }
    }
}

impl Default for KeyStatisticsTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for KeyStatisticsTool {
    type Input = KeyStatisticsParameters;

    fn name(&self) -> &str {
        "key_statistics"
    }

    fn description(&self) -> &str {
        "Fetches the basic financial information (key statistics) of a \
         company from its Yahoo Finance page. Pass the company's stock \
         ticker, e.g. 'AAPL'."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: KeyStatisticsParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let base_url = self.base_url.clone();

        async move {
            let ticker = input.ticker.trim().to_uppercase();
            if ticker.is_empty() {
                return Ok(
                    "Error: No ticker provided. Pass a stock ticker, e.g. \
                     'AAPL'."
                        .to_owned(),
                );
            }

            let url = format!(
                "{base_url}/{}/key-statistics",
                urlencoding::encode(&ticker)
            );
            debug!("fetching key statistics: {url}");
            let html = match client
                .get(&url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
            {
                Ok(resp) => match resp.text().await {
                    Ok(html) => html,
                    Err(err) => return Ok(request_failed(&ticker, &err)),
                },
                Err(err) => return Ok(request_failed(&ticker, &err)),
            };

            let mut text = super::html::strip_html_tags(&html);
            if text.is_empty() {
                return Ok(format!(
                    "Error: key statistics page for '{ticker}' was empty. \
                     Report to user: no financial information available."
                ));
            }
            if let Some((end, _)) = text.char_indices().nth(MAX_CONTENT_LEN) {
                text.truncate(end);
            }
            Ok(text)
        }
    }
}

fn request_failed(ticker: &str, err: &reqwest::Error) -> String {
    warn!("key statistics request failed: {err}");
    format!(
        "Error: failed to fetch key statistics for '{ticker}' ({err}). \
         Report to user: financial information is unavailable right now; \
         try again later."
    )
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_empty_ticker_makes_no_request() {
        let tool = KeyStatisticsTool::with_base_url("http://127.0.0.1:1");
        let output = tool
            .execute(KeyStatisticsParameters {
                ticker: "  ".to_owned(),
            })
            .await
            .unwrap();
        assert!(output.starts_with("Error: No ticker provided."));
    }

    #[tokio::test]
    async fn test_page_is_stripped_to_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            stream.read(&mut buf).await.unwrap();
            let body = "<html><body><h1>AAPL</h1><td>Market Cap</td>\
                        <td>3.4T</td></body></html>";
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(resp.as_bytes()).await.unwrap();
        });

        let tool = KeyStatisticsTool::with_base_url(format!("http://{addr}"));
        let output = tool
            .execute(KeyStatisticsParameters {
                ticker: "aapl".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(output, "AAPL Market Cap 3.4T");
    }

    #[tokio::test]
    async fn test_server_error_becomes_sentinel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            stream.read(&mut buf).await.unwrap();
            stream
                .write_all(
                    b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\
                      connection: close\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let tool = KeyStatisticsTool::with_base_url(format!("http://{addr}"));
        let output = tool
            .execute(KeyStatisticsParameters {
                ticker: "NOPE".to_owned(),
            })
            .await
            .unwrap();
        assert!(output.starts_with("Error: failed to fetch key statistics"));
    }
}
