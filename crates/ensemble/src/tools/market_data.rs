use std::time::Duration;

use ensemble_core::tool::{Tool, ToolResult};
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const MAX_SYMBOLS: usize = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize, JsonSchema)]
pub struct MarketDataParameters {
    #[schemars(
        description = "Comma-separated ticker symbols, e.g. 'hype' or 'btc,eth,sol'. Case does not matter."
    )]
    symbols: String,
}

/// A tool fetching market data (price, market cap, 24h change) for
/// crypto assets from CoinGecko.
pub struct MarketDataTool {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    parameter_schema: Value,
}

impl MarketDataTool {
    /// Creates a market data tool. The demo API key is optional; the
    /// public endpoint answers without one, only with tighter rate
    /// limits.
    #[inline]
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
            parameter_schema: schema_for!(MarketDataParameters).to_value(),
        }
    }
}

impl Tool for MarketDataTool {
    type Input = MarketDataParameters;

    fn name(&self) -> &str {
        "market_data"
    }

    fn description(&self) -> &str {
        "Fetches market data (price, market cap, 24h change) from CoinGecko. \
         Pass comma-separated ticker symbols e.g. hype, btc, eth or HYPE, \
         BTC, ETH (lowercased for the API)."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: MarketDataParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();

        async move {
            let symbols = normalize_symbols(&input.symbols);
            if symbols.is_empty() {
                return Ok("Error: No symbols provided. Use ticker symbols \
                           e.g. hype, btc, eth."
                    .to_owned());
            }

            debug!("fetching market data for: {symbols}");
            let mut request = client
                .get(format!("{base_url}/coins/markets"))
                .query(&[("vs_currency", "usd"), ("symbols", &symbols)])
                .timeout(REQUEST_TIMEOUT);
            if let Some(api_key) = &api_key {
                request = request.header("x-cg-demo-api-key", api_key);
            }

            let data: Value = match request
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
            {
                Ok(resp) => match resp.json().await {
                    Ok(data) => data,
                    Err(err) => return Ok(request_failed(&err)),
                },
                Err(err) => return Ok(request_failed(&err)),
            };

            match data.as_array() {
                Some(coins) if !coins.is_empty() => {
                    // Pretty-printing cannot fail for a parsed value.
                    Ok(serde_json::to_string_pretty(&data)
                        .unwrap_or_else(|_| data.to_string()))
                }
                _ => Ok(format!(
                    "Error: No coin found on CoinGecko for '{}'. Report to \
                     user: no market data for that symbol—check ticker at \
                     coingecko.com or try a different symbol.",
                    input.symbols
                )),
            }
        }
    }
}

fn request_failed(err: &reqwest::Error) -> String {
    warn!("market data request failed: {err}");
    format!(
        "Error: CoinGecko request failed ({err}). Report to user: unable \
         to fetch market data (rate limit or service issue); try again \
         later."
    )
}

/// Normalizes a comma-separated ticker list: trimmed, lowercased, empty
/// entries dropped, capped at 20 symbols.
fn normalize_symbols(symbols: &str) -> String {
    symbols
        .split(',')
        .map(str::trim)
        .filter(|symbol| !symbol.is_empty())
        .take(MAX_SYMBOLS)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(",")
}
