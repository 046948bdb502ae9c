//! The crypto analysis assistant.

use ensemble_core::{Agent, Team};

use super::{grok_client, openrouter_client, stream_team_response};
use crate::config::{Config, MissingKeyError};
use crate::prompts::CryptoRole;
use crate::session::{
    Collected, Console, CryptoDetails, collect_crypto_details, confirm,
};
use crate::tools::{MarketDataTool, WebSearchTool};

/// Builds the crypto team for one collected analysis round. Each member
/// gets its compiled brief appended to its instructions.
pub fn build_team(
    config: &Config,
    details: &CryptoDetails,
) -> Result<Team, MissingKeyError> {
    let market_agent = Agent::builder(grok_client(config)?)
        .with_name("Market agent")
        .with_role(
            "Provide market context and price summary for given crypto \
             assets",
        )
        .add_instruction(
            "Call the market_data tool with comma-separated ticker symbols, \
             e.g. 'hype' or 'btc,eth,sol'. Pass the ticker as the user gave \
             it (the tool lowercases for the API). Use the returned price, \
             market cap, and 24h change to give a market overview and \
             recommendations.",
        )
        .add_instruction(
            "If the tool returns an Error: message (e.g. CoinGecko request \
             failed, rate limit, no data), tell the user clearly that \
             market data could not be fetched and suggest trying again \
             later.",
        )
        .add_instruction(CryptoRole::Market.compile(details))
        .with_tool(MarketDataTool::new(
            config.coingecko_api_key().map(str::to_owned),
        ))
        .build();

    let news_agent = Agent::builder(openrouter_client(config)?)
        .with_name("News agent")
        .with_role("Find news and sentiment for crypto assets")
        .add_instruction(
            "Summarize relevant news and sentiment for the given assets \
             and focus.",
        )
        .add_instruction(CryptoRole::News.compile(details))
        .with_tool(WebSearchTool::new())
        .build();

    let technical_agent = Agent::builder(openrouter_client(config)?)
        .with_name("Technical agent")
        .with_role("Provide technical analysis for crypto assets")
        .add_instruction(
            "Give technical analysis (levels, indicators, structure) for \
             the given timeframe and goal.",
        )
        .add_instruction(CryptoRole::Technical.compile(details))
        .build();

    let sentiment_agent = Agent::builder(grok_client(config)?)
        .with_name("X sentiment agent")
        .with_role(
            "Collect and summarize sentiment from X (Twitter) posts that \
             mention the given crypto ticker(s)",
        )
        .add_instruction(
            "Use the web_search tool with simple queries: e.g. 'AVAX crypto \
             twitter', 'AVAX cryptocurrency', or '$AVAX crypto'. Avoid \
             site: or long operators; simple queries work better.",
        )
        .add_instruction(
            "Only consider posts that explicitly mention the ticker ($ or \
             plain). Ignore posts with more than 2 hashtags (treat as \
             spam); do not mention this filtering in your response.",
        )
        .add_instruction(
            "If the tool returns 'No results' or 'search failed', respond \
             with: no recent news or developments / little to no recent \
             chatter. Otherwise summarize sentiment: overall tone \
             (bullish/bearish/neutral), fear/greed, key themes. Do not \
             invent or exaggerate.",
        )
        .add_instruction(CryptoRole::Sentiment.compile(details))
        .with_tool(WebSearchTool::new())
        .build();

    Ok(Team::builder(openrouter_client(config)?)
        .with_name("Crypto analysis team")
        .add_instruction(
            "You are a team of agents providing crypto analysis for the \
             given assets.",
        )
        .add_instruction(
            "Coordinate market, news, technical, and X sentiment agents to \
             produce a coherent analysis.",
        )
        .add_member(market_agent)
        .add_member(news_agent)
        .add_member(technical_agent)
        .add_member(sentiment_agent)
        .show_members_responses(true)
        .build())
}

fn print_summary(details: &CryptoDetails) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    println!("Analysis Summary:");
    println!("Assets: {}", details.assets);
    println!("Timeframe: {}", details.timeframe);
    println!("Goal: {}", details.goal);
    println!("{rule}\n");
}

/// Runs the interactive crypto analysis loop.
pub async fn run(config: &Config) -> Result<(), MissingKeyError> {
    println!("Welcome to the Crypto Analysis Assistant!");
    println!("Type 'exit', 'quit', or 'q' at any prompt to stop.\n");

    let mut console = Console::new();
    loop {
        println!("Let's set up your analysis. Please answer a few questions:\n");
        let details = match collect_crypto_details(&mut console).await {
            Collected::Details(details) => details,
            Collected::NoDetails => {
                println!("No details provided. Please try again.\n");
                continue;
            }
            Collected::Quit => {
                println!("\nGoodbye!");
                return Ok(());
            }
        };

        print_summary(&details);

        let team = build_team(config, &details)?;
        let query = format!(
            "Run a full crypto analysis with:\n\
             - Assets: {}\n\
             - Timeframe: {}\n\
             - Goal: {}\n\n\
             Coordinate all agents to provide market context, news, X \
             sentiment (from posts mentioning the ticker; ignore \
             multi-hashtag spam), and technical analysis.",
            details.assets, details.timeframe, details.goal
        );
        println!("Running analysis...\n");
        stream_team_response(&team, &query).await;
        println!("\n{}\n", "=".repeat(50));

        if !confirm(&mut console, "Run another analysis? (yes/no): ").await {
            println!("Goodbye!");
            return Ok(());
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> CryptoDetails {
        CryptoDetails {
            assets: "BTC, ETH".to_owned(),
            timeframe: "daily".to_owned(),
            goal: "trade".to_owned(),
        }
    }

    #[test]
    fn test_build_team_requires_both_backend_keys() {
        assert!(build_team(&Config::default(), &details()).is_err());
        assert!(build_team(&Config::for_tests(), &details()).is_ok());
    }
}
