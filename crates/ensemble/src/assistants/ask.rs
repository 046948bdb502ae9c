//! Weather and live-search Q&A.

use ensemble_core::{Agent, Team};

use super::{grok_client, grok_live_search_client, stream_team_response};
use crate::config::{Config, MissingKeyError};
use crate::session::{Console, Prompt, is_exit_token};
use crate::tools::WebSearchTool;

/// Builds the Q&A team: a weather agent with web search and a
/// live-search agent on grok's built-in search.
pub fn build_team(config: &Config) -> Result<Team, MissingKeyError> {
    let weather_agent = Agent::builder(grok_client(config)?)
        .with_name("Weather agent")
        .with_role("Get the weather of a certain City")
        .add_instruction(
            "Use the web_search tool to search the web for the weather in a \
             given city.",
        )
        .with_tool(WebSearchTool::new())
        .build();

    let live_search_agent = Agent::builder(grok_live_search_client(config)?)
        .with_name("Live search agent")
        .with_role("Live search for a given question")
        .build();

    Ok(Team::builder(grok_client(config)?)
        .with_name("Ask team")
        .add_instruction(
            "You are a team of agents that are tasked with things like \
             finding the weather of a given city or a live search question.",
        )
        .add_member(weather_agent)
        .add_member(live_search_agent)
        .show_members_responses(true)
        .build())
}

/// Runs the interactive Q&A loop.
pub async fn run(config: &Config) -> Result<(), MissingKeyError> {
    let team = build_team(config)?;

    println!(
        "Welcome! Ask questions about weather, or anything else you want to \
         know."
    );
    println!("Type 'exit', 'quit', or 'q' to stop.\n");

    let mut console = Console::new();
    loop {
        let Some(query) = console.ask("Your question: ").await else {
            println!("\n\nGoodbye!");
            return Ok(());
        };
        if is_exit_token(&query) {
            println!("Goodbye!");
            return Ok(());
        }
        if query.is_empty() {
            println!("Please enter a question.\n");
            continue;
        }

        println!();
        stream_team_response(&team, &query).await;
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_team_requires_xai_key() {
        assert!(build_team(&Config::default()).is_err());
        assert!(build_team(&Config::for_tests()).is_ok());
    }
}
