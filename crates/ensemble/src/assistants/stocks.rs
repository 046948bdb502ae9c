//! The stock analysis assistant.

use ensemble_core::{Agent, Team};

use super::{grok_client, stream_team_response};
use crate::config::{Config, MissingKeyError};
use crate::session::{Console, Prompt, is_exit_token};
use crate::tools::KeyStatisticsTool;

/// Builds the stocks team: ticker lookup, financial info, news and a
/// final analysis pass, chained by the coordinator's instructions.
pub fn build_team(config: &Config) -> Result<Team, MissingKeyError> {
    let get_ticker_agent = Agent::builder(grok_client(config)?)
        .with_name("Get ticker agent")
        .with_role("Get the ticker of a given company")
        .add_instruction(
            "Based on user input, get the ticker of the company. We will \
             need the ticker of the company to get the basic financial \
             information. We will be passing the ticker to the financial \
             info agent.",
        )
        .build();

    let financial_info_agent = Agent::builder(grok_client(config)?)
        .with_name("Financial info agent")
        .with_role("Get the basic financial information of a given company")
        .add_instruction(
            "Use the key_statistics tool with the company's ticker to \
             fetch the basic financial information of the company.",
        )
        .add_instruction(
            "Report the fetched financial information so the analysis \
             agent can analyze it.",
        )
        .with_tool(KeyStatisticsTool::new())
        .build();

    let news_agent = Agent::builder(grok_client(config)?)
        .with_name("News agent")
        .with_role("Get the news about a given company")
        .add_instruction(
            "Gather the news about a given company, keep it short and to \
             the point. Only gather the latest news that seems relevant to \
             the company.",
        )
        .build();

    let analysis_agent = Agent::builder(grok_client(config)?)
        .with_name("Analysis agent")
        .with_role("Analyze the financial information of a given company")
        .add_instruction(
            "Analyze the financial information from the financial info \
             agent. Also analyze the news from the news agent. Do not make \
             any assumptions, only use the information provided to you, \
             analyze the financial information of the company and make a \
             conclusion based on the information provided.",
        )
        .build();

    Ok(Team::builder(grok_client(config)?)
        .with_name("Stocks team")
        .add_instruction(
            "You are a team of agents that are tasked with getting the \
             stocks of a given company. You will be passing the company \
             name to the get_ticker_agent to get the ticker of the \
             company. You will be passing the ticker to the \
             financial_info_agent to get the basic financial information \
             of the company. You will be passing the company name to the \
             news_agent to get the news about the company. You will be \
             passing all the information to the analysis_agent to analyze \
             the financial information of the company.",
        )
        .add_member(get_ticker_agent)
        .add_member(financial_info_agent)
        .add_member(news_agent)
        .add_member(analysis_agent)
        .show_members_responses(true)
        .build())
}

/// Runs the interactive stock analysis loop.
pub async fn run(config: &Config) -> Result<(), MissingKeyError> {
    let team = build_team(config)?;

    println!("Welcome to the Stocks Assistant!");
    println!("Type 'exit', 'quit', or 'q' to stop.\n");

    let mut console = Console::new();
    loop {
        let Some(query) = console
            .ask("Enter the company name you want to analyze: ")
            .await
        else {
            println!("\n\nGoodbye!");
            return Ok(());
        };
        if is_exit_token(&query) {
            println!("Goodbye!");
            return Ok(());
        }
        if query.is_empty() {
            println!("Please enter a company name.\n");
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

    // The coordinator instruction references members by their tool
    // names; those must stay in sync with the member names above.
    #[test]
    fn test_member_slugs_match_coordinator_instruction() {
        let team = build_team(&Config::for_tests()).unwrap();
        let slugs: Vec<_> = team
            .members()
            .map(|member| ensemble_core::member_slug(member.name()))
            .collect();
        assert_eq!(
            slugs,
            [
                "get_ticker_agent",
                "financial_info_agent",
                "news_agent",
                "analysis_agent"
            ]
        );
    }
}
