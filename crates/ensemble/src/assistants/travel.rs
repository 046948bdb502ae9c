//! The travel planning assistant.

use ensemble_core::{Agent, Team};

use super::{grok_client, stream_team_response};
use crate::config::{Config, MissingKeyError};
use crate::prompts::TravelRole;
use crate::session::{
    Collected, Console, TripDetails, collect_trip_details, confirm,
};
use crate::tools::WebSearchTool;

/// Builds the travel team for one collected trip. Each member gets its
/// compiled brief appended to its instructions, so the team is rebuilt
/// per planning round.
pub fn build_team(
    config: &Config,
    details: &TripDetails,
) -> Result<Team, MissingKeyError> {
    let weather_agent = Agent::builder(grok_client(config)?)
        .with_name("Weather agent")
        .with_role("Get the weather of a certain City")
        .add_instruction(
            "Use the web_search tool to check the weather at the \
             destination.",
        )
        .add_instruction(TravelRole::Weather.compile(details))
        .with_tool(WebSearchTool::new())
        .build();

    let travel_agent = Agent::builder(grok_client(config)?)
        .with_name("Travel agent")
        .with_role("Plan a trip to a given destination")
        .add_instruction(TravelRole::Travel.compile(details))
        .build();

    let events_agent = Agent::builder(grok_client(config)?)
        .with_name("Events agent")
        .with_role("Find events in a given destination")
        .add_instruction(TravelRole::Events.compile(details))
        .build();

    Ok(Team::builder(grok_client(config)?)
        .with_name("Travel team")
        .add_instruction(
            "You are a team of agents that are tasked with planning a trip \
             to a given destination.",
        )
        .add_member(weather_agent)
        .add_member(travel_agent)
        .add_member(events_agent)
        .show_members_responses(true)
        .build())
}

fn print_summary(details: &TripDetails) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    println!("Trip Summary:");
    println!("Destination: {}", details.destination);
    println!("Transport: {}", details.transport_mode);
    if let Some(city) = &details.departure_city {
        println!("Departing from: {city}");
    }
    println!("Duration: {} days", details.days);
    println!("Activities: {}", details.description);
    println!("{rule}\n");
}

/// Runs the interactive trip planning loop.
pub async fn run(config: &Config) -> Result<(), MissingKeyError> {
    println!("Welcome to the Travel Planning Assistant!");
    println!("Type 'exit', 'quit', or 'q' at any prompt to stop.\n");

    let mut console = Console::new();
    loop {
        println!("Let's plan your trip! Please answer a few questions:\n");
        let details = match collect_trip_details(&mut console).await {
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
        let query = TravelRole::Travel.compile(&details);
        println!("Getting travel recommendations...\n");
        stream_team_response(&team, &query).await;
        println!();

        if !confirm(&mut console, "\nPlan another trip? (yes/no): ").await {
            println!("Goodbye!");
            return Ok(());
        }
        println!();
    }
}
