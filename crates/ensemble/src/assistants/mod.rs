//! The four interactive assistants.
//!
//! Each submodule owns a team construction function and its interactive
//! loop. Teams are built by explicit construction per run (and, for the
//! detail-driven assistants, per loop iteration, so member briefs
//! reflect the freshly collected details).

pub mod ask;
pub mod crypto;
pub mod stocks;
pub mod travel;

use std::cell::RefCell;
use std::io::Write as _;
use std::time::Duration;

use ensemble_core::{ModelClient, Team, TeamChunk};
use ensemble_hosted_model::{
    HostedConfigBuilder, HostedProvider, SearchParameters,
};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::config::{Config, MissingKeyError};

const BAR_CHAR: &str = "▎";

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENROUTER_MODEL: &str = "openai/gpt-4o";
const LIVE_SEARCH_MAX_RESULTS: u32 = 20;

/// A model client on xAI's grok backend.
fn grok_client(config: &Config) -> Result<ModelClient, MissingKeyError> {
    let config =
        HostedConfigBuilder::with_api_key(config.xai_api_key()?).build();
    Ok(ModelClient::new(HostedProvider::new(config)))
}

/// Like [`grok_client`], with live search always on.
fn grok_live_search_client(
    config: &Config,
) -> Result<ModelClient, MissingKeyError> {
    let config = HostedConfigBuilder::with_api_key(config.xai_api_key()?)
        .with_search_parameters(SearchParameters::always_on(
            LIVE_SEARCH_MAX_RESULTS,
        ))
        .build();
    Ok(ModelClient::new(HostedProvider::new(config)))
}

/// A model client on OpenRouter.
fn openrouter_client(
    config: &Config,
) -> Result<ModelClient, MissingKeyError> {
    let config =
        HostedConfigBuilder::with_api_key(config.openrouter_api_key()?)
            .with_base_url(OPENROUTER_BASE_URL)
            .with_model(OPENROUTER_MODEL)
            .build();
    Ok(ModelClient::new(HostedProvider::new(config)))
}

/// Streams one team response to the terminal: a spinner until the first
/// chunk, member sections when the team shows them, then the
/// coordinator's answer. Failures are printed and the loop goes on; no
/// automatic retries.
async fn stream_team_response(team: &Team, query: &str) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message("🤔 Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let spinner = RefCell::new(Some(spinner));
    let current_member = RefCell::new(None::<String>);
    let result = team
        .respond(query, |chunk| {
            if let Some(spinner) = spinner.borrow_mut().take() {
                spinner.finish_and_clear();
            }
            match chunk {
                TeamChunk::Member { name, text } => {
                    let mut current = current_member.borrow_mut();
                    if current.as_deref() != Some(name) {
                        println!(
                            "\n{}{}",
                            BAR_CHAR.bright_yellow(),
                            name.bright_white().bold()
                        );
                        *current = Some(name.to_owned());
                    }
                    print!("{text}");
                    std::io::stdout().flush().ok();
                }
                TeamChunk::Coordinator(text) => {
                    if current_member.borrow_mut().take().is_some() {
                        println!();
                    }
                    print!("{text}");
                    std::io::stdout().flush().ok();
                }
            }
        })
        .await;

    if let Some(spinner) = spinner.borrow_mut().take() {
        spinner.finish_and_clear();
    }
    match result {
        Ok(_) => println!(),
        Err(err) => {
            error!("team response failed: {err}");
            println!(
                "{}",
                format!(
                    "Could not complete the request: {err}. Try again later."
                )
                .bright_red()
            );
        }
    }
}
