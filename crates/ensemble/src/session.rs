//! Interactive session collectors.
//!
//! A collector asks a fixed series of questions and produces a typed
//! detail record for the prompt compiler. Details live for a single loop
//! iteration: they are collected fresh every round and never persisted.
//! An empty answer to the primary question aborts the whole collection,
//! so a half-filled record can never reach an agent.

#[cfg(test)]
use std::collections::VecDeque;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader, Stdin, stdin};
use tokio::select;
use tokio::signal;

/// Tokens that end the session when typed at a top-level prompt.
const EXIT_TOKENS: [&str; 3] = ["exit", "quit", "q"];

/// Returns whether the input asks to end the session.
#[inline]
pub fn is_exit_token(input: &str) -> bool {
    EXIT_TOKENS
        .iter()
        .any(|token| input.eq_ignore_ascii_case(token))
}

/// A source of answers to session questions.
///
/// The terminal console is the production implementation; tests script
/// answers instead.
pub trait Prompt {
    /// Asks one question and waits for the answer, trimmed. Returns
    /// `None` when input ends or the user interrupts.
    fn ask(&mut self, question: &str) -> impl Future<Output = Option<String>>;
}

/// Terminal-backed prompt reading answers from stdin.
pub struct Console {
    stdin: BufReader<Stdin>,
}

impl Console {
    /// Creates a console prompt.
    #[inline]
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(stdin()),
        }
    }
}

impl Default for Console {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for Console {
    async fn ask(&mut self, question: &str) -> Option<String> {
        print!("{question}");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        select! {
            result = self.stdin.read_line(&mut line) => match result {
                Ok(0) => None,
                Ok(_) => Some(line.trim().to_owned()),
                Err(err) => {
                    error!("error reading input: {err}");
                    None
                }
            },
            _ = signal::ctrl_c() => None,
        }
    }
}

/// The outcome of a session collection.
pub enum Collected<T> {
    /// Every question was answered; the record is complete.
    Details(T),
    /// The primary question got an empty answer; nothing was collected.
    NoDetails,
    /// The user asked to stop, interrupted, or input ended.
    Quit,
}

/// Details describing one trip, collected per planning round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripDetails {
    /// Where the trip goes. Always present; collection aborts without it.
    pub destination: String,
    /// Free-form transportation answer, lowercased.
    pub transport_mode: String,
    /// Only asked when the transport answer mentions flying.
    pub departure_city: Option<String>,
    /// Trip duration, as the user phrased it.
    pub days: String,
    /// What the user wants to do there.
    pub description: String,
}

/// Collects trip details through multi-step questions.
pub async fn collect_trip_details<P: Prompt>(
    prompt: &mut P,
) -> Collected<TripDetails> {
    let Some(destination) = prompt.ask("Where are we traveling to? ").await
    else {
        return Collected::Quit;
    };
    if is_exit_token(&destination) {
        return Collected::Quit;
    }
    if destination.is_empty() {
        return Collected::NoDetails;
    }

    let Some(transport_mode) = prompt.ask("Are we flying or driving? ").await
    else {
        return Collected::Quit;
    };
    let transport_mode = transport_mode.to_lowercase();

    let departure_city = if transport_mode.contains("fly") {
        let Some(city) = prompt.ask("Where are we flying from? ").await else {
            return Collected::Quit;
        };
        Some(city)
    } else {
        None
    };

    let Some(days) = prompt.ask("How many days? ").await else {
        return Collected::Quit;
    };

    let Some(description) = prompt
        .ask("Brief description of what you want to do: ")
        .await
    else {
        return Collected::Quit;
    };

    Collected::Details(TripDetails {
        destination,
        transport_mode,
        departure_city,
        days,
        description,
    })
}

/// Details describing one crypto analysis round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptoDetails {
    /// Comma-separated assets of interest. Always present.
    pub assets: String,
    /// Analysis timeframe, lowercased; defaults to "daily".
    pub timeframe: String,
    /// The user's goal (hold, trade, research, learn), lowercased.
    pub goal: String,
}

/// Collects crypto analysis details through multi-step questions.
pub async fn collect_crypto_details<P: Prompt>(
    prompt: &mut P,
) -> Collected<CryptoDetails> {
    let Some(assets) = prompt
        .ask("Which crypto assets are you interested in? (e.g. BTC, ETH, SOL): ")
        .await
    else {
        return Collected::Quit;
    };
    if is_exit_token(&assets) {
        return Collected::Quit;
    }
    if assets.is_empty() {
        return Collected::NoDetails;
    }

    let Some(timeframe) = prompt
        .ask("What timeframe? (e.g. daily, weekly, monthly): ")
        .await
    else {
        return Collected::Quit;
    };
    let timeframe = timeframe.to_lowercase();
    let timeframe = if timeframe.is_empty() {
        "daily".to_owned()
    } else {
        timeframe
    };

    let Some(goal) = prompt
        .ask("What's your goal? (hold, trade, research, learn): ")
        .await
    else {
        return Collected::Quit;
    };

    Collected::Details(CryptoDetails {
        assets,
        timeframe,
        goal: goal.to_lowercase(),
    })
}

/// Asks a yes/no question; only "yes" or "y" (case-insensitive) counts
/// as a yes. End of input counts as a no.
pub async fn confirm<P: Prompt>(prompt: &mut P, question: &str) -> bool {
    let Some(answer) = prompt.ask(question).await else {
        return false;
    };
    let answer = answer.to_lowercase();
    answer == "yes" || answer == "y"
}

/// A prompt answering from a scripted queue, for tests.
#[cfg(test)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    pub questions: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new<const N: usize>(answers: [&str; N]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|answer| Some((*answer).to_owned()))
                .collect(),
            questions: Vec::new(),
        }
    }

    /// Simulates end of input after the queued answers run out.
    pub fn push_eof(&mut self) {
        self.answers.push_back(None);
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    async fn ask(&mut self, question: &str) -> Option<String> {
        self.questions.push(question.to_owned());
        self.answers.pop_front().flatten()
    }
}
