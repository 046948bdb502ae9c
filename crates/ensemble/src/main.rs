use clap::{Parser, Subcommand};
use ensemble::assistants;
use ensemble::config::Config;

#[derive(Parser)]
#[command(name = "ensemble", about = "Interactive multi-agent assistants")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask about the weather, or anything else worth a live search.
    Ask,
    /// Plan a trip with a team of travel agents.
    Travel,
    /// Analyze crypto assets: market, news, technicals and X sentiment.
    Crypto,
    /// Analyze a company's stock from its financials and news.
    Stocks,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // A missing .env file is fine; keys may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Command::Ask => assistants::ask::run(&config).await,
        Command::Travel => assistants::travel::run(&config).await,
        Command::Crypto => assistants::crypto::run(&config).await,
        Command::Stocks => assistants::stocks::run(&config).await,
    };
    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
