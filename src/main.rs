//! Server and command-line entry point.
//!
//! ```bash
//! pubmed-research                       # serve the HTTP API (default)
//! pubmed-research ask "What is known about caffeine and sleep?"
//! pubmed-research research "effects of caffeine on sleep" --pretty
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use pubmed_research::{
    config::Config, create_router, types::LLMMessage, utils::init_logger, workflow::TriggerData,
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "pubmed-research", version, about = "Research assistant agent and PubMed workflow")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve,
    /// Ask the research assistant a question
    Ask {
        question: String,
    },
    /// Run the PubMed research workflow and print the run as JSON
    Research {
        query: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!("Configuration loaded: {:?}", config.server);

    let state = AppState::from_config(config)
        .await
        .context("failed to initialize application state")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Ask { question } => {
            let response = state.agent.generate(vec![LLMMessage::user(question)]).await?;
            println!("{}", response.text);
            Ok(())
        }
        Command::Research { query, pretty } => {
            let run = state.workflow.run(TriggerData { query }).await;
            let output = if pretty {
                serde_json::to_string_pretty(&run)?
            } else {
                serde_json::to_string(&run)?
            };
            println!("{}", output);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("invalid HOST/PORT")?;
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
