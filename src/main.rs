//! stackchat - demo drivers for a Llama Stack server
//!
//! Main entry point dispatching to the individual drivers.

use clap::{Parser, Subcommand};
use stackchat::demos;
use stackchat::Config;

/// stackchat - demo drivers for a Llama Stack server
#[derive(Parser, Debug)]
#[command(name = "stackchat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stack server base URL
    #[arg(long)]
    url: Option<String>,

    /// Model id used for inference
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Function calling with in-process tools
    FunctionCalling,
    /// Function calling with tools from a local MCP server
    LocalMcp,
    /// Register the MCP toolgroup with the stack
    RegisterMcp,
    /// Server-side agent using the MCP toolgroup
    AgentMcp,
    /// Safety shields, manually and on an agent
    Guardrails,
    /// Retrieval-augmented chat completion
    RagChat {
        /// Directory of markdown documents to ingest
        #[arg(long)]
        docs: Option<String>,
    },
    /// Server-side agent with the RAG toolgroup
    RagAgent {
        /// Directory of markdown documents to ingest
        #[arg(long)]
        docs: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration and apply CLI overrides
    let mut config = Config::load();

    if let Some(url) = args.url {
        config.stack.base_url = url;
    }

    if let Some(model) = args.model {
        config.model.id = model;
    }

    if args.verbose {
        config.chat.verbose = true;
    }

    match args.command {
        Command::FunctionCalling => demos::function_calling::run(&config).await?,
        Command::LocalMcp => demos::local_mcp::run(&config).await?,
        Command::RegisterMcp => demos::register_mcp::run(&config).await?,
        Command::AgentMcp => demos::agent_mcp::run(&config).await?,
        Command::Guardrails => demos::guardrails::run(&config).await?,
        Command::RagChat { docs } => {
            if let Some(docs) = docs {
                config.rag.docs_dir = docs;
            }
            demos::rag_chat::run(&config).await?
        }
        Command::RagAgent { docs } => {
            if let Some(docs) = docs {
                config.rag.docs_dir = docs;
            }
            demos::rag_agent::run(&config).await?
        }
    }

    Ok(())
}
