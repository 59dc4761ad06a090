//! tooluse - a tool-using conversational agent

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    chat_command, demo_command, init_command, invoke_command, status_command, tools_command,
};

/// tooluse - ask questions, the agent calls tools
#[derive(Parser)]
#[command(name = "tooluse")]
#[command(about = "◆ A tool-using conversational agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config
    Init,
    /// Chat with the agent
    Chat {
        /// Message to send; omit for interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List tools and their argument schemas
    Tools,
    /// Run a tool directly, no model involved
    Invoke {
        /// Tool name
        tool: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Run a scripted conversation
    Demo {
        #[arg(value_enum)]
        scenario: Scenario,
    },
    /// Show configuration status
    Status,
}

/// Scripted conversations
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Scenario {
    /// Ask about Cape Town, then "that" in UTC
    FollowUp,
    /// Provoke each tool error, recovering after each
    Errors,
    /// Time follow-up, full reset, then a percentage
    MultiStep,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (label, result) = match cli.command {
        Commands::Init => ("Init", init_command().await),
        Commands::Chat { message } => ("Chat", chat_command(message).await),
        Commands::Tools => ("Tools", tools_command()),
        Commands::Invoke { tool, args } => ("Invoke", invoke_command(&tool, &args)),
        Commands::Demo { scenario } => ("Demo", demo_command(scenario).await),
        Commands::Status => ("Status", status_command().await),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", label, e);
        std::process::exit(1);
    }
}
