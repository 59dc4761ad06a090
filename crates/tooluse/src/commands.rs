//! tooluse command implementations

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use tracing::{info, warn};

use tooluse_agent::{AgentLoop, ConversationState, ToolExecutor, TurnReport};
use tooluse_config::{self, Config};
use tooluse_provider::{OpenAiCompatProvider, Provider};
use tooluse_tools::ToolRegistry;

use crate::Scenario;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Write a default config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing tooluse...");
    println!("{}", RULE);

    let path = tooluse_config::config_path();
    tooluse_config::init_at(&path)
        .await
        .with_context(|| format!("Could not initialize {}", path.display()))?;

    println!("\n◆ Config ready at {}", path.display());
    println!("\nNext steps:");
    println!("  1. Add your API key to {}", path.display());
    println!("     or export TOOLUSE_API_KEY / GOOGLE_API_KEY");
    println!("  2. Start chatting: tooluse chat -m \"What time is it in Tokyo?\"");

    Ok(())
}

/// Connect a provider from the config
fn build_agent(config: &Config) -> Result<AgentLoop<OpenAiCompatProvider>> {
    let api_key = config.api_key().with_context(|| {
        format!(
            "No API key configured. Set one in {} or export TOOLUSE_API_KEY",
            tooluse_config::config_path().display()
        )
    })?;

    let provider = OpenAiCompatProvider::new(api_key, config.api_base(), Some(config.model()));
    info!(
        "Using {:?} backend with model {}",
        provider.backend(),
        config.model()
    );

    Ok(AgentLoop::from_config(provider, config))
}

fn print_report(report: &TurnReport) {
    for run in &report.tool_runs {
        println!("  → {} {}", run.tool_name, run.args_used);
    }
    println!("\n◆ {}\n", report.answer);
}

fn print_state(state: &ConversationState) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    println!("Summary: {}", state.context_summary());
    Ok(())
}

/// One-shot or interactive chat
pub async fn chat_command(message: Option<String>) -> Result<()> {
    let config = Config::load().await?;
    let mut agent = build_agent(&config)?;

    if let Some(msg) = message {
        let report = agent.run_turn(&msg).await?;
        print_report(&report);
        return Ok(());
    }

    println!("◆ Interactive mode (type 'exit' to quit)");
    println!("  /reset      forget the transcript, keep remembered facts");
    println!("  /reset-all  start a fresh session");
    println!("  /state      show remembered facts");
    println!("{}", RULE);

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/reset" => {
                agent.reset();
                println!("History cleared (state retained)\n");
            }
            "/reset-all" => {
                agent.reset_all();
                println!("History and state cleared\n");
            }
            "/state" => print_state(agent.state())?,
            _ => match agent.run_turn(input).await {
                Ok(report) => print_report(&report),
                Err(e) => {
                    warn!("Turn failed: {}", e);
                    println!("\n✗ {}\n", e);
                }
            },
        }
    }

    Ok(())
}

/// Print every tool with its schema
pub fn tools_command() -> Result<()> {
    println!("◆ Tools");
    println!("{}", RULE);

    for kind in ToolRegistry::new().kinds() {
        println!("\n{}", kind.name());
        println!("  {}", kind.description());
        let schema = serde_json::to_string_pretty(&kind.parameters())?;
        for line in schema.lines() {
            println!("  {}", line);
        }
    }

    Ok(())
}

/// Run one tool through the mediator with an empty state
pub fn invoke_command(tool: &str, args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(args).context("--args must be valid JSON")?;
    if !args.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let executor = ToolExecutor::new(ToolRegistry::new());
    let execution = executor.execute(tool, args, &ConversationState::new());

    println!("{}", execution.outcome.text());

    if !execution.outcome.is_success() {
        anyhow::bail!("tool '{}' did not run", tool);
    }
    Ok(())
}

enum DemoStep {
    Ask(&'static str),
    Reset,
    ResetAll,
}

fn demo_script(scenario: Scenario) -> Vec<DemoStep> {
    use DemoStep::*;

    match scenario {
        Scenario::FollowUp => vec![
            Ask("What time is it in Cape Town?"),
            Ask("Convert that to UTC."),
        ],
        Scenario::Errors => vec![
            Ask("What time is it in Atlantis?"),
            Reset,
            Ask("What time is it in London?"),
            Reset,
            Ask("What is 100 divided by 0?"),
            Reset,
            Ask("What is 100 divided by 5?"),
            Reset,
            Ask("Calculate (2 + 3 * 4"),
            Reset,
            Ask("Calculate (2 + 3) * 4"),
            Reset,
            Ask("What is your cryptocurrency policy?"),
            Reset,
            Ask("What is your refund policy?"),
        ],
        Scenario::MultiStep => vec![
            Ask("What time is it in Cape Town?"),
            Ask("What is that in UTC?"),
            ResetAll,
            Ask("What is 18% of 24,500 and explain the steps."),
        ],
    }
}

/// Play a scripted conversation against the configured model
pub async fn demo_command(scenario: Scenario) -> Result<()> {
    let config = Config::load().await?;
    let mut agent = build_agent(&config)?;

    println!("◆ Demo: {:?}", scenario);
    println!("{}", RULE);

    for step in demo_script(scenario) {
        match step {
            DemoStep::Ask(question) => {
                println!("\nUSER: {}", question);
                let report = agent
                    .run_turn(question)
                    .await
                    .with_context(|| format!("Turn failed: {}", question))?;
                print_report(&report);
            }
            DemoStep::Reset => {
                agent.reset();
                println!("── history cleared (state retained)");
            }
            DemoStep::ResetAll => {
                agent.reset_all();
                println!("── history and state cleared");
            }
        }
    }

    println!("{}", RULE);
    print_state(agent.state())
}

/// Show configuration status
pub async fn status_command() -> Result<()> {
    let config_path = tooluse_config::config_path();

    println!("◆ tooluse Status");
    println!("{}", RULE);

    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    println!("Model:    {}", config.model());
    match config.model_timeout() {
        Some(deadline) => println!("Timeout:  {}s", deadline.as_secs()),
        None => println!("Timeout:  [Disabled]"),
    }

    match config.api_key() {
        Some(key) => {
            let provider = OpenAiCompatProvider::new(key, config.api_base(), Some(config.model()));
            println!("API Key:  [Set]");
            println!("Backend:  {:?}", provider.backend());
            println!("Ready:    {}", provider.is_configured());
        }
        None => println!("API Key:  [Missing]"),
    }

    println!("Tools:    {}", ToolRegistry::new().names().join(", "));
    println!("\n◆ Ready");

    Ok(())
}
