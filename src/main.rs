//! council-cli - authenticated client for the council/DxO research gateway

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use council_cli::{
    Error,
    auth::{SessionManager, SessionStore},
    cli::{AskMode, Cli, Command},
    config::Config,
    gateway::{GatewayClient, HealthStatus},
    research, setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            if e.requires_reauth() {
                eprintln!("💡 Run `council-cli login`, then retry.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> council_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let store = SessionStore::new(config.storage.resolve_dir()?)?;
    let session = Arc::new(SessionManager::new(
        reqwest::Client::new(),
        config.auth.clone(),
        store,
    ));
    let gateway = GatewayClient::new(&config.gateway, Arc::clone(&session))?;

    match cli.command {
        Command::Login => {
            session.login().await?;
            println!("Signed in.");
        }
        Command::Logout => {
            session.logout();
            println!("Signed out.");
        }
        Command::Status => {
            if session.is_authenticated() {
                let remaining = session.expires_in_millis().unwrap_or(0) / 1000;
                println!("Authenticated (token expires in {remaining}s)");
            } else {
                println!("Not authenticated. Run `council-cli login`.");
            }
        }
        Command::Refresh => {
            session.refresh_access_token().await?;
            println!("Token refreshed.");
        }
        Command::Ask { mode, question } => {
            if !session.is_authenticated() {
                return Err(Error::SessionExpired);
            }
            match mode {
                AskMode::Council => {
                    let result = research::invoke_council(&gateway, &question).await?;
                    render_council(&result);
                }
                AskMode::Dxo => {
                    let result = research::invoke_dxo(&gateway, &question).await?;
                    render_dxo(&result);
                }
            }
        }
        Command::Tools => {
            let tools = gateway.list_tools().await?;
            if tools.is_empty() {
                println!("No tools exposed by the gateway.");
            } else {
                for tool in tools {
                    match tool.description {
                        Some(description) => println!("{}  -  {description}", tool.name),
                        None => println!("{}", tool.name),
                    }
                }
            }
        }
        Command::Health => {
            let report = gateway.health_check().await;
            match report.status {
                HealthStatus::Healthy => println!("healthy: {}", report.detail),
                HealthStatus::Error => println!("error: {}", report.detail),
            }
        }
    }

    Ok(())
}

fn render_council(result: &council_cli::research::CouncilResult) {
    println!("# {}\n", result.question);

    if !result.stage1.is_empty() {
        println!("## Stage 1: Member Responses\n");
        for member in &result.stage1 {
            println!("### {}\n{}\n", member.member_id, member.content);
        }
    }

    if !result.metadata.aggregate_rankings.is_empty() {
        println!("## Stage 2: Aggregate Rankings\n");
        for ranking in &result.metadata.aggregate_rankings {
            println!(
                "- {} ({}): avg position {:.2}, {} votes",
                ranking.response_label,
                ranking.member_id,
                ranking.average_position,
                ranking.vote_count
            );
        }
        println!();
    }

    println!("## Stage 3: Synthesis\n\n{}", result.stage3.content);

    if !result.metadata.timestamp.is_empty() {
        println!("\n(generated {})", result.metadata.timestamp);
    }
}

fn render_dxo(result: &council_cli::research::DxoResult) {
    println!("# {}\n", result.question);
    for step in &result.workflow {
        println!("## {}\n\n{}\n", step.role, step.output);
    }
    if !result.metadata.timestamp.is_empty() {
        println!("(generated {})", result.metadata.timestamp);
    }
}
