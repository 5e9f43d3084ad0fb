use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use toolshare_app::{AppConfig, StaticSigner, ToolShare, ToolStats, TxPhase};
use toolshare_ledger::FileLedger;
use toolshare_registry::{EnvelopeSealer, Transition};
use toolshare_types::{abbreviate, ToolId, ToolInput, ToolRecord, ToolStatus};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    if let Some(path) = &cli.ledger {
        config.ledger.path = path.clone();
    }
    debug!(ledger = %config.ledger.path.display(), policy = ?config.return_policy, "starting");

    let ledger = Arc::new(FileLedger::open(config.ledger.path.clone()));
    let app = ToolShare::from_config(&config, ledger, Arc::new(EnvelopeSealer));

    // Kept alive so the facade keeps following the account.
    let signer = match &cli.account {
        Some(address) => {
            let signer = StaticSigner::parse(address)?;
            app.connect(&signer).await?;
            Some(signer)
        }
        None => None,
    };

    let format = cli.format;
    let result = match cli.command {
        Command::List => cmd_list(&app, format).await,
        Command::Search(args) => cmd_search(&app, args, format).await,
        Command::Stats => cmd_stats(&app, format).await,
        Command::Show(args) => cmd_show(&app, args, format).await,
        Command::Add(args) => cmd_add(&app, args).await,
        Command::Borrow(args) => cmd_borrow(&app, args).await,
        Command::Return(args) => cmd_return(&app, args).await,
    };
    drop(signer);
    result
}

async fn cmd_list(app: &ToolShare, format: OutputFormat) -> anyhow::Result<()> {
    let tools = app.refresh().await?;
    print_tools(app, &tools, format)
}

async fn cmd_search(app: &ToolShare, args: SearchArgs, format: OutputFormat) -> anyhow::Result<()> {
    app.refresh().await?;
    let hits = app.search(&args.term);
    print_tools(app, &hits, format)
}

async fn cmd_stats(app: &ToolShare, format: OutputFormat) -> anyhow::Result<()> {
    app.refresh().await?;
    let stats = app.stats();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print_stats(&stats),
    }
    Ok(())
}

async fn cmd_show(app: &ToolShare, args: ToolArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = ToolId::new(args.id)?;
    let tool = app.registry().get_tool(&id).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tool)?),
        OutputFormat::Text => {
            print_tool(app, &tool);
            println!("  Sealed: {}", tool.encrypted_data.dimmed());
        }
    }
    Ok(())
}

async fn cmd_add(app: &ToolShare, args: AddArgs) -> anyhow::Result<()> {
    let input = ToolInput::new(args.name, args.description).with_details(args.details);
    let outcome = app.add_tool(&input).await;
    report(app, outcome).map(|id| println!("  Id: {}", id.to_string().yellow()))
}

async fn cmd_borrow(app: &ToolShare, args: ToolArgs) -> anyhow::Result<()> {
    let id = ToolId::new(args.id)?;
    let outcome = app.borrow_tool(&id).await;
    report(app, outcome).map(|tool| print_tool(app, &tool))
}

async fn cmd_return(app: &ToolShare, args: ToolArgs) -> anyhow::Result<()> {
    let id = ToolId::new(args.id)?;
    let outcome = app.return_tool(&id).await;
    report(app, outcome).map(|tool| print_tool(app, &tool))
}

/// Print the tracker's settled message and turn the outcome into an exit status.
fn report<T>(app: &ToolShare, outcome: toolshare_app::AppResult<T>) -> anyhow::Result<T> {
    let status = app.tracker().current();
    match outcome {
        Ok(value) => {
            println!("{} {}", "✓".green().bold(), status.message);
            Ok(value)
        }
        Err(e) if status.visible && status.status == TxPhase::Error => {
            Err(anyhow::Error::new(e).context(status.message))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_tools(app: &ToolShare, tools: &[ToolRecord], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(tools)?);
        return Ok(());
    }
    if tools.is_empty() {
        println!("No tools registered.");
        return Ok(());
    }
    for tool in tools {
        print_tool(app, tool);
    }
    Ok(())
}

fn print_tool(app: &ToolShare, tool: &ToolRecord) {
    println!("{}  {}  ({})", tool.id.to_string().yellow(), tool.name.bold(), paint(tool.status));
    println!("  {}", tool.description);
    println!("  Owner: {}", abbreviate(&tool.owner).cyan());
    let actions = app.actions_for(tool);
    if !actions.is_empty() {
        println!("  You can: {}", action_labels(&actions).green());
    }
}

fn action_labels(actions: &[Transition]) -> String {
    actions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn print_stats(stats: &ToolStats) {
    println!("Tools: {}", stats.total.to_string().bold());
    println!("  {}: {}", paint(ToolStatus::Available), stats.available);
    println!("  {}: {}", paint(ToolStatus::Borrowed), stats.borrowed);
    println!("  {}: {}", paint(ToolStatus::Pending), stats.pending);
}

fn paint(status: ToolStatus) -> colored::ColoredString {
    match status {
        ToolStatus::Available => status.as_str().green(),
        ToolStatus::Borrowed => status.as_str().red(),
        ToolStatus::Pending => status.as_str().yellow(),
    }
}
