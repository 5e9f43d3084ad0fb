use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "toolshare",
    about = "ToolShare: lend and borrow tools over a shared ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(long, global = true, default_value = "toolshare.toml")]
    pub config: PathBuf,

    /// Ledger file, overriding the configured path
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Account to act as
    #[arg(long = "as", global = true, value_name = "ADDR")]
    pub account: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every registered tool, newest first
    List,
    /// Search tools by name or description
    Search(SearchArgs),
    /// Show counts per lending status
    Stats,
    /// Show a single tool
    Show(ToolArgs),
    /// Register a new tool
    Add(AddArgs),
    /// Borrow a tool
    Borrow(ToolArgs),
    /// Return a borrowed tool
    Return(ToolArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    pub term: String,
}

#[derive(Args)]
pub struct ToolArgs {
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub description: String,
    /// Private details, sealed before they reach the ledger
    #[arg(long, default_value = "")]
    pub details: String,
}
