use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "phishguard", version, about = "Check URLs against a blacklist and phishing heuristics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify one or more URLs; phishing pages are blacklisted automatically.
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Print one JSON object per URL instead of a sentence.
        #[arg(long)]
        json: bool,
    },
    /// Add a URL to the blacklist without checking it.
    Block { url: String },
    /// Print every blacklisted URL, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
}
