use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about = "Permission-gated action console")]
pub struct Cli {
    /// Config file (defaults to ./switchboard.toml when present)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// JSON seed for the in-memory store
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Log filter directives
    #[arg(long, env = "SWITCHBOARD_LOG", global = true)]
    pub log_level: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long, env = "SWITCHBOARD_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the session user.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Act as this user id
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Role to hold (repeatable, replaces configured roles)
    #[arg(long = "role", global = true)]
    pub roles: Vec<String>,

    /// Organization id
    #[arg(long = "org", global = true)]
    pub organization: Option<String>,

    /// Run without an organization
    #[arg(long, global = true, conflicts_with = "organization")]
    pub no_org: bool,

    /// Skip permission checks at dispatch
    #[arg(long, global = true)]
    pub advisory: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List actions the session user may run
    Actions {
        /// Only actions of this page
        #[arg(long)]
        page: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run one action and print its result
    Run {
        /// Action id, e.g. objects.list
        action: String,
        /// Parameters as a JSON object
        #[arg(long, short, default_value = "{}")]
        params: String,
        /// Navigate here before running
        #[arg(long)]
        at: Option<String>,
    },
    /// Run a JSON array of tool calls in one session
    Script {
        /// File holding `[{"name": ..., "arguments": {...}}, ...]`
        file: PathBuf,
    },
    /// Print available actions as AI tool definitions
    Tools,
    /// Resolve a console path to its page
    Route {
        /// Path such as /objects/Customer
        path: String,
    },
    /// Print page and action counts
    Stats,
    /// Print the effective configuration
    Config,
}
