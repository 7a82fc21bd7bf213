//! `switchboard`: drive the console's actions from the command line.

mod cli;
mod commands;
mod config;
mod console;

use std::process::ExitCode;

use clap::Parser;
use switchboard_controller::DispatchPolicy;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::console::Console;

fn apply_flags(mut config: AppConfig, cli: &Cli) -> anyhow::Result<AppConfig> {
    if let Some(seed) = &cli.seed {
        config.seed = Some(seed.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log.level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.log.format = format.parse()?;
    }

    let session = &cli.session;
    if let Some(user) = &session.user {
        config.session.user.clone_from(user);
    }
    if !session.roles.is_empty() {
        config.session.roles.clone_from(&session.roles);
    }
    if let Some(org) = &session.organization {
        config.session.organization = Some(org.clone());
    }
    if session.no_org {
        config.session.organization = None;
    }
    if session.advisory {
        config.dispatch = DispatchPolicy::advisory();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = apply_flags(config::load(cli.config.as_deref())?, &cli)?;
    let _log = switchboard_log::init_with(config.log.clone())?;
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        Command::Config => return commands::config(&config),
        Command::Route { path } => return commands::route(&switchboard_pages::standard_routes()?, path),
        _ => {}
    }

    let mut console = Console::start(&config)?;
    let code = match cli.command {
        Command::Actions { page, json } => commands::actions(&console, page.as_deref(), json)?,
        Command::Run { action, params, at } => {
            commands::run(&mut console, &action, &params, at.as_deref()).await?
        }
        Command::Script { file } => commands::script(&mut console, &file).await?,
        Command::Tools => commands::tools(&console)?,
        Command::Stats => commands::stats(&console)?,
        Command::Config | Command::Route { .. } => ExitCode::SUCCESS,
    };
    console.finish().await;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "switchboard",
            "--user",
            "ada",
            "--role",
            "Member",
            "--no-org",
            "--advisory",
            "--log-format",
            "json",
            "stats",
        ]);
        let config = apply_flags(AppConfig::default(), &cli).unwrap();
        assert_eq!(config.session.user, "ada");
        assert_eq!(config.session.roles, vec!["Member"]);
        assert_eq!(config.session.organization, None);
        assert_eq!(config.dispatch, DispatchPolicy::advisory());
        assert_eq!(config.log.format, switchboard_log::Format::Json);
    }
}
