mod cli;
mod commands;
mod config;
mod credential;
mod descriptor;
mod engine;
mod messages;
mod progress;
mod resource;
mod ui;

use anyhow::Result;
use brokerkit::Client;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use std::io;
use std::sync::Arc;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Config,
    pub client: Arc<Client>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "xdapp", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let credential = credential::resolve(config.credential.as_ref(), cli.username.as_deref())?;
    let options = config.connect_options(cli.admin_address.as_deref());
    let client = Client::connect(options, credential);
    log::debug!("Broker: {}", client.describe());

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
        client: Arc::new(client),
    };

    let result = match cli.command {
        Command::Get(args) => commands::resource::get(&ctx, &args),
        Command::Test(args) => match commands::resource::test(&ctx, &args) {
            Ok(false) => std::process::exit(1),
            other => other.map(drop),
        },
        Command::Set(args) => commands::resource::set(&ctx, &args),
        Command::Diff(args) => commands::declarative::diff(&ctx, args.target.as_deref()),
        Command::Apply(args) => {
            commands::declarative::apply(&ctx, args.target.as_deref(), args.dry_run, args.yes)
        }
        Command::Completions { .. } => Ok(()),
    };

    if let Err(e) = &result
        && let Some(cause) = e.chain().find_map(|c| c.downcast_ref::<brokerkit::Error>())
    {
        let category = cause.category();
        log::warn!("{}: {}", category.description(), category.advice());
    }
    result
}
