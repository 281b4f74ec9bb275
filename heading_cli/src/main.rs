#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod commands;
mod error_fmt;
mod logging;
mod run;
mod vision;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use heading_config::{Config, SettingsStore};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init_tracing(cli.json, &cli.log_level, &cfg.logging);

    let store = Arc::new(SettingsStore::from_config(&cfg));
    let overrides = store.load_overrides(&cli.settings)?;
    tracing::debug!(
        config = %cli.config.display(),
        settings = %cli.settings.display(),
        overrides,
        "configuration loaded"
    );

    match cli.cmd {
        Commands::Run {
            replay,
            fps,
            cycles,
            simulate,
            looping,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("installing Ctrl-C handler")?;
            }
            let opts = run::RunOpts {
                replay,
                fps,
                cycles,
                simulate,
                looping,
            };
            run::run_navigation(&cfg, store, &opts, &shutdown, cli.json)
        }
        Commands::Send {
            command,
            left,
            right,
            simulate,
        } => commands::send_command(&cfg, &store, command, left, right, simulate, cli.json),
        Commands::Duration { distance } => commands::print_duration(&store, distance, cli.json),
        Commands::Settings { action } => {
            commands::settings(&store, &cli.settings, &action, cli.json)
        }
        Commands::SelfCheck => commands::self_check(&cfg, &store, cli.json),
    }
}

fn load_config(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    let cfg = heading_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parsing config {}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}
