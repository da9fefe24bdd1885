//! DDALAB launcher CLI.

use clap::{ColorChoice, Parser};
use ddalab_launcher::logging::{LogConfig, LogFormat, init_logging};
use launcher_updater::{DEV_VERSION, UpdateContext, Updater, UpdaterConfig};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{describe_error, run_check_update, run_self_update, run_version};

/// Version baked in by release builds; anything else reports as a dev build.
const LAUNCHER_VERSION: &str = match option_env!("LAUNCHER_VERSION") {
    Some(version) => version,
    None => DEV_VERSION,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let updater = Updater::with_config(LAUNCHER_VERSION, updater_config_from_cli(&cli));
    let ctx = UpdateContext::new();
    spawn_interrupt_handler(ctx.clone());

    let result = match cli.command {
        Command::Version => {
            run_version(&updater);
            Ok(())
        }
        Command::CheckUpdate => run_check_update(&updater, &ctx).await,
        Command::SelfUpdate(args) => run_self_update(&updater, &ctx, args.yes).await,
    };
    let exit_code = match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {}", describe_error(&error));
            1
        }
    };
    std::process::exit(exit_code);
}

/// Cancel in-flight update work on Ctrl-C.
fn spawn_interrupt_handler(ctx: UpdateContext) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            ctx.cancel();
        }
    });
}

fn updater_config_from_cli(cli: &Cli) -> UpdaterConfig {
    let config = UpdaterConfig::from_env();
    match &cli.registry {
        Some(url) => config.with_registry_url(url.clone()),
        None => config,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_overrides_verbosity() {
        let cli = Cli::parse_from(["ddalab-launcher", "--log-level", "debug", "-q", "version"]);
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn test_default_log_config_defers_to_env() {
        let cli = Cli::parse_from(["ddalab-launcher", "--color", "never", "version"]);
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(config.use_env_filter);
        assert!(!config.with_ansi);
    }

    #[test]
    fn test_registry_flag_overrides_config() {
        let cli = Cli::parse_from(["ddalab-launcher", "--registry", "http://127.0.0.1:9", "check-update"]);
        let config = updater_config_from_cli(&cli);
        assert_eq!(config.registry_url, "http://127.0.0.1:9");
    }
}
