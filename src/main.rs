//! VoiceMemo CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voice_memo::cli::{
    app::{load_merged_config, run_delete, run_list, run_shell, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use voice_memo::domain::memo::Duration;
use voice_memo::infrastructure::XdgConfigStore;

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "voice_memo=debug"
    } else {
        "voice_memo=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let presenter = Presenter::new();
    let cli_config = cli.to_config();

    let command = match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    // A bad flag is a usage error; a bad config file value falls back to the default
    if let Some(s) = cli_config.max_duration.as_ref() {
        if let Err(e) = s.parse::<Duration>() {
            presenter.error(&format!("Invalid max-duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    let config = load_merged_config(cli_config).await;

    match command {
        Some(Commands::List) => run_list(&config).await,
        Some(Commands::Delete { target }) => run_delete(&config, &target).await,
        _ => run_shell(&config).await,
    }
}
