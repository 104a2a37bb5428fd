//! dotp CLI entry point

use clap::Parser;
use dotp_cli::config::CliOverrides;
use dotp_cli::{Cli, Config, ExitCode, OutputFormatter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if cli.config.is_none() {
        if let Err(e) = Config::create_default_if_missing() {
            eprintln!("Warning: Could not create default config: {e}");
        }
    }

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Config error: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    let overrides = CliOverrides {
        output_format: cli.output.map(|f| f.to_string()),
        verbose: cli.verbose.then_some(true),
        debug: cli.debug.then_some(true),
        encoding: cli.encoding.map(|e| e.to_string()),
        max_version: cli.max_version,
    };
    let config = config.with_overrides(&overrides);

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        return ExitCode::InvalidInput.to_exit_code();
    }

    let formatter = OutputFormatter::new(config.output.format.parse().unwrap_or_default(), config.output.verbose);
    match cli.execute_with_config(config).await {
        Ok(code) => code.to_exit_code(),
        Err(e) => {
            let code = ExitCode::for_error(&e);
            tracing::debug!(error = ?e, code = code.name(), "command failed");
            let rendered = formatter.format_error_with_code(&e, code);
            if !rendered.is_empty() {
                eprintln!("{rendered}");
            }
            code.to_exit_code()
        }
    }
}
