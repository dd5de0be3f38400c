use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use runmon::config::{Config, load_config, load_config_from_path};
use runmon::poller::Poller;

#[derive(Parser)]
#[command(
    name = "runmon",
    version,
    about = "Execute a command and report resource usage of its whole process tree"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between status checks of the running process
    #[arg(long)]
    sample_interval: Option<f64>,

    /// Seconds covered by each aggregated report window
    #[arg(long)]
    report_interval: Option<f64>,

    /// Write the JSON report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a human-readable execution summary to stderr
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// The command to execute, with its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    init_tracing(&config.output.log_level)?;

    let poller = Poller::new(&config.monitor)?;
    let report = poller.run(&cli.command).await?;

    let json = if config.output.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match &cli.output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{json}"),
    }
    if config.output.summary {
        eprint!("{}", report.execution_summary());
    }

    // The wrapper is transparent: exit with the child's own code.
    if let Some(code) = report.exit_code
        && code != 0
    {
        std::process::exit(code);
    }
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.sample_interval {
        config.monitor.sample_interval = interval;
    }
    if let Some(interval) = cli.report_interval {
        config.monitor.report_interval = interval;
    }
    if cli.summary {
        config.output.summary = true;
    }
    if let Some(ref level) = cli.log_level {
        config.output.log_level = level.clone();
    }

    config
}

fn init_tracing(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| eyre!("unknown log level `{level}`"))?;

    // Logs go to stderr; stdout is reserved for the report.
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))?;
    Ok(())
}
