mod config_commands;
mod relay_commands;
mod store_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "herald",
    about = "Relay new Telegram channel posts into forum topics of a group"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: herald.{toml,yaml,json} in ./ or ~/.config/herald/).
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Check every channel, then forward the backlog (default).
    Run,
    /// Check every channel and record new posts without forwarding.
    Check,
    /// Forward recorded posts that have not been delivered yet.
    Flush,
    /// List undelivered links per channel.
    Backlog,
    /// Show store totals and the newest recorded post per channel.
    Status,
    /// Validate the configuration file and report errors/warnings.
    Validate,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    let (config, path) = herald_config::load_or_discover(cli.config.as_deref())?;
    info!(
        path = %path.display(),
        channels = config.forward_mapping.len(),
        "config loaded"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Validate => config_commands::check_config(&config, &path),
        Commands::Backlog => store_commands::backlog(&config).await,
        Commands::Status => store_commands::status(&config).await,
        command => relay_commands::handle(command, &config).await,
    }
}
