mod config_commands;
mod process_commands;
mod services;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    phoso_config::PhosoConfig,
    phoso_gateway::AppState,
    phoso_metrics::{MetricsRecorderConfig, init_metrics},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "phoso", about = "phoso: photos by SMS into records, cloud storage and chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./phoso.toml, then ~/.config/phoso/).
    #[arg(long, global = true, env = "PHOSO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Falls back to the
    /// config's `log_level`, then "info".
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server (default when no subcommand is provided).
    Serve,
    /// Run one attachment through the pipeline and print the outcome.
    Process(process_commands::ProcessArgs),
    /// Print the anonymous sender id for a recipient/sender pair.
    SenderId { to: String, from: String },
    /// Validate the configuration and report errors/warnings.
    CheckConfig {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

fn init_telemetry(cli: &Cli, config: &PhosoConfig) {
    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

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

    let config = phoso_config::load(cli.config.as_deref())?;
    init_telemetry(&cli, &config);

    match cli.command {
        None | Some(Commands::Serve) => serve(config, cli.bind, cli.port).await,
        Some(Commands::Process(args)) => {
            config_commands::log_diagnostics(&config);
            let pipeline = services::build_pipeline(&config)?;
            process_commands::handle_process(&pipeline, args).await
        },
        Some(Commands::SenderId { to, from }) => {
            println!("{}", phoso_pipeline::sender_id(&to, &from));
            Ok(())
        },
        Some(Commands::CheckConfig { verbose }) => {
            config_commands::check(&config, cli.config.as_deref(), verbose)
        },
    }
}

async fn serve(config: PhosoConfig, bind: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "phoso starting");
    config_commands::log_diagnostics(&config);

    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: Vec::new(),
    })?;

    let pipeline = services::build_pipeline(&config)?;
    let mut state = AppState::new(Arc::new(pipeline));
    if config.metrics.enabled {
        state = state.with_metrics(metrics);
    }

    // CLI args override config values
    let bind = bind.unwrap_or(config.server.bind);
    let port = port.unwrap_or(config.server.port);
    phoso_gateway::start(&bind, port, state, &config.server.webhook_path).await
}
