// src/main.rs — deep-research entry point

use clap::Parser;
use tokio_util::sync::CancellationToken;

use deep_research::cli::Cli;
use deep_research::infra::config::Config;
use deep_research::infra::logger;
use deep_research::provider;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(logger::level_for_verbosity(cli.verbose));

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // API keys may live in a local .env file
    dotenvy::dotenv().ok();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);

    let provider = provider::from_config(&config.model, &config.retry)?;

    // Ctrl-C cancels every in-flight run
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling runs");
                cancel.cancel();
            }
        });
    }

    deep_research::cli::run::run_task(&cli, &config, provider, cancel).await
}
