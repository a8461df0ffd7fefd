use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gateway::config::Config;

#[derive(Parser)]
#[command(about = "Redirect edge for the marketplace platform")]
struct Cli {
    /// Path to the gateway configuration file
    #[arg(long, default_value = "gateway.yaml")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_file(&cli.config)?;
    config.validate()?;

    // Keep the guard alive for the lifetime of the process
    let _sentry_guard = config.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.metrics {
        let recorder = StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
            .build(Some("gateway"))?;
        metrics::set_global_recorder(recorder)
            .map_err(|e| format!("failed to install metrics recorder: {e}"))?;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(gateway::run(config))?;

    Ok(())
}
