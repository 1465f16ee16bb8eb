use anyhow::Context;
use breathe::{
    app::App,
    config::{self, Config},
    formatter::TickFormatter,
};
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().event_format(TickFormatter))
        .with(ErrorLayer::default())
        .init();
}

fn run(config: &Config) -> anyhow::Result<()> {
    let mut app = App::new(config).context("Could not start the game")?;
    info!(step = config.step_seconds(), realtime = config.realtime, "Starting game loop");

    while app.run().context("Simulation stopped")? {}

    Ok(())
}

/// The main entry point: loads configuration, starts a run and steps it until it ends.
pub fn main() {
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    init_tracing(&config.log_filter);

    if let Err(e) = run(&config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
