//! SocialRadar — binary entrypoint.
//! Loads config, wires sources → aggregator → dispatcher, and keeps the
//! scheduler running until Ctrl-C.

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use social_radar::scheduler::cancel_on_ctrl_c;
use social_radar::{
    run_and_dispatch, telemetry, Aggregator, Dispatcher, RadarConfig, Scheduler, SourceRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; RADAR_CONFIG_PATH and channel secrets may live there.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    // Invalid config shape fails here, never mid-run.
    let cfg = Arc::new(RadarConfig::load_default().context("loading radar config")?);
    let dispatcher =
        Arc::new(Dispatcher::from_config(&cfg).context("building notification channels")?);
    let aggregator = Arc::new(Aggregator::new(cfg.clone(), SourceRegistry::with_builtin()));
    let scheduler = Scheduler::from_config(&cfg.schedule);

    tracing::info!(
        channels = ?dispatcher.sender_names(),
        "Press Ctrl+C to stop"
    );

    let stop = CancellationToken::new();
    cancel_on_ctrl_c(stop.clone());

    scheduler
        .start(
            move || {
                let aggregator = aggregator.clone();
                let dispatcher = dispatcher.clone();
                async move {
                    run_and_dispatch(&aggregator, &dispatcher).await;
                    anyhow::Ok(())
                }
            },
            stop,
        )
        .await;

    Ok(())
}
