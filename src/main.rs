use std::process::ExitCode;
use std::sync::Arc;

use convoy::{BarrierJoin, ConvoyConfig, ReqwestHttpClient, Requester, SerialThrottle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const BANNER: &str = "*******************************";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = ConvoyConfig::default();
    match serde_json::to_value(&config) {
        Ok(snapshot) => tracing::debug!(config = %snapshot, "Loaded configuration"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize configuration"),
    }

    let requester = Requester::new(Arc::new(ReqwestHttpClient::new()), config.endpoint());
    let count = config.request_count;

    tracing::info!("{BANNER}");

    let throttle = SerialThrottle::new(requester.clone());
    let outcome = BarrierJoin::new(requester)
        .run(count, move |summary| async move {
            tracing::info!(
                completed = summary.completed,
                "All asynchronous requests are handled in a synchronous way"
            );
            tracing::info!("{BANNER}");
            tracing::info!("Now running the serialized strategy");
            tracing::info!("{BANNER}");
            throttle.run(count).await
        })
        .await;

    match outcome {
        Ok(summary) => {
            tracing::info!(
                completed = summary.completed,
                "All requests are handled one at a time"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Serialized strategy failed");
            ExitCode::FAILURE
        }
    }
}
