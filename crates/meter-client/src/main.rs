//! Field client binary.

use meter_client::config::ClientSettings;
use meter_client::readings::SyntheticReadingFactory;
use meter_client::MeterWorker;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ClientSettings::load()?;
    info!(
        server_url = %settings.server_url,
        customer_id = settings.customer_id,
        "starting meter client"
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let mut worker = MeterWorker::new(settings, SyntheticReadingFactory::default())?;
    worker.run(cancel).await;

    Ok(())
}
