//! Meter ingestion server binary.

use std::sync::Arc;

use meter_proto::meter::meter_reading_service_server::MeterReadingServiceServer;
use meter_server::auth::{JwtTokenService, StaticCredentialVerifier};
use meter_server::config::ServerSettings;
use meter_server::grpc::BearerAuthLayer;
use meter_server::repository::InMemoryReadingRepository;
use meter_server::MeterService;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ServerSettings::load()?;
    let addr = settings.bind_socket();

    let tokens = Arc::new(JwtTokenService::new(
        &settings.jwt_secret,
        settings.token_lifetime_secs,
    ));
    let verifier = Arc::new(StaticCredentialVerifier::new(
        &settings.username,
        &settings.password,
    ));
    let repository = Arc::new(InMemoryReadingRepository::default());

    let service = MeterService::new(repository, verifier, Arc::clone(&tokens));

    info!(%addr, "meter ingestion server listening");

    Server::builder()
        .layer(BearerAuthLayer::new(tokens))
        .add_service(MeterReadingServiceServer::new(service))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
