//! The periodic submission loop.

use std::time::Duration;

use meter_proto::meter::meter_reading_service_client::MeterReadingServiceClient;
use meter_proto::meter::{ReadingMessage, ReadingPacket, ReadingStatus};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::metadata::{KeyAndValueRef, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};
use tracing::{error, info, warn};

use crate::config::ClientSettings;
use crate::error::{AuthError, ClientError};
use crate::readings::ReadingFactory;
use crate::token::{Credential, TokenManager};

/// Readings submitted per batch.
const BATCH_SIZE: usize = 10;
/// Readings written per diagnostics exchange.
const DIAGNOSTIC_READINGS: usize = 5;
/// A diagnostics exchange runs once every this many ticks.
const DIAGNOSTICS_EVERY: u64 = 10;
/// Notes attached to every submitted packet.
const BATCH_NOTES: &str = "scheduled reading submission";

/// The field client's periodic submission loop.
///
/// One cycle generates a batch, logs in if the held token is unusable, and
/// submits. Cycles never overlap: the next one starts only after the
/// configured delay has elapsed.
pub struct MeterWorker<F> {
    settings: ClientSettings,
    client: MeterReadingServiceClient<Channel>,
    tokens: TokenManager,
    factory: F,
}

impl<F: ReadingFactory> MeterWorker<F> {
    /// Build a worker over a lazily dialed channel.
    pub fn new(settings: ClientSettings, factory: F) -> Result<Self, ClientError> {
        let channel = Endpoint::from_shared(settings.server_url.clone())?.connect_lazy();

        Ok(Self {
            settings,
            client: MeterReadingServiceClient::new(channel),
            tokens: TokenManager::default(),
            factory,
        })
    }

    /// Run submission cycles until the token is cancelled.
    ///
    /// A failing cycle is logged and swallowed; only cancellation stops the
    /// loop.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let delay = Duration::from_millis(self.settings.delay_interval_ms);
        let mut counter: u64 = 0;

        while !cancel.is_cancelled() {
            counter += 1;

            if counter % DIAGNOSTICS_EVERY == 0 {
                if let Err(status) = self.send_diagnostics().await {
                    warn!(
                        code = ?status.code(),
                        message = %status.message(),
                        "diagnostics exchange failed"
                    );
                }
            }

            let packet = self.build_packet();

            // Submit when the held token is still usable, or once a login
            // succeeds.
            if !self.tokens.needs_login() || self.login().await {
                self.submit(packet).await;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("submission loop stopped");
    }

    /// One batch of freshly generated readings, declared successful.
    fn build_packet(&mut self) -> ReadingPacket {
        let customer_id = self.settings.customer_id;
        ReadingPacket {
            successful: ReadingStatus::Success as i32,
            notes: BATCH_NOTES.to_string(),
            readings: (0..BATCH_SIZE)
                .map(|_| self.factory.generate(customer_id))
                .collect(),
        }
    }

    async fn login(&mut self) -> bool {
        let credentials = Credential {
            username: self.settings.username.clone(),
            password: self.settings.password.clone(),
        };

        match self.tokens.authenticate(&mut self.client, &credentials).await {
            Ok(()) => true,
            Err(AuthError::Rejected) => {
                warn!(username = %credentials.username, "server rejected the configured credentials");
                false
            }
            Err(err) => {
                error!(error = %err, "token acquisition failed");
                false
            }
        }
    }

    async fn submit(&mut self, packet: ReadingPacket) {
        let mut request = Request::new(packet);
        if !self.attach_bearer(&mut request) {
            warn!("no bearer token held; skipping submission");
            return;
        }

        match self.client.add_reading(request).await {
            Ok(response) => {
                let result = response.into_inner();
                if result.success() == ReadingStatus::Success {
                    info!("successfully sent readings");
                } else {
                    info!(message = %result.message, "server declined the readings");
                }
            }
            Err(status) => log_rpc_failure(&status),
        }
    }

    /// Stream a handful of fresh readings to the diagnostics endpoint.
    ///
    /// Readings are handed to the transport one at a time through a bounded
    /// channel, so send order is preserved and the producer observes
    /// backpressure. The call resolves once the server acknowledges the
    /// drained stream.
    async fn send_diagnostics(&mut self) -> Result<(), Status> {
        let customer_id = self.settings.customer_id;
        let readings: Vec<ReadingMessage> = (0..DIAGNOSTIC_READINGS)
            .map(|_| self.factory.generate(customer_id))
            .collect();

        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for reading in readings {
                if tx.send(reading).await.is_err() {
                    break;
                }
            }
        });

        let mut request = Request::new(ReceiverStream::new(rx));
        self.attach_bearer(&mut request);

        let ack = self.client.send_diagnostics(request).await;
        let _ = producer.await;

        ack.map(|_| ())
    }

    /// Attach the current bearer token to a request; false when none is
    /// held.
    fn attach_bearer<T>(&self, request: &mut Request<T>) -> bool {
        let Some(bearer) = self.tokens.bearer() else {
            return false;
        };

        match bearer.parse::<MetadataValue<_>>() {
            Ok(value) => {
                request.metadata_mut().insert("authorization", value);
                true
            }
            Err(_) => false,
        }
    }
}

/// Log a failed RPC, expanding rejection metadata on out-of-range faults.
fn log_rpc_failure(status: &Status) {
    if status.code() == Code::OutOfRange {
        for entry in status.metadata().iter() {
            if let KeyAndValueRef::Ascii(key, value) = entry {
                if let Ok(value) = value.to_str() {
                    error!(key = %key, value = %value, "rejection detail");
                }
            }
        }
    }

    error!(
        code = ?status.code(),
        message = %status.message(),
        "reading submission failed"
    );
}
