//! The ingestion service's RPC handlers.

use std::sync::Arc;

use meter_proto::convert::{from_timestamp, to_timestamp};
use meter_proto::meter::meter_reading_service_server::MeterReadingService;
use meter_proto::meter::{
    ReadingMessage, ReadingPacket, ReadingStatus, StatusMessage, TokenRequest, TokenResponse,
};
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info};

use crate::auth::{CredentialVerifier, JwtTokenService};
use crate::repository::{MeterReadingRecord, ReadingRepository};
use crate::validation::validate_reading;

/// gRPC ingestion service for meter readings.
///
/// Authentication is enforced ahead of these handlers by
/// [`crate::grpc::BearerAuthLayer`]; the handlers themselves only carry the
/// business rules.
pub struct MeterService {
    repository: Arc<dyn ReadingRepository>,
    verifier: Arc<dyn CredentialVerifier>,
    tokens: Arc<JwtTokenService>,
}

impl MeterService {
    /// Service over the given persistence, credential, and token
    /// collaborators.
    pub fn new(
        repository: Arc<dyn ReadingRepository>,
        verifier: Arc<dyn CredentialVerifier>,
        tokens: Arc<JwtTokenService>,
    ) -> Self {
        Self {
            repository,
            verifier,
            tokens,
        }
    }
}

#[tonic::async_trait]
impl MeterReadingService for MeterService {
    async fn create_token(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<Response<TokenResponse>, Status> {
        let request = request.into_inner();

        if !self.verifier.verify(&request.username, &request.password) {
            info!(username = %request.username, "rejected token request");
            return Ok(Response::new(TokenResponse {
                token: String::new(),
                expiration: None,
                success: false,
            }));
        }

        let issued = self.tokens.issue(&request.username).map_err(|err| {
            error!(error = %err, "failed to sign a token");
            Status::internal("failed to issue a token")
        })?;

        info!(username = %request.username, "issued bearer token");
        Ok(Response::new(TokenResponse {
            token: issued.token,
            expiration: Some(to_timestamp(issued.expires_at)),
            success: true,
        }))
    }

    async fn send_diagnostics(
        &self,
        request: Request<Streaming<ReadingMessage>>,
    ) -> Result<Response<()>, Status> {
        let stream = request.into_inner();
        let received = drain_diagnostics(stream).await?;

        debug!(count = received, "diagnostics stream drained");
        Ok(Response::new(()))
    }

    async fn add_reading(
        &self,
        request: Request<ReadingPacket>,
    ) -> Result<Response<StatusMessage>, Status> {
        let packet = request.into_inner();

        if packet.successful() != ReadingStatus::Success {
            info!(notes = %packet.notes, "packet marked failed by the client; skipping");
            return Ok(Response::new(failure(
                "packet was marked as failed by the client",
            )));
        }

        // Fail-fast: the first invalid reading faults the whole batch before
        // anything is handed to the repository.
        let mut records = Vec::with_capacity(packet.readings.len());
        for reading in &packet.readings {
            validate_reading(reading)?;
            records.push(to_record(reading)?);
        }

        let count = records.len();
        match self.repository.save_all(records).await {
            Ok(true) => {
                info!(count, "stored new readings");
                Ok(Response::new(StatusMessage {
                    success: ReadingStatus::Success as i32,
                    message: String::new(),
                }))
            }
            Ok(false) => {
                info!(count, "repository did not persist the readings");
                Ok(Response::new(failure("readings were not persisted")))
            }
            Err(err) => {
                // Detail stays in the server log; the caller gets a generic
                // classification.
                error!(error = ?err, "unexpected failure while saving readings");
                Err(Status::cancelled("failed to save the submitted readings"))
            }
        }
    }
}

/// Read a diagnostics stream to completion, logging each reading in arrival
/// order, and report how many were received.
pub async fn drain_diagnostics<S>(mut stream: S) -> Result<usize, Status>
where
    S: Stream<Item = Result<ReadingMessage, Status>> + Unpin,
{
    let mut received = 0usize;
    while let Some(reading) = stream.next().await {
        let reading = reading?;
        info!(
            customer_id = reading.customer_id,
            reading_value = reading.reading_value,
            "received diagnostic reading"
        );
        received += 1;
    }
    Ok(received)
}

fn to_record(reading: &ReadingMessage) -> Result<MeterReadingRecord, Status> {
    let reading_date = reading
        .reading_time
        .as_ref()
        .and_then(from_timestamp)
        .ok_or_else(|| Status::invalid_argument("reading is missing a valid reading time"))?;

    Ok(MeterReadingRecord {
        customer_id: reading.customer_id,
        reading_date,
        value: reading.reading_value,
    })
}

fn failure(message: &str) -> StatusMessage {
    StatusMessage {
        success: ReadingStatus::Failure as i32,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tonic::Code;

    fn reading(value: i32) -> ReadingMessage {
        ReadingMessage {
            customer_id: 3,
            reading_time: Some(to_timestamp(Utc::now())),
            reading_value: value,
        }
    }

    #[tokio::test]
    async fn drain_counts_every_streamed_reading() {
        let stream = tokio_stream::iter((0..5).map(|i| Ok(reading(1500 + i))));
        assert_eq!(drain_diagnostics(stream).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn drain_propagates_a_stream_error() {
        let stream = tokio_stream::iter(vec![
            Ok(reading(1500)),
            Err(Status::data_loss("stream interrupted")),
            Ok(reading(1600)),
        ]);
        let status = drain_diagnostics(stream).await.unwrap_err();
        assert_eq!(status.code(), Code::DataLoss);
    }

    #[test]
    fn record_mapping_requires_a_timestamp() {
        let mut bad = reading(1500);
        bad.reading_time = None;
        assert!(to_record(&bad).is_err());

        let good = reading(1500);
        let record = to_record(&good).unwrap();
        assert_eq!(record.customer_id, 3);
        assert_eq!(record.value, 1500);
    }
}
