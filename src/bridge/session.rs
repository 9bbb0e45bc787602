//! One request/response session over a framed channel.

use crate::audit::emit_frame_rejected;
use crate::codec::{FrameReader, FrameWriter};
use crate::core::{FrameError, ScanResult};
use crate::dispatch::Dispatcher;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// `details` sent in place of a response too large to frame.
pub const OVERSIZED_RESPONSE_DETAILS: &str = "Response exceeds maximum frame size";

/// Failure that ends the loop.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A request frame could not be read or decoded.
    #[error("failed to read request: {0}")]
    Read(#[source] FrameError),

    /// A response frame could not be written.
    #[error("failed to write response: {0}")]
    Write(#[source] FrameError),
}

impl BridgeError {
    /// Returns the underlying frame error.
    pub fn frame_error(&self) -> &FrameError {
        match self {
            Self::Read(e) | Self::Write(e) => e,
        }
    }
}

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Requests read.
    pub requests: u64,
    /// Responses with status `ANALYZED`.
    pub analyzed: u64,
    /// Responses with status `ERROR`.
    pub errors: u64,
}

/// A bridge loop over one reader/writer pair.
///
/// # Example
///
/// ```rust,ignore
/// use sentinel_bridge::{Bridge, BridgeConfig, Dispatcher};
///
/// let config = BridgeConfig::default().apply_env();
/// let dispatcher = Dispatcher::from_config(&config)?;
/// let stats = Bridge::new(tokio::io::stdin(), tokio::io::stdout(), dispatcher)
///     .run()
///     .await?;
/// ```
#[derive(Debug)]
pub struct Bridge<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    dispatcher: Dispatcher,
    recover_payload_errors: bool,
}

impl<R, W> Bridge<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a bridge with the default frame size limit.
    pub fn new(reader: R, writer: W, dispatcher: Dispatcher) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
            dispatcher,
            recover_payload_errors: false,
        }
    }

    /// Sets the frame size limit for both directions.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.reader = self.reader.with_max_frame_size(max);
        self.writer = self.writer.with_max_frame_size(max);
        self
    }

    /// Answers complete but undecodable payloads (bad UTF-8, bad JSON, not
    /// an object) with an `ERROR` response instead of stopping.
    ///
    /// Off by default. Errors that leave the stream misaligned always stop
    /// the loop.
    pub fn recover_payload_errors(mut self, recover: bool) -> Self {
        self.recover_payload_errors = recover;
        self
    }

    /// Runs until end of stream.
    ///
    /// # Errors
    ///
    /// Returns `Read` for a request frame that cannot be decoded and
    /// `Write` when a response cannot be delivered.
    pub async fn run(mut self) -> Result<BridgeStats, BridgeError> {
        let mut stats = BridgeStats::default();

        loop {
            let result = match self.reader.read_message().await {
                Ok(Some(message)) => {
                    stats.requests += 1;
                    self.dispatcher.handle_message(&message).await
                }
                Ok(None) => {
                    tracing::info!(
                        requests = stats.requests,
                        errors = stats.errors,
                        "channel closed"
                    );
                    return Ok(stats);
                }
                Err(e) => {
                    emit_frame_rejected(&e);
                    if e.is_fatal() || !self.recover_payload_errors {
                        return Err(BridgeError::Read(e));
                    }
                    stats.requests += 1;
                    ScanResult::error(format!("Invalid message: {e}"))
                }
            };

            if result.is_analyzed() {
                stats.analyzed += 1;
            } else {
                stats.errors += 1;
            }

            self.respond(&result).await?;
        }
    }

    async fn respond(&mut self, result: &ScanResult) -> Result<(), BridgeError> {
        match self.writer.write_message(result).await {
            Err(FrameError::Oversized { size, max }) => {
                tracing::warn!(size, max, "response too large, sending error instead");
                let fallback =
                    ScanResult::error(OVERSIZED_RESPONSE_DETAILS).with_timestamp(result.timestamp);
                self.writer
                    .write_message(&fallback)
                    .await
                    .map_err(BridgeError::Write)
            }
            other => other.map_err(BridgeError::Write),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockClassifier, SandboxBackend, SandboxConfig, UrlBackend};
    use crate::codec::{encode_frame, DEFAULT_MAX_FRAME_SIZE};
    use crate::scoring::ScoringEngine;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .with_url_backend(UrlBackend::new(
                ScoringEngine::default(),
                Arc::new(MockClassifier::new_safe()),
            ))
            .with_file_backend(SandboxBackend::new(SandboxConfig::new(
                "/nonexistent/sentinel_cli",
            )))
            .build()
            .unwrap()
    }

    fn request(value: Value) -> Vec<u8> {
        encode_frame(&value, DEFAULT_MAX_FRAME_SIZE).unwrap()
    }

    async fn responses(mut output: &[u8]) -> Vec<Value> {
        let mut values = Vec::new();
        while !output.is_empty() {
            let len = output.read_u32_le().await.unwrap() as usize;
            values.push(serde_json::from_slice(&output[..len]).unwrap());
            output = &output[len..];
        }
        values
    }

    #[tokio::test]
    async fn test_one_response_per_request() {
        let mut input = request(json!({"target": "https://github.com/x"}));
        input.extend(request(json!({"target": "/tmp/a.bin"})));
        input.extend(request(json!({"target": "http://example.com/verify"})));

        let mut output = Vec::new();
        let stats = Bridge::new(&input[..], &mut output, dispatcher())
            .run()
            .await
            .unwrap();

        assert_eq!(
            stats,
            BridgeStats {
                requests: 3,
                analyzed: 2,
                errors: 1
            }
        );
        let values = responses(&output).await;
        assert_eq!(values.len(), 3);
        assert_eq!(values[0]["isolation_method"], "whitelist_check");
        assert_eq!(values[1]["status"], "ERROR");
        assert_eq!(values[2]["threat_score"]["score"], 45);
    }

    #[tokio::test]
    async fn test_empty_input_ends_cleanly() {
        let mut output = Vec::new();
        let stats = Bridge::new(&b""[..], &mut output, dispatcher())
            .run()
            .await
            .unwrap();
        assert_eq!(stats, BridgeStats::default());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_partial_prefix_ends_cleanly() {
        let mut output = Vec::new();
        let stats = Bridge::new(&[0x10u8, 0x00][..], &mut output, dispatcher())
            .run()
            .await
            .unwrap();
        assert_eq!(stats.requests, 0);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_fatal() {
        let mut input = request(json!({"target": "https://github.com/x"}));
        input.extend_from_slice(&100u32.to_le_bytes());
        input.extend_from_slice(b"{\"tar");

        let mut output = Vec::new();
        let err = Bridge::new(&input[..], &mut output, dispatcher())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::Read(FrameError::Truncated {
                expected: 100,
                received: 5
            })
        ));
        // The first request was still answered.
        assert_eq!(responses(&output).await.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_json_stops_by_default() {
        let mut input = (3u32).to_le_bytes().to_vec();
        input.extend_from_slice(b"{x}");

        let mut output = Vec::new();
        let err = Bridge::new(&input[..], &mut output, dispatcher())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Read(FrameError::Json(_))));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_bad_json_answered_when_recovering() {
        let mut input = (3u32).to_le_bytes().to_vec();
        input.extend_from_slice(b"[1]");
        input.extend(request(json!({"target": "https://github.com/x"})));

        let mut output = Vec::new();
        let stats = Bridge::new(&input[..], &mut output, dispatcher())
            .recover_payload_errors(true)
            .run()
            .await
            .unwrap();

        assert_eq!(stats.requests, 2);
        let values = responses(&output).await;
        assert_eq!(values[0]["status"], "ERROR");
        assert_eq!(
            values[0]["details"],
            "Invalid message: frame payload is not a JSON object"
        );
        assert_eq!(values[1]["status"], "ANALYZED");
    }

    #[tokio::test]
    async fn test_oversized_request_is_fatal() {
        let mut input = request(json!({"target": "https://github.com/x"}));
        input.extend_from_slice(&(200u32).to_le_bytes());
        input.extend_from_slice(&[b' '; 200]);

        let mut output = Vec::new();
        let err = Bridge::new(&input[..], &mut output, dispatcher())
            .with_max_frame_size(128)
            .recover_payload_errors(true)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err.frame_error(),
            FrameError::Oversized { size: 200, max: 128 }
        ));
    }

    #[tokio::test]
    async fn test_oversized_response_replaced() {
        let input = request(json!({"target": "https://github.com/x"}));

        let mut output = Vec::new();
        Bridge::new(&input[..], &mut output, dispatcher())
            .with_max_frame_size(128)
            .run()
            .await
            .unwrap();

        let values = responses(&output).await;
        assert_eq!(values[0]["status"], "ERROR");
        assert_eq!(values[0]["details"], OVERSIZED_RESPONSE_DETAILS);
    }

    #[tokio::test]
    async fn test_closed_writer_is_fatal() {
        let input = request(json!({"target": "https://github.com/x"}));
        let (client, server) = tokio::io::duplex(64);
        drop(server);

        let err = Bridge::new(&input[..], client, dispatcher())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Write(FrameError::Io(_))));
    }

    #[tokio::test]
    async fn test_interleaved_over_duplex() {
        let (mut client, bridge_side) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(bridge_side);
        let task = tokio::spawn(Bridge::new(reader, writer, dispatcher()).run());

        for target in ["https://github.com/a", "https://reddit.com/r"] {
            client.write_all(&request(json!({"target": target}))).await.unwrap();
            let len = client.read_u32_le().await.unwrap() as usize;
            let mut payload = vec![0u8; len];
            client.read_exact(&mut payload).await.unwrap();
            let value: Value = serde_json::from_slice(&payload).unwrap();
            assert_eq!(value["status"], "ANALYZED");
        }

        drop(client);
        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.requests, 2);
    }
}
