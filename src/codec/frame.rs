//! Length-prefixed JSON frames over async byte streams.

use crate::core::FrameError;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the little-endian `u32` length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default upper bound on a single payload (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A decoded message: a JSON object.
pub type Message = Map<String, Value>;

/// Encodes a message into a complete frame (prefix plus payload).
pub fn encode_frame<T: Serialize + ?Sized>(
    message: &T,
    max_frame_size: usize,
) -> Result<Vec<u8>, FrameError> {
    let payload = serde_json::to_vec(message)?;
    if payload.len() > max_frame_size || u32::try_from(payload.len()).is_err() {
        return Err(FrameError::Oversized {
            size: payload.len(),
            max: max_frame_size,
        });
    }

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a complete payload (without prefix) into a message.
pub fn decode_payload(payload: &[u8]) -> Result<Message, FrameError> {
    let text = std::str::from_utf8(payload).map_err(|e| FrameError::InvalidUtf8 {
        reason: e.to_string(),
    })?;
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(FrameError::NotAnObject),
    }
}

/// Reads frames from a byte stream.
///
/// # Example
///
/// ```rust
/// use sentinel_bridge::codec::{encode_frame, FrameReader, DEFAULT_MAX_FRAME_SIZE};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bytes = encode_frame(&json!({"target": "/tmp/a"}), DEFAULT_MAX_FRAME_SIZE).unwrap();
/// let mut reader = FrameReader::new(&bytes[..]);
///
/// let message = reader.read_message().await.unwrap().unwrap();
/// assert_eq!(message["target"], "/tmp/a");
/// assert!(reader.read_message().await.unwrap().is_none());
/// # }
/// ```
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_frame_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Creates a reader with the default size limit.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the maximum accepted payload size.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Reads one message.
    ///
    /// Returns `Ok(None)` when the stream ends before a complete length
    /// prefix, which is the normal way for a peer to hang up.
    ///
    /// # Errors
    ///
    /// - `Oversized` - the prefix announces more than the limit; nothing
    ///   of the payload is read.
    /// - `Truncated` - the stream ended inside the payload.
    /// - `InvalidUtf8` / `Json` / `NotAnObject` - the payload was read
    ///   completely but is unusable. The stream stays aligned.
    pub async fn read_message(&mut self) -> Result<Option<Message>, FrameError> {
        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        if self.fill(&mut prefix).await? < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let len = u32::from_le_bytes(prefix) as usize;
        if len > self.max_frame_size {
            return Err(FrameError::Oversized {
                size: len,
                max: self.max_frame_size,
            });
        }

        let mut payload = vec![0u8; len];
        let received = self.fill(&mut payload).await?;
        if received < len {
            return Err(FrameError::Truncated {
                expected: len,
                received,
            });
        }

        decode_payload(&payload).map(Some)
    }

    /// Reads until `buf` is full or the stream ends; returns bytes read.
    async fn fill(&mut self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes frames to a byte stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
    max_frame_size: usize,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Creates a writer with the default size limit.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the maximum payload size this writer will emit.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Serializes and writes one message, then flushes.
    ///
    /// The flush is required: the peer blocks until it has the full payload.
    pub async fn write_message<T: Serialize + ?Sized>(
        &mut self,
        message: &T,
    ) -> Result<(), FrameError> {
        let frame = encode_frame(message, self.max_frame_size)?;
        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(&json!({"a": 1}), DEFAULT_MAX_FRAME_SIZE).unwrap();
        assert_eq!(&frame[..4], &7u32.to_le_bytes());
        assert_eq!(&frame[4..], br#"{"a":1}"#);
    }

    #[test]
    fn test_encode_frame_oversized() {
        let big = json!({"blob": "x".repeat(64)});
        let err = encode_frame(&big, 16).unwrap_err();
        assert!(matches!(err, FrameError::Oversized { max: 16, .. }));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_message() {
        let original = json!({
            "target": "https://example.com/päth",
            "nested": {"list": [1, 2.5, null, true], "empty": {}},
            "unicode": "\u{1F512} lock"
        });
        let bytes = encode_frame(&original, DEFAULT_MAX_FRAME_SIZE).unwrap();
        let mut reader = FrameReader::new(&bytes[..]);

        let decoded = reader.read_message().await.unwrap().unwrap();
        assert_eq!(Value::Object(decoded), original);
    }

    #[tokio::test]
    async fn test_multiple_frames_in_sequence() {
        let mut bytes = encode_frame(&json!({"n": 1}), DEFAULT_MAX_FRAME_SIZE).unwrap();
        bytes.extend(encode_frame(&json!({"n": 2}), DEFAULT_MAX_FRAME_SIZE).unwrap());
        let mut reader = FrameReader::new(&bytes[..]);

        assert_eq!(reader.read_message().await.unwrap().unwrap()["n"], 1);
        assert_eq!(reader.read_message().await.unwrap().unwrap()["n"], 2);
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_stream_is_end_of_stream() {
        let mut reader = FrameReader::new(&b""[..]);
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_prefix_is_end_of_stream() {
        let mut reader = FrameReader::new(&[5u8, 0, 0][..]);
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_payload_is_truncated() {
        let mut bytes = 10u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{\"a\"");
        let mut reader = FrameReader::new(&bytes[..]);

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 10,
                received: 4
            }
        ));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected_before_payload() {
        let bytes = u32::MAX.to_le_bytes();
        let mut reader = FrameReader::new(&bytes[..]).with_max_frame_size(1024);

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, FrameError::Oversized { max: 1024, .. }));
    }

    #[tokio::test]
    async fn test_invalid_payload_keeps_stream_aligned() {
        let mut bytes = framed(b"not json");
        bytes.extend(framed(&[0xff, 0xfe]));
        bytes.extend(framed(b"[1,2]"));
        bytes.extend(framed(br#"{"ok":true}"#));
        let mut reader = FrameReader::new(&bytes[..]);

        assert!(matches!(
            reader.read_message().await.unwrap_err(),
            FrameError::Json(_)
        ));
        assert!(matches!(
            reader.read_message().await.unwrap_err(),
            FrameError::InvalidUtf8 { .. }
        ));
        assert!(matches!(
            reader.read_message().await.unwrap_err(),
            FrameError::NotAnObject
        ));
        assert_eq!(reader.read_message().await.unwrap().unwrap()["ok"], true);
    }

    #[tokio::test]
    async fn test_zero_length_frame_is_invalid_json() {
        let bytes = framed(b"");
        let mut reader = FrameReader::new(&bytes[..]);
        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, FrameError::Json(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_writer_flushes_complete_frame() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(client);
        let mut reader = FrameReader::new(server);

        writer
            .write_message(&json!({"status": "ANALYZED"}))
            .await
            .unwrap();
        drop(writer);

        let message = reader.read_message().await.unwrap().unwrap();
        assert_eq!(message["status"], "ANALYZED");
        assert!(reader.read_message().await.unwrap().is_none());
    }
}
