//! Shared wire protocol types and framing.
//!
//! Defines the envelope format for route calls: a 4-byte big-endian length
//! prefix followed by a UTF-8 JSON payload.
//!
//! ```text
//! [u32 BE: len][UTF-8 JSON bytes of len]
//! ```
//!
//! One connection carries exactly one request frame and one response frame.
//! The response field names `payload`/`status`/`elapsed` are the wire
//! contract on both sides.

use crate::config::WireConfig;
use crate::error::{Result, SwitchboardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Response status codes carried in the envelope.
pub mod status {
    /// Route found and its handler returned normally.
    pub const OK: u16 = 200;
    /// The request frame arrived intact but did not decode as a `Request`.
    pub const BAD_REQUEST: u16 = 400;
    /// No handler registered for the requested route.
    pub const NOT_FOUND: u16 = 404;
    /// The handler failed.
    pub const INTERNAL_ERROR: u16 = 500;
}

/// Value carried by a request: a bare string or a string-keyed map.
///
/// Serialized untagged, so the wire form is a JSON string or a JSON object.
/// The shape is route-specific and not validated generically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallValue {
    Text(String),
    Map(BTreeMap<String, String>),
}

impl Default for CallValue {
    /// Callers that pass no value send the empty string.
    fn default() -> Self {
        CallValue::Text(String::new())
    }
}

impl From<&str> for CallValue {
    fn from(value: &str) -> Self {
        CallValue::Text(value.to_string())
    }
}

impl From<String> for CallValue {
    fn from(value: String) -> Self {
        CallValue::Text(value)
    }
}

impl From<BTreeMap<String, String>> for CallValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        CallValue::Map(value)
    }
}

/// A route call request.
///
/// Both fields are required; a document missing either fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub route: String,
    pub value: CallValue,
}

impl Request {
    /// Create a new request.
    pub fn new(route: impl Into<String>, value: impl Into<CallValue>) -> Self {
        Self {
            route: route.into(),
            value: value.into(),
        }
    }
}

/// A route call response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Handler result, `"invalid"` for unknown routes, or an error string.
    pub payload: serde_json::Value,
    pub status: u16,
    /// Wall-clock seconds from route lookup to envelope construction.
    pub elapsed: f64,
}

impl Response {
    /// Create a success response.
    pub fn ok(payload: serde_json::Value, elapsed: f64) -> Self {
        Self {
            payload,
            status: status::OK,
            elapsed,
        }
    }

    /// Create an error response; the message becomes the payload.
    pub fn error(status: u16, message: impl Into<String>, elapsed: f64) -> Self {
        Self {
            payload: serde_json::Value::String(message.into()),
            status,
            elapsed,
        }
    }

    /// Whether the call was dispatched and its handler returned normally.
    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }
}

/// Read a length-prefixed frame from an async reader.
///
/// Frame format: `[4-byte BE u32 length][payload bytes]`
///
/// Returns `None` on clean EOF before a header (peer closed the connection).
/// EOF inside a frame is an error, and a declared length above
/// `WireConfig::MAX_FRAME_SIZE` is rejected before any allocation.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;

    if len > WireConfig::MAX_FRAME_SIZE {
        return Err(SwitchboardError::FrameTooLarge {
            size: len,
            max: WireConfig::MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(payload))
}

/// Write a length-prefixed frame to an async writer.
///
/// Frame format: `[4-byte BE u32 length][payload bytes]`
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip_with_string_value() {
        let req = Request::new("echo", "hi");
        let json = serde_json::to_string(&req).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.route, "echo");
        assert_eq!(parsed.value, CallValue::Text("hi".into()));
    }

    #[test]
    fn test_request_roundtrip_with_map_value() {
        let mut map = BTreeMap::new();
        map.insert("user".to_string(), "ada".to_string());
        map.insert("mode".to_string(), "full".to_string());
        let req = Request::new("login", map.clone());

        let json = serde_json::to_string(&req).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.route, "login");
        assert_eq!(parsed.value, CallValue::Map(map));
    }

    #[test]
    fn test_request_missing_value_fails_decode() {
        let result = serde_json::from_str::<Request>(r#"{"route": "echo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_string(&Request::new("echo", "hi")).unwrap();
        assert_eq!(json, r#"{"route":"echo","value":"hi"}"#);
    }

    #[test]
    fn test_call_value_default_is_empty_text() {
        assert_eq!(CallValue::default(), CallValue::Text(String::new()));
    }

    #[test]
    fn test_response_encodes_canonical_field_names() {
        let resp = Response::ok(serde_json::json!("hi"), 0.25);
        let json = serde_json::to_string(&resp).unwrap();

        assert!(json.contains("\"payload\""));
        assert!(json.contains("\"status\""));
        assert!(json.contains("\"elapsed\""));
    }

    #[test]
    fn test_response_decodes_canonical_field_names() {
        let resp: Response =
            serde_json::from_str(r#"{"payload": "hi", "status": 200, "elapsed": 0.25}"#).unwrap();

        assert_eq!(resp.payload, serde_json::json!("hi"));
        assert_eq!(resp.status, status::OK);
        assert!((resp.elapsed - 0.25).abs() < 1e-9);
        assert!(resp.is_ok());
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = Response::ok(serde_json::json!({"count": 3}), 0.001_25);
        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.payload, resp.payload);
        assert_eq!(parsed.status, resp.status);
        assert!((parsed.elapsed - resp.elapsed).abs() < 1e-9);
    }

    #[test]
    fn test_response_error_constructor() {
        let resp = Response::error(status::NOT_FOUND, "invalid", 0.0);

        assert_eq!(resp.status, 404);
        assert_eq!(resp.payload, serde_json::json!("invalid"));
        assert!(!resp.is_ok());
    }

    #[tokio::test]
    async fn test_frame_read_write_roundtrip() {
        let payload = b"hello world";
        let mut buf = Vec::new();

        write_frame(&mut buf, payload).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let read_back = read_frame(&mut cursor).await.unwrap();

        assert_eq!(read_back, Some(payload.to_vec()));
    }

    #[tokio::test]
    async fn test_frame_read_empty_stream_returns_none() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut cursor).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_frame_read_oversized_returns_error() {
        // Craft a frame header claiming a huge payload
        let huge_len: u32 = (WireConfig::MAX_FRAME_SIZE + 1) as u32;
        let mut buf = Vec::new();
        buf.extend_from_slice(&huge_len.to_be_bytes());
        buf.extend_from_slice(&[0u8; 8]); // some bytes but not enough

        let mut cursor = std::io::Cursor::new(buf);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(
            result,
            Err(SwitchboardError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_frame_read_truncated_payload_is_error() {
        // Header promises 10 bytes, stream carries 3. This is a mid-frame
        // EOF, distinct from the clean-close None above.
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_be_bytes());
        buf.extend_from_slice(b"abc");

        let mut cursor = std::io::Cursor::new(buf);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(SwitchboardError::Io { .. })));
    }

    #[tokio::test]
    async fn test_frame_roundtrip_larger_than_one_read_buffer() {
        // Well past any single recv buffer; framing carries it whole.
        let payload = vec![b'x'; 8 * 1024];
        let mut buf = Vec::new();

        write_frame(&mut buf, &payload).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let read_back = read_frame(&mut cursor).await.unwrap();
        assert_eq!(read_back, Some(payload));
    }
}
