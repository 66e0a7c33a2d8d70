//! Transport session: one request, one response, strictly in turn.
//!
//! A [`Session`] owns the transport and the connection's sequence counter.
//! Both sit behind a single mutex that is held for a full send/receive
//! exchange, so a second request can never be issued while one is in flight,
//! even when the session is shared between threads.
//!
//! # Example
//!
//! ```
//! use odrive_client::session::{Session, SessionConfig};
//! use odrive_client::transport::MockTransport;
//!
//! let transport = MockTransport::new();
//! transport.push_payload(0x81, &[0x01, 0x00, 0x00, 0x00]);
//!
//! let session = Session::new(transport, SessionConfig::default());
//! assert_eq!(session.get_int32(7).unwrap(), 1);
//! ```

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::codec::{Value, ValueType, WireCodec};
use crate::error::{OdriveError, Result};
use crate::protocol::{
    build_request, parse_response, SequenceCounter, ACK_FLAG, INTERFACE_ENDPOINT_ID,
    RESPONSE_HEADER_SIZE,
};
use crate::transport::Transport;

/// Default size of a single receive (one USB full-speed bulk packet).
pub const DEFAULT_MAX_RECEIVE_SIZE: usize = 64;

/// Default time to wait for a response.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default chunk size requested per interface document read.
pub const DEFAULT_INTERFACE_CHUNK_SIZE: u16 = 64;

/// Default cap on the assembled interface document (1 MiB).
pub const DEFAULT_MAX_INTERFACE_SIZE: usize = 1024 * 1024;

/// Session settings.
///
/// Loadable from JSON, with the timeout given in milliseconds:
///
/// ```
/// use odrive_client::session::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::from_json(r#"{ "receive_timeout_ms": 250 }"#).unwrap();
/// assert_eq!(config.receive_timeout, Duration::from_millis(250));
/// assert_eq!(config.max_receive_size, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest response accepted by one receive call, header included.
    pub max_receive_size: usize,
    /// How long a receive waits before giving up with an empty result.
    #[serde(rename = "receive_timeout_ms", with = "duration_ms")]
    pub receive_timeout: Duration,
    /// Expected response length sent with each interface document request.
    pub interface_chunk_size: u16,
    /// Abort the interface download past this many bytes.
    pub max_interface_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_receive_size: DEFAULT_MAX_RECEIVE_SIZE,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            interface_chunk_size: DEFAULT_INTERFACE_CHUNK_SIZE,
            max_interface_size: DEFAULT_MAX_INTERFACE_SIZE,
        }
    }
}

impl SessionConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom(format!("timeout {:?} does not fit in u64 milliseconds", value)))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// State guarded for the length of one exchange.
struct Exchange<T> {
    transport: T,
    sequence: SequenceCounter,
    receive_buf: Vec<u8>,
}

/// A connection to one device.
pub struct Session<T> {
    config: SessionConfig,
    exchange: Mutex<Exchange<T>>,
}

impl<T: Transport> Session<T> {
    /// Create a session over `transport`. The sequence counter starts at zero.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let receive_buf = vec![0u8; config.max_receive_size];
        Self {
            config,
            exchange: Mutex::new(Exchange {
                transport,
                sequence: SequenceCounter::new(),
                receive_buf,
            }),
        }
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Last transmitted sequence number, `0` before the first request.
    pub fn sequence_number(&self) -> Result<u16> {
        Ok(self.lock()?.sequence.current())
    }

    /// Consume the session and hand back the transport.
    pub fn into_transport(self) -> Result<T> {
        self.exchange
            .into_inner()
            .map(|exchange| exchange.transport)
            .map_err(|_| OdriveError::SessionPoisoned)
    }

    /// Send one request and wait for its response payload.
    ///
    /// `expected_response_len` tells the device how much to send back; it is
    /// not the length of `payload`. The response is whatever a single receive
    /// delivers: a timeout with nothing received gives an empty payload.
    ///
    /// # Errors
    ///
    /// - `ShortWrite` if the transport did not take the whole packet
    /// - `TruncatedBuffer` if a lone byte arrived where a sequence number was due
    /// - `Io` for any other transport failure
    pub fn endpoint_request(
        &self,
        endpoint_id: u16,
        payload: &[u8],
        want_ack: bool,
        expected_response_len: u16,
    ) -> Result<Bytes> {
        let endpoint_id = if want_ack {
            endpoint_id | ACK_FLAG
        } else {
            endpoint_id
        };

        let mut exchange = self.lock()?;
        let Exchange {
            transport,
            sequence,
            receive_buf,
        } = &mut *exchange;

        let seq = sequence.next();
        let packet = build_request(seq, endpoint_id, expected_response_len, payload);
        tracing::trace!("Request seq={:#06x} packet={:02x?}", seq, packet);

        let sent = transport.send(&packet)?;
        if sent != packet.len() {
            tracing::warn!(
                "Transport accepted {} of {} bytes for endpoint {:#06x}",
                sent,
                packet.len(),
                endpoint_id
            );
            return Err(OdriveError::ShortWrite {
                sent,
                expected: packet.len(),
            });
        }

        let received = transport.receive(receive_buf, self.config.receive_timeout)?;
        if received == 0 {
            tracing::debug!(
                "No response for endpoint {:#06x} (seq {:#06x})",
                endpoint_id,
                seq
            );
            return Ok(Bytes::new());
        }

        let response = parse_response(&receive_buf[..received])?;
        tracing::debug!(
            "Endpoint {:#06x} seq {:#06x}: sent {} bytes, received {} payload bytes",
            endpoint_id,
            seq,
            payload.len(),
            response.payload().len()
        );
        Ok(response.into_payload())
    }

    /// Download the interface document from endpoint 0.
    ///
    /// Each request carries the byte offset reached so far; the device answers
    /// with the next chunk and with an empty payload once the document is
    /// complete. Chunks are appended strictly in offset order.
    pub fn fetch_interface_document(&self) -> Result<Vec<u8>> {
        let mut document = Vec::new();
        let mut offset_buf = BytesMut::with_capacity(4);

        loop {
            offset_buf.clear();
            WireCodec::put_i32(&mut offset_buf, document.len() as i32);

            let chunk = self.endpoint_request(
                INTERFACE_ENDPOINT_ID,
                &offset_buf,
                true,
                self.config.interface_chunk_size,
            )?;
            if chunk.is_empty() {
                break;
            }

            if document.len() + chunk.len() > self.config.max_interface_size {
                return Err(OdriveError::InterfaceTooLarge(self.config.max_interface_size));
            }
            document.extend_from_slice(&chunk);
        }

        tracing::info!("Received {} bytes of interface document", document.len());
        Ok(document)
    }

    /// Read an `int32` endpoint.
    pub fn get_int32(&self, endpoint_id: u16) -> Result<i32> {
        let payload = self.endpoint_request(endpoint_id, &[], true, 4)?;
        WireCodec::get_i32(&mut &payload[..])
    }

    /// Read a `float32` endpoint.
    pub fn get_float32(&self, endpoint_id: u16) -> Result<f32> {
        let payload = self.endpoint_request(endpoint_id, &[], true, 4)?;
        WireCodec::get_f32(&mut &payload[..])
    }

    /// Write an `int32` endpoint. The device's reply is drained and ignored.
    pub fn set_int32(&self, endpoint_id: u16, value: i32) -> Result<()> {
        self.set(endpoint_id, &Value::Int32(value))
    }

    /// Write a `float32` endpoint. The device's reply is drained and ignored.
    pub fn set_float32(&self, endpoint_id: u16, value: f32) -> Result<()> {
        self.set(endpoint_id, &Value::Float32(value))
    }

    /// Read an endpoint as `ty`.
    ///
    /// `ValueType::Bytes` asks for as much as one receive can carry and
    /// returns the whole payload.
    pub fn get(&self, endpoint_id: u16, ty: ValueType) -> Result<Value> {
        let expected = match ty.width() {
            Some(width) => width,
            None => self
                .config
                .max_receive_size
                .saturating_sub(RESPONSE_HEADER_SIZE),
        };
        let expected = u16::try_from(expected).unwrap_or(u16::MAX);
        let payload = self.endpoint_request(endpoint_id, &[], true, expected)?;
        WireCodec::decode(ty, &mut &payload[..])
    }

    /// Write `value` to an endpoint.
    pub fn set(&self, endpoint_id: u16, value: &Value) -> Result<()> {
        let mut payload = BytesMut::with_capacity(value.encoded_len());
        WireCodec::encode(value, &mut payload);
        let expected = value.value_type().width().unwrap_or(0) as u16;
        self.endpoint_request(endpoint_id, &payload, true, expected)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Exchange<T>>> {
        self.exchange.lock().map_err(|_| OdriveError::SessionPoisoned)
    }
}
