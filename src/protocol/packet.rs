//! Request building and response parsing.
//!
//! # Example
//!
//! ```
//! use odrive_client::protocol::{build_request, parse_response};
//!
//! let packet = build_request(0x81, 0x8003, 4, &[]);
//! assert_eq!(packet.len(), 6 + 2);
//!
//! let response = parse_response(&[0x81, 0x00, 0x01, 0x00, 0x00, 0x00]).unwrap();
//! assert_eq!(response.sequence_number(), 0x81);
//! assert_eq!(response.payload(), &[0x01, 0x00, 0x00, 0x00]);
//! ```

use bytes::{Buf, Bytes, BytesMut};

use super::wire_format::{RequestHeader, REQUEST_HEADER_SIZE, TRAILER_SIZE};
use crate::codec::WireCodec;
use crate::error::Result;

/// A response as delivered by one receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePacket {
    /// Sequence number echoed by the device.
    pub sequence_number: u16,
    /// Every byte after the sequence number.
    pub payload: Bytes,
}

impl ResponsePacket {
    /// Create a response packet.
    pub fn new(sequence_number: u16, payload: Bytes) -> Self {
        Self {
            sequence_number,
            payload,
        }
    }

    #[inline]
    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the packet, keeping the payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// A response with no payload ends an interface document transfer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Encode as the device would send it.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.payload.len());
        buf.extend_from_slice(&self.sequence_number.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }
}

/// Build a complete request packet.
///
/// The output is always `6 + payload.len() + 2` bytes: header, payload
/// verbatim, then the trailer chosen by [`trailer_for`](super::trailer_for).
pub fn build_request(
    sequence_number: u16,
    endpoint_id: u16,
    expected_response_len: u16,
    payload: &[u8],
) -> Vec<u8> {
    let header = RequestHeader::new(sequence_number, endpoint_id, expected_response_len);
    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + payload.len() + TRAILER_SIZE);
    header.encode_into(&mut buf);
    buf.extend_from_slice(payload);
    WireCodec::put_u16(&mut buf, header.trailer());
    buf.to_vec()
}

/// Parse the bytes of one receive call as a response.
///
/// The payload length comes from how many bytes were delivered; the response
/// carries no length field.
///
/// # Errors
///
/// Returns `TruncatedBuffer` if fewer than 2 bytes were received.
pub fn parse_response(raw: &[u8]) -> Result<ResponsePacket> {
    let mut reader = raw;
    let sequence_number = WireCodec::get_u16(&mut reader)?;
    let payload = reader.copy_to_bytes(reader.remaining());
    Ok(ResponsePacket::new(sequence_number, payload))
}
