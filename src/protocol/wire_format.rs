//! Wire format constants and request header encoding.
//!
//! Request packet:
//! ```text
//! ┌──────────┬─────────────┬──────────────┬─────────┬─────────┐
//! │ Seq no   │ Endpoint ID │ Expected len │ Payload │ Trailer │
//! │ 2 bytes  │ 2 bytes     │ 2 bytes      │ N bytes │ 2 bytes │
//! │ uint16 LE│ uint16 LE   │ uint16 LE    │         │ uint16LE│
//! └──────────┴─────────────┴──────────────┴─────────┴─────────┘
//! ```
//!
//! Response packet:
//! ```text
//! ┌──────────┬──────────────────────────────┐
//! │ Seq no   │ Payload (rest of the read)   │
//! │ 2 bytes  │                              │
//! └──────────┴──────────────────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use bytes::BytesMut;

use crate::codec::WireCodec;

/// Request header size in bytes (seq, endpoint, expected length).
pub const REQUEST_HEADER_SIZE: usize = 6;

/// Trailer size in bytes.
pub const TRAILER_SIZE: usize = 2;

/// Response header size in bytes (seq only).
pub const RESPONSE_HEADER_SIZE: usize = 2;

/// Endpoint ID bit asking the device to answer.
pub const ACK_FLAG: u16 = 0x8000;

/// Mask selecting the endpoint address without the ack bit.
pub const ENDPOINT_MASK: u16 = 0x7FFF;

/// Mask applied to the sequence number on every increment.
pub const SEQUENCE_MASK: u16 = 0x7FFF;

/// Marker bit OR'd into every sequence number.
pub const SEQUENCE_MARKER: u16 = 0x0080;

/// Reserved endpoint serving the JSON interface document.
pub const INTERFACE_ENDPOINT_ID: u16 = 0;

/// Trailer sent with requests to the interface endpoint.
pub const INTERFACE_TRAILER: u16 = 1;

/// Trailer sent with requests to every other endpoint.
pub const ENDPOINT_TRAILER: u16 = 7230;

/// Pick the trailer for a request.
///
/// The trailer is a fixed protocol constant keyed on the target address, not a
/// checksum over the packet contents.
///
/// ```
/// use odrive_client::protocol::{trailer_for, ACK_FLAG, ENDPOINT_TRAILER, INTERFACE_TRAILER};
///
/// assert_eq!(trailer_for(0), INTERFACE_TRAILER);
/// assert_eq!(trailer_for(ACK_FLAG), INTERFACE_TRAILER);
/// assert_eq!(trailer_for(42 | ACK_FLAG), ENDPOINT_TRAILER);
/// ```
#[inline]
pub fn trailer_for(endpoint_id: u16) -> u16 {
    if endpoint_id & ENDPOINT_MASK == INTERFACE_ENDPOINT_ID {
        INTERFACE_TRAILER
    } else {
        ENDPOINT_TRAILER
    }
}

/// Header of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Transmitted sequence number (marker bit already applied).
    pub sequence_number: u16,
    /// Target endpoint, bit 15 set when a response is wanted.
    pub endpoint_id: u16,
    /// Size of the reply the caller expects, not the size of this request's payload.
    pub expected_response_len: u16,
}

impl RequestHeader {
    /// Create a new header.
    pub fn new(sequence_number: u16, endpoint_id: u16, expected_response_len: u16) -> Self {
        Self {
            sequence_number,
            endpoint_id,
            expected_response_len,
        }
    }

    /// Encode header to bytes (Little Endian).
    pub fn encode(&self) -> [u8; REQUEST_HEADER_SIZE] {
        let mut buf = [0u8; REQUEST_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.sequence_number.to_le_bytes());
        buf[2..4].copy_from_slice(&self.endpoint_id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.expected_response_len.to_le_bytes());
        buf
    }

    /// Append the encoded header to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        WireCodec::put_u16(buf, self.sequence_number);
        WireCodec::put_u16(buf, self.endpoint_id);
        WireCodec::put_u16(buf, self.expected_response_len);
    }

    /// Decode a header from bytes.
    ///
    /// Returns `None` if buffer is too short. Only needed by device-side code
    /// and tests; the client never receives request headers.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < REQUEST_HEADER_SIZE {
            return None;
        }
        Some(Self {
            sequence_number: u16::from_le_bytes([buf[0], buf[1]]),
            endpoint_id: u16::from_le_bytes([buf[2], buf[3]]),
            expected_response_len: u16::from_le_bytes([buf[4], buf[5]]),
        })
    }

    /// Endpoint address without the ack bit.
    #[inline]
    pub fn address(&self) -> u16 {
        self.endpoint_id & ENDPOINT_MASK
    }

    /// Check if the request asks for a response.
    #[inline]
    pub fn wants_ack(&self) -> bool {
        self.endpoint_id & ACK_FLAG != 0
    }

    /// Trailer matching this header's address.
    #[inline]
    pub fn trailer(&self) -> u16 {
        trailer_for(self.endpoint_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_little_endian_byte_order() {
        let header = RequestHeader::new(0x0281, 0x8003, 0x0040);
        let bytes = header.encode();

        assert_eq!(bytes, [0x81, 0x02, 0x03, 0x80, 0x40, 0x00]);
    }

    #[test]
    fn test_header_encode_into_matches_encode() {
        let header = RequestHeader::new(0x81, 0x8000, 64);
        let mut buf = BytesMut::new();
        header.encode_into(&mut buf);
        assert_eq!(&buf[..], &header.encode()[..]);
    }

    #[test]
    fn test_header_decode() {
        let header = RequestHeader::new(0x1234, 0x8055, 4);
        let decoded = RequestHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.address(), 0x55);
        assert!(decoded.wants_ack());
    }

    #[test]
    fn test_decode_too_short_buffer() {
        assert!(RequestHeader::decode(&[0u8; 5]).is_none());
    }

    #[test]
    fn test_trailer_for_interface_endpoint() {
        assert_eq!(trailer_for(0), 1);
        assert_eq!(trailer_for(0x8000), 1);
    }

    #[test]
    fn test_trailer_for_regular_endpoint() {
        assert_eq!(trailer_for(1), 7230);
        assert_eq!(trailer_for(0x7FFF), 7230);
        assert_eq!(trailer_for(0x8123), 7230);
    }

    #[test]
    fn test_header_trailer() {
        assert_eq!(RequestHeader::new(0x81, 0x8000, 64).trailer(), INTERFACE_TRAILER);
        assert_eq!(RequestHeader::new(0x81, 0x8010, 4).trailer(), ENDPOINT_TRAILER);
    }
}
