//! Protocol module - wire format, packet framing, and sequence numbers.
//!
//! This module implements the packet envelope:
//! - 6-byte request header plus a constant 2-byte trailer
//! - Response parsing where the payload is whatever the read delivered
//! - Per-session sequence number generation

mod packet;
mod sequence;
mod wire_format;

pub use packet::{build_request, parse_response, ResponsePacket};
pub use sequence::SequenceCounter;
pub use wire_format::{
    trailer_for, RequestHeader, ACK_FLAG, ENDPOINT_MASK, ENDPOINT_TRAILER, INTERFACE_ENDPOINT_ID,
    INTERFACE_TRAILER, REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE, SEQUENCE_MARKER, SEQUENCE_MASK,
    TRAILER_SIZE,
};
