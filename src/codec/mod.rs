//! Codec module - little-endian serialization of endpoint values.
//!
//! The wire format is not self-describing: every field is written at a fixed
//! width in a fixed order and the reader has to know the layout in advance.
//! [`ValueType`] is that knowledge made explicit, and [`WireCodec`] dispatches
//! on it in both directions:
//!
//! | Tag | Width | Encoding |
//! |-----|-------|----------|
//! | `Int32` | 4 | two's complement, LSB first |
//! | `Int16` | 2 | two's complement, LSB first |
//! | `Float32` | 4 | IEEE-754 bit pattern, LSB first |
//! | `Bytes` | rest | verbatim, no length prefix |
//!
//! # Example
//!
//! ```
//! use odrive_client::codec::{Value, ValueType, WireCodec};
//!
//! let encoded = WireCodec::encode_all(&[Value::Int16(-2), Value::Float32(1.5)]);
//! assert_eq!(encoded.len(), 6);
//!
//! let mut reader = &encoded[..];
//! let values = WireCodec::decode_all(&[ValueType::Int16, ValueType::Float32], &mut reader).unwrap();
//! assert_eq!(values, vec![Value::Int16(-2), Value::Float32(1.5)]);
//! ```

mod little_endian;
mod value;

pub use little_endian::WireCodec;
pub use value::{Value, ValueType};
