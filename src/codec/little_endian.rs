//! Little-endian codec with type-tag dispatch.
//!
//! Reads go through [`bytes::Buf`], so any `&[u8]` works as the cursor and is
//! advanced past the consumed bytes. Writes append to a [`BytesMut`].

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::value::{Value, ValueType};
use crate::error::{OdriveError, Result};

/// Little-endian wire codec.
///
/// A marker struct with static methods, like the other codecs: the layout is
/// fixed at compile time by the caller.
pub struct WireCodec;

impl WireCodec {
    /// Append one value to `buf`.
    pub fn encode(value: &Value, buf: &mut BytesMut) {
        match value {
            Value::Int32(v) => Self::put_i32(buf, *v),
            Value::Int16(v) => Self::put_i16(buf, *v),
            Value::Float32(v) => Self::put_f32(buf, *v),
            Value::Bytes(b) => buf.extend_from_slice(b),
        }
    }

    /// Encode values back to back, in order.
    pub fn encode_all(values: &[Value]) -> BytesMut {
        let len = values.iter().map(Value::encoded_len).sum();
        let mut buf = BytesMut::with_capacity(len);
        for value in values {
            Self::encode(value, &mut buf);
        }
        buf
    }

    /// Decode one value of type `ty`, advancing `buf`.
    ///
    /// `ValueType::Bytes` takes everything that is left.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedBuffer` if fewer bytes remain than the tag needs.
    /// Nothing is consumed in that case.
    pub fn decode<B: Buf>(ty: ValueType, buf: &mut B) -> Result<Value> {
        let value = match ty {
            ValueType::Int32 => Value::Int32(Self::get_i32(buf)?),
            ValueType::Int16 => Value::Int16(Self::get_i16(buf)?),
            ValueType::Float32 => Value::Float32(Self::get_f32(buf)?),
            ValueType::Bytes => Value::Bytes(buf.copy_to_bytes(buf.remaining())),
        };
        Ok(value)
    }

    /// Decode a sequence of values laid out back to back.
    pub fn decode_all<B: Buf>(types: &[ValueType], buf: &mut B) -> Result<Vec<Value>> {
        types.iter().map(|ty| Self::decode(*ty, buf)).collect()
    }

    #[inline]
    pub fn put_i32(buf: &mut BytesMut, value: i32) {
        buf.put_i32_le(value);
    }

    #[inline]
    pub fn put_i16(buf: &mut BytesMut, value: i16) {
        buf.put_i16_le(value);
    }

    #[inline]
    pub fn put_u16(buf: &mut BytesMut, value: u16) {
        buf.put_u16_le(value);
    }

    /// Floats travel as their raw bit pattern.
    #[inline]
    pub fn put_f32(buf: &mut BytesMut, value: f32) {
        buf.put_u32_le(value.to_bits());
    }

    pub fn get_i32<B: Buf>(buf: &mut B) -> Result<i32> {
        ensure_remaining(buf, 4)?;
        Ok(buf.get_i32_le())
    }

    pub fn get_i16<B: Buf>(buf: &mut B) -> Result<i16> {
        ensure_remaining(buf, 2)?;
        Ok(buf.get_i16_le())
    }

    pub fn get_u16<B: Buf>(buf: &mut B) -> Result<u16> {
        ensure_remaining(buf, 2)?;
        Ok(buf.get_u16_le())
    }

    pub fn get_f32<B: Buf>(buf: &mut B) -> Result<f32> {
        ensure_remaining(buf, 4)?;
        Ok(f32::from_bits(buf.get_u32_le()))
    }

    /// Take exactly `len` bytes.
    pub fn get_bytes<B: Buf>(buf: &mut B, len: usize) -> Result<Bytes> {
        ensure_remaining(buf, len)?;
        Ok(buf.copy_to_bytes(len))
    }
}

#[inline]
fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(OdriveError::truncated(needed, buf.remaining()));
    }
    Ok(())
}
