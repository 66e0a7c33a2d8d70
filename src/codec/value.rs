//! Value type tags and tagged values.

use std::fmt;

use bytes::Bytes;

/// Wire representation of an endpoint value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit signed integer.
    Int32,
    /// 16-bit signed integer.
    Int16,
    /// IEEE-754 binary32.
    Float32,
    /// Raw bytes, length known from context.
    Bytes,
}

impl ValueType {
    /// Encoded width in bytes, `None` for [`ValueType::Bytes`].
    #[inline]
    pub fn width(self) -> Option<usize> {
        match self {
            ValueType::Int32 | ValueType::Float32 => Some(4),
            ValueType::Int16 => Some(2),
            ValueType::Bytes => None,
        }
    }

    /// Map a type string from the interface document onto a wire tag.
    ///
    /// Returns `None` for container and function types, which carry no value.
    ///
    /// ```
    /// use odrive_client::codec::ValueType;
    ///
    /// assert_eq!(ValueType::from_declared("float"), Some(ValueType::Float32));
    /// assert_eq!(ValueType::from_declared("int32"), Some(ValueType::Int32));
    /// assert_eq!(ValueType::from_declared("object"), None);
    /// ```
    pub fn from_declared(declared: &str) -> Option<Self> {
        match declared {
            "int32" => Some(ValueType::Int32),
            "int16" => Some(ValueType::Int16),
            "float" | "float32" => Some(ValueType::Float32),
            "bytes" => Some(ValueType::Bytes),
            _ => None,
        }
    }

    /// Name used in interface documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Int32 => "int32",
            ValueType::Int16 => "int16",
            ValueType::Float32 => "float32",
            ValueType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value tagged with its wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer.
    Int32(i32),
    /// 16-bit signed integer.
    Int16(i16),
    /// IEEE-754 binary32.
    Float32(f32),
    /// Raw bytes.
    Bytes(Bytes),
}

impl Value {
    /// The tag of this value.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int32(_) => ValueType::Int32,
            Value::Int16(_) => ValueType::Int16,
            Value::Float32(_) => ValueType::Float32,
            Value::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Number of bytes this value occupies on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Bytes(b) => b.len(),
            other => other.value_type().width().unwrap_or(0),
        }
    }

    /// Get the integer, if this is an `Int32` or `Int16`.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(v) => Some(v),
            Value::Int16(v) => Some(i32::from(v)),
            _ => None,
        }
    }

    /// Get the float, if this is a `Float32`.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Bytes(b) => {
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}
