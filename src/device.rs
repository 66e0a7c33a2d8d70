//! Device builder and connected device.
//!
//! The [`DeviceBuilder`] provides a fluent API for configuring the session.
//! [`DeviceBuilder::connect`] runs the introspection sequence:
//! 1. Open a session over the given transport
//! 2. Download the interface document from endpoint 0
//! 3. Build the endpoint tree
//!
//! Any failure aborts the whole sequence. Afterwards values are read and
//! written by dotted endpoint path.
//!
//! # Example
//!
//! ```no_run
//! use odrive_client::transport::StreamTransport;
//! use odrive_client::DeviceBuilder;
//! use std::time::Duration;
//!
//! let transport = StreamTransport::connect_tcp("192.168.1.50:9910")?;
//! let device = DeviceBuilder::new()
//!     .receive_timeout(Duration::from_millis(500))
//!     .connect(transport)?;
//!
//! let vbus = device.get_float32("vbus_voltage")?;
//! device.set_int32("axis0.requested_state", 8)?;
//! # let _ = vbus;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use crate::codec::{Value, ValueType};
use crate::endpoint::{build_tree, Endpoint};
use crate::error::{OdriveError, Result};
use crate::session::{Session, SessionConfig};
use crate::transport::Transport;

/// Builder for configuring and connecting to a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceBuilder {
    config: SessionConfig,
}

impl DeviceBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Set the largest response read in one receive.
    ///
    /// Default: 64
    pub fn max_receive_size(mut self, size: usize) -> Self {
        self.config.max_receive_size = size;
        self
    }

    /// Set how long each receive waits.
    ///
    /// Default: 1 second
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = timeout;
        self
    }

    /// Set the chunk size requested per interface document read.
    ///
    /// Default: 64
    pub fn interface_chunk_size(mut self, size: u16) -> Self {
        self.config.interface_chunk_size = size;
        self
    }

    /// Set the largest interface document accepted.
    ///
    /// Default: 1 MiB
    pub fn max_interface_size(mut self, size: usize) -> Self {
        self.config.max_interface_size = size;
        self
    }

    /// Get the configuration built so far.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a session over `transport` and introspect the device.
    pub fn connect<T: Transport>(self, transport: T) -> Result<Device<T>> {
        Device::connect(transport, self.config)
    }
}

/// A connected device with its endpoint tree.
pub struct Device<T> {
    session: Session<T>,
    root: Endpoint,
}

impl<T: Transport> Device<T> {
    /// Connect with the given configuration.
    pub fn connect(transport: T, config: SessionConfig) -> Result<Self> {
        let session = Session::new(transport, config);
        let document = session.fetch_interface_document()?;
        let root = build_tree(&document)?;
        Ok(Self { session, root })
    }

    /// Root of the endpoint tree.
    pub fn tree(&self) -> &Endpoint {
        &self.root
    }

    /// The underlying session, for raw requests by id.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Split into session and tree.
    pub fn into_parts(self) -> (Session<T>, Endpoint) {
        (self.session, self.root)
    }

    /// Look up an endpoint by dotted path.
    pub fn endpoint(&self, path: &str) -> Result<&Endpoint> {
        self.root
            .find(path)
            .filter(|_| !path.is_empty())
            .ok_or_else(|| OdriveError::UnknownEndpoint(path.to_string()))
    }

    /// Read an endpoint as `int32`, regardless of its declared type.
    pub fn get_int32(&self, path: &str) -> Result<i32> {
        let id = self.endpoint(path)?.id();
        self.session.get_int32(id)
    }

    /// Read an endpoint as `float32`, regardless of its declared type.
    pub fn get_float32(&self, path: &str) -> Result<f32> {
        let id = self.endpoint(path)?.id();
        self.session.get_float32(id)
    }

    /// Write an endpoint as `int32`.
    pub fn set_int32(&self, path: &str, value: i32) -> Result<()> {
        let id = self.endpoint(path)?.id();
        self.session.set_int32(id, value)
    }

    /// Write an endpoint as `float32`.
    pub fn set_float32(&self, path: &str, value: f32) -> Result<()> {
        let id = self.endpoint(path)?.id();
        self.session.set_float32(id, value)
    }

    /// Read an endpoint using the type it declares.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for containers, functions and unknown type strings.
    pub fn read(&self, path: &str) -> Result<Value> {
        let endpoint = self.endpoint(path)?;
        let ty = declared_value_type(path, endpoint)?;
        self.session.get(endpoint.id(), ty)
    }

    /// Write an endpoint, converting `value` to the declared type.
    ///
    /// Integers are accepted for float endpoints; anything else must match.
    pub fn write(&self, path: &str, value: Value) -> Result<()> {
        let endpoint = self.endpoint(path)?;
        let ty = declared_value_type(path, endpoint)?;
        let value = match (ty, value) {
            (ValueType::Float32, Value::Int32(v)) => Value::Float32(v as f32),
            (ValueType::Float32, Value::Int16(v)) => Value::Float32(f32::from(v)),
            (ValueType::Int32, Value::Int16(v)) => Value::Int32(i32::from(v)),
            (ty, value) if value.value_type() == ty => value,
            (_, _) => {
                return Err(OdriveError::UnsupportedType {
                    path: path.to_string(),
                    declared_type: endpoint.declared_type().to_string(),
                })
            }
        };
        self.session.set(endpoint.id(), &value)
    }
}

fn declared_value_type(path: &str, endpoint: &Endpoint) -> Result<ValueType> {
    endpoint
        .value_type()
        .ok_or_else(|| OdriveError::UnsupportedType {
            path: path.to_string(),
            declared_type: endpoint.declared_type().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestHeader;
    use crate::transport::MockTransport;

    const DOC: &[u8] = br#"[{"name":"vbus_voltage","type":"float","id":1,"access":"r"},
        {"name":"axis0","type":"object","id":2,"members":[
            {"name":"requested_state","type":"int32","id":3,"access":"rw"},
            {"name":"offset","type":"int16","id":4,"access":"rw"}]}]"#;

    /// Script the interface download, then hand back a device.
    fn connected(transport: &MockTransport) -> Device<MockTransport> {
        let mut seq = 0x81u16;
        for chunk in DOC.chunks(62) {
            transport.push_payload(seq, chunk);
            seq += 1;
        }
        transport.push_payload(seq, &[]);
        DeviceBuilder::new().connect(transport.clone()).unwrap()
    }

    fn last_endpoint(transport: &MockTransport) -> u16 {
        RequestHeader::decode(&transport.last_sent().unwrap())
            .unwrap()
            .address()
    }

    #[test]
    fn test_builder_configuration() {
        let builder = DeviceBuilder::new()
            .max_receive_size(128)
            .receive_timeout(Duration::from_millis(10))
            .interface_chunk_size(32)
            .max_interface_size(4096);

        let config = builder.config();
        assert_eq!(config.max_receive_size, 128);
        assert_eq!(config.receive_timeout, Duration::from_millis(10));
        assert_eq!(config.interface_chunk_size, 32);
        assert_eq!(config.max_interface_size, 4096);
    }

    #[test]
    fn test_connect_builds_tree() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        assert_eq!(device.tree().descendant_count(), 4);
        assert_eq!(device.endpoint("axis0.requested_state").unwrap().id(), 3);
    }

    #[test]
    fn test_connect_malformed_document_aborts() {
        let transport = MockTransport::new();
        transport.push_payload(0x81, br#"[{"name":"a","type":"int32"}]"#);
        transport.push_payload(0x82, &[]);

        let result = DeviceBuilder::new().connect(transport);
        assert!(matches!(result, Err(OdriveError::MalformedDocument(_))));
    }

    #[test]
    fn test_unknown_endpoint() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        assert!(matches!(
            device.get_int32("axis1.requested_state"),
            Err(OdriveError::UnknownEndpoint(_))
        ));
        assert!(matches!(
            device.endpoint(""),
            Err(OdriveError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn test_get_and_set_by_path() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        transport.push_payload(0x90, &24.5f32.to_le_bytes());
        assert_eq!(device.get_float32("vbus_voltage").unwrap(), 24.5);
        assert_eq!(last_endpoint(&transport), 1);

        device.set_int32("axis0.requested_state", 8).unwrap();
        assert_eq!(last_endpoint(&transport), 3);
        assert_eq!(&transport.last_sent().unwrap()[6..10], &8i32.to_le_bytes());
    }

    #[test]
    fn test_read_dispatches_on_declared_type() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        transport.push_payload(0x90, &[0x05, 0x00]);
        assert_eq!(device.read("axis0.offset").unwrap(), Value::Int16(5));

        transport.push_payload(0x91, &1.0f32.to_le_bytes());
        assert_eq!(device.read("vbus_voltage").unwrap(), Value::Float32(1.0));
    }

    #[test]
    fn test_read_container_unsupported() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        match device.read("axis0") {
            Err(OdriveError::UnsupportedType {
                path,
                declared_type,
            }) => {
                assert_eq!(path, "axis0");
                assert_eq!(declared_type, "object");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_converts_integers_to_float() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        device.write("vbus_voltage", Value::Int32(3)).unwrap();
        assert_eq!(&transport.last_sent().unwrap()[6..10], &3.0f32.to_le_bytes());
    }

    #[test]
    fn test_write_rejects_float_for_int() {
        let transport = MockTransport::new();
        let device = connected(&transport);

        let err = device
            .write("axis0.requested_state", Value::Float32(1.5))
            .unwrap_err();
        assert!(matches!(err, OdriveError::UnsupportedType { .. }));
    }

    #[test]
    fn test_into_parts() {
        let transport = MockTransport::new();
        let device = connected(&transport);
        let (session, root) = device.into_parts();
        assert_eq!(root["axis0"].id(), 2);
        assert!(session.sequence_number().unwrap() > 0);
    }
}
