//! USB bulk transport (feature `usb`).
//!
//! The device speaks the packet protocol over a pair of bulk endpoints. By
//! default these are endpoint 1 OUT / 1 IN on the CDC data interface.
//!
//! # Example
//!
//! ```no_run
//! use odrive_client::transport::UsbTransport;
//! use odrive_client::DeviceBuilder;
//!
//! let transport = UsbTransport::open_default()?;
//! let device = DeviceBuilder::new().connect(transport)?;
//! # Ok::<(), odrive_client::OdriveError>(())
//! ```

use std::io;
use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext, UsbContext};

use super::Transport;

/// pid.codes vendor id used by ODrive boards.
pub const ODRIVE_VENDOR_ID: u16 = 0x1209;

/// Product id of ODrive v3 boards.
pub const ODRIVE_PRODUCT_ID: u16 = 0x0D32;

/// Interface carrying the bulk data endpoints.
pub const DATA_INTERFACE: u8 = 1;

/// Host to device bulk endpoint.
pub const ENDPOINT_OUT: u8 = 0x01;

/// Device to host bulk endpoint.
pub const ENDPOINT_IN: u8 = 0x81;

/// Shortest timeout handed to libusb; zero means "wait forever" there.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Transport over a claimed USB interface.
pub struct UsbTransport<C: UsbContext = GlobalContext> {
    handle: DeviceHandle<C>,
    interface: u8,
    endpoint_out: u8,
    endpoint_in: u8,
    write_timeout: Duration,
}

impl UsbTransport<GlobalContext> {
    /// Open the first ODrive found and claim its data interface.
    pub fn open_default() -> io::Result<Self> {
        Self::open(ODRIVE_VENDOR_ID, ODRIVE_PRODUCT_ID, DATA_INTERFACE)
    }

    /// Open the first device matching `vendor_id:product_id` and claim `interface`.
    pub fn open(vendor_id: u16, product_id: u16, interface: u8) -> io::Result<Self> {
        let handle = rusb::open_device_with_vid_pid(vendor_id, product_id).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no USB device {:04x}:{:04x}", vendor_id, product_id),
            )
        })?;
        Self::claim(handle, interface)
    }
}

impl<C: UsbContext> UsbTransport<C> {
    /// Claim `interface` on an already opened device.
    pub fn claim(mut handle: DeviceHandle<C>, interface: u8) -> io::Result<Self> {
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => return Err(to_io(e)),
        }
        handle.claim_interface(interface).map_err(to_io)?;
        tracing::debug!("Claimed USB interface {}", interface);

        Ok(Self {
            handle,
            interface,
            endpoint_out: ENDPOINT_OUT,
            endpoint_in: ENDPOINT_IN,
            write_timeout: Duration::ZERO,
        })
    }

    /// Use a different pair of bulk endpoints.
    pub fn with_endpoints(mut self, endpoint_out: u8, endpoint_in: u8) -> Self {
        self.endpoint_out = endpoint_out;
        self.endpoint_in = endpoint_in;
        self
    }

    /// Bound each send. `Duration::ZERO`, the default, waits forever.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn handle(&self) -> &DeviceHandle<C> {
        &self.handle
    }
}

impl<C: UsbContext> Transport for UsbTransport<C> {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.handle
            .write_bulk(self.endpoint_out, data, self.write_timeout)
            .map_err(to_io)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let timeout = timeout.max(MIN_READ_TIMEOUT);
        receive_result(self.handle.read_bulk(self.endpoint_in, buf, timeout))
    }
}

impl<C: UsbContext> Drop for UsbTransport<C> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(self.interface) {
            tracing::debug!("Releasing USB interface {} failed: {}", self.interface, e);
        }
    }
}

/// A bulk read that timed out delivered nothing.
fn receive_result(result: rusb::Result<usize>) -> io::Result<usize> {
    match result {
        Ok(n) => Ok(n),
        Err(rusb::Error::Timeout) => Ok(0),
        Err(e) => Err(to_io(e)),
    }
}

fn to_io(err: rusb::Error) -> io::Error {
    let kind = match err {
        rusb::Error::Timeout => io::ErrorKind::TimedOut,
        rusb::Error::NoDevice => io::ErrorKind::NotConnected,
        rusb::Error::NotFound => io::ErrorKind::NotFound,
        rusb::Error::Access => io::ErrorKind::PermissionDenied,
        rusb::Error::Interrupted => io::ErrorKind::Interrupted,
        rusb::Error::InvalidParam => io::ErrorKind::InvalidInput,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
