//! Transport module - the duplex byte channel underneath a session.
//!
//! The protocol layer only needs two blocking calls, captured by [`Transport`]:
//! send one packet, then receive whatever the device answers within a timeout.
//!
//! Provides:
//! - [`StreamTransport`] - TCP / Unix socket bridges to the device
//! - [`MockTransport`] - scripted or simulated device for tests
//! - `UsbTransport` - bulk endpoints through libusb (feature `usb`)
//!
//! # Preconditions
//!
//! Responses are matched to requests purely by ordering. A transport must
//! deliver each response whole, in order, without loss or duplication, and
//! must not produce packets nobody asked for.

mod mock;
mod stream;
#[cfg(feature = "usb")]
mod usb;

use std::io;
use std::time::Duration;

pub use mock::MockTransport;
pub use stream::{ReadTimeout, StreamTransport};
#[cfg(feature = "usb")]
pub use usb::{
    UsbTransport, DATA_INTERFACE, ENDPOINT_IN, ENDPOINT_OUT, ODRIVE_PRODUCT_ID, ODRIVE_VENDOR_ID,
};

/// Blocking packet channel to the device.
pub trait Transport {
    /// Send one packet, returning how many bytes the channel accepted.
    fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Receive at most `buf.len()` bytes, waiting up to `timeout`.
    ///
    /// Returning fewer bytes than requested, including zero on timeout, is not
    /// an error.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).receive(buf, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).receive(buf, timeout)
    }
}
