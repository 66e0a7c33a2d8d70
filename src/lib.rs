//! # odrive-client
//!
//! Host-side client for the ODrive native packet protocol.
//!
//! The device exposes a tree of endpoints, each with a 16-bit id. The host
//! reads the tree once from endpoint 0 as a JSON interface document and then
//! reads or writes individual endpoints with small request/response packets.
//!
//! ## Architecture
//!
//! - **Transport**: moves raw bytes (USB bulk, serial bridge, TCP, Unix socket)
//! - **Session**: packet framing, sequence numbers and one-at-a-time exchanges
//! - **Endpoint tree**: built from the interface document, navigated by path
//!
//! ## Example
//!
//! ```no_run
//! use odrive_client::transport::StreamTransport;
//! use odrive_client::DeviceBuilder;
//!
//! let transport = StreamTransport::connect_tcp("127.0.0.1:9910")?;
//! let device = DeviceBuilder::new().connect(transport)?;
//!
//! print!("{}", device.tree());
//! let pos = device.get_float32("axis0.encoder.pos_estimate")?;
//! println!("position: {}", pos);
//! # Ok::<(), odrive_client::OdriveError>(())
//! ```

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

mod device;

pub use device::{Device, DeviceBuilder};
pub use endpoint::Endpoint;
pub use error::{OdriveError, Result};
pub use session::{Session, SessionConfig};
pub use transport::Transport;
