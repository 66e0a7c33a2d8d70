//! Connect to a device and print its endpoint tree.
//!
//! ```text
//! cargo run --example dump_tree -- 192.168.1.50:9910 [config.json]
//! cargo run --example dump_tree --features usb -- usb [config.json]
//! ```
//!
//! Set `RUST_LOG=odrive_client=trace` to see every packet.

use std::env;
use std::fs;

use odrive_client::transport::StreamTransport;
use odrive_client::{Device, DeviceBuilder, SessionConfig, Transport};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let mut args = env::args().skip(1);
    let target = args.next().unwrap_or_else(|| "127.0.0.1:9910".to_string());
    let config = match args.next() {
        Some(path) => SessionConfig::from_json(&fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    let builder = DeviceBuilder::with_config(config);

    info!(%target, timeout_ms = builder.config().receive_timeout.as_millis() as u64, "connecting");
    if target == "usb" {
        #[cfg(feature = "usb")]
        {
            let transport = odrive_client::transport::UsbTransport::open_default()?;
            dump(&builder.connect(transport)?);
            return Ok(());
        }
        #[cfg(not(feature = "usb"))]
        return Err("built without the `usb` feature".into());
    }

    let transport = StreamTransport::connect_tcp(target.as_str())?;
    dump(&builder.connect(transport)?);
    Ok(())
}

/// `RUST_LOG` when set and valid, crate info logging otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("odrive_client=info"))
}

fn dump<T: Transport>(device: &Device<T>) {
    print!("{}", device.tree());

    for (path, endpoint) in device.tree().walk() {
        if endpoint.is_readable() && endpoint.value_type().is_some() {
            match device.read(&path) {
                Ok(value) => println!("{} = {}", path, value),
                Err(e) => println!("{} = <{}>", path, e),
            }
        }
    }
}
