//! Socket-backed transport.
//!
//! - TCP: a network bridge in front of the device's USB or UART port
//! - Unix: a local bridge socket (Unix only)
//!
//! A byte stream has no packet boundaries of its own, so the bridge on the
//! other end must write each device response in one piece. That matches how
//! the USB bulk endpoint delivers them.
//!
//! # Example
//!
//! ```no_run
//! use odrive_client::transport::StreamTransport;
//!
//! let transport = StreamTransport::connect_tcp("192.168.1.50:9910")?;
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Transport;

/// Shortest timeout handed to the socket; a zero duration means "block forever" there.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Streams whose reads can be bounded by a timeout.
pub trait ReadTimeout {
    /// Set the read timeout used by subsequent reads.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl ReadTimeout for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl ReadTimeout for std::os::unix::net::UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }
}

/// Transport over a connected byte stream.
pub struct StreamTransport<S> {
    stream: S,
    /// Timeout currently configured on the socket.
    read_timeout: Option<Duration>,
}

impl StreamTransport<TcpStream> {
    /// Connect to a TCP bridge.
    pub fn connect_tcp<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        // Requests are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[cfg(unix)]
impl StreamTransport<std::os::unix::net::UnixStream> {
    /// Connect to a Unix domain socket bridge.
    pub fn connect_unix<P: AsRef<std::path::Path>>(path: P) -> io::Result<Self> {
        let stream = std::os::unix::net::UnixStream::connect(path)?;
        Ok(Self::new(stream))
    }
}

impl<S> StreamTransport<S> {
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
        }
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write + ReadTimeout> Transport for StreamTransport<S> {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        // A packet cut short would run into the next one on the stream
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(data.len())
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let timeout = timeout.max(MIN_READ_TIMEOUT);
        if self.read_timeout != Some(timeout) {
            self.stream.set_read_timeout(Some(timeout))?;
            self.read_timeout = Some(timeout);
        }

        match self.stream.read(buf) {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "device bridge closed the connection",
            )),
            Ok(n) => Ok(n),
            Err(e) if is_timeout(&e) => {
                tracing::trace!("Receive timed out after {:?}", timeout);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

/// Platforms disagree on which kind a read timeout produces.
fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionConfig};
    use std::collections::VecDeque;
    use std::net::TcpListener;
    use std::thread;

    /// Stream that takes at most a few bytes per write.
    #[derive(Default)]
    struct TrickleStream {
        written: Vec<u8>,
        incoming: VecDeque<Vec<u8>>,
    }

    const TRICKLE: usize = 5;

    impl Write for TrickleStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(TRICKLE);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for TrickleStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.incoming.pop_front() {
                Some(response) => {
                    let n = response.len().min(buf.len());
                    buf[..n].copy_from_slice(&response[..n]);
                    Ok(n)
                }
                None => Err(io::ErrorKind::WouldBlock.into()),
            }
        }
    }

    impl ReadTimeout for TrickleStream {
        fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_writes_send_whole_packet() {
        let mut transport = StreamTransport::new(TrickleStream::default());
        let packet = [0x81, 0x00, 0x03, 0x80, 0x04, 0x00, 0x3E, 0x1C];

        assert_eq!(transport.send(&packet).unwrap(), packet.len());
        assert_eq!(transport.inner().written, packet);
    }

    #[test]
    fn test_partial_writes_keep_packets_apart() {
        let mut stream = TrickleStream::default();
        stream.incoming.push_back(vec![0x81, 0x00, 0x07, 0x00, 0x00, 0x00]);
        stream.incoming.push_back(vec![0x82, 0x00, 0x09, 0x00, 0x00, 0x00]);
        let session = Session::new(StreamTransport::new(stream), SessionConfig::default());

        assert_eq!(session.get_int32(3).unwrap(), 7);
        assert_eq!(session.get_int32(4).unwrap(), 9);

        let transport = session.into_transport().unwrap();
        assert_eq!(
            transport.inner().written,
            vec![
                0x81, 0x00, 0x03, 0x80, 0x04, 0x00, 0x3E, 0x1C, //
                0x82, 0x00, 0x04, 0x80, 0x04, 0x00, 0x3E, 0x1C,
            ]
        );
    }

    #[test]
    fn test_nothing_incoming_times_out() {
        let mut transport = StreamTransport::new(TrickleStream::default());
        let mut buf = [0u8; 64];
        assert_eq!(
            transport.receive(&mut buf, Duration::from_millis(5)).unwrap(),
            0
        );
    }

    #[test]
    fn test_tcp_send_and_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let device = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 8];
            socket.read_exact(&mut request).unwrap();
            socket.write_all(&[request[0], request[1], 0x2A]).unwrap();
            request
        });

        let mut transport = StreamTransport::connect_tcp(addr).unwrap();
        let packet = [0x81, 0x00, 0x05, 0x80, 0x04, 0x00, 0x3E, 0x1C];
        assert_eq!(transport.send(&packet).unwrap(), 8);

        let mut buf = [0u8; 64];
        let n = transport
            .receive(&mut buf, Duration::from_millis(1000))
            .unwrap();
        assert_eq!(&buf[..n], &[0x81, 0x00, 0x2A]);

        assert_eq!(device.join().unwrap(), packet);
    }

    #[test]
    fn test_tcp_timeout_returns_zero() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let device = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            // Stay connected without answering
            thread::sleep(Duration::from_millis(200));
            drop(socket);
        });

        let mut transport = StreamTransport::connect_tcp(addr).unwrap();
        let mut buf = [0u8; 64];
        let n = transport
            .receive(&mut buf, Duration::from_millis(20))
            .unwrap();
        assert_eq!(n, 0);

        device.join().unwrap();
    }

    #[test]
    fn test_tcp_closed_connection_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let device = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });

        let mut transport = StreamTransport::connect_tcp(addr).unwrap();
        device.join().unwrap();

        let mut buf = [0u8; 64];
        let err = transport
            .receive(&mut buf, Duration::from_millis(500))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_pair() {
        use std::os::unix::net::UnixStream;

        let (client, mut device) = UnixStream::pair().unwrap();
        let mut transport = StreamTransport::new(client);

        transport.send(&[1, 2, 3]).unwrap();
        let mut received = [0u8; 3];
        device.read_exact(&mut received).unwrap();
        assert_eq!(received, [1, 2, 3]);

        device.write_all(&[0x81, 0x00]).unwrap();
        let mut buf = [0u8; 64];
        let n = transport
            .receive(&mut buf, Duration::from_millis(500))
            .unwrap();
        assert_eq!(&buf[..n], &[0x81, 0x00]);
    }
}
