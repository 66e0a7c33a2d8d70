//! In-memory transport for tests.
//!
//! [`MockTransport`] answers in one of two ways:
//! - scripted: responses queued with [`push_response`](MockTransport::push_response)
//!   are returned in order, one per receive call
//! - simulated: a responder closure sees each sent packet and returns the
//!   raw response bytes, which lets a test stand in for a whole device
//!
//! Clones share state, so a test can keep a handle after moving the transport
//! into a session and inspect what was sent.
//!
//! # Example
//!
//! ```
//! use odrive_client::transport::{MockTransport, Transport};
//! use std::time::Duration;
//!
//! let mut transport = MockTransport::new();
//! transport.push_response(vec![0x81, 0x00, 0x01]);
//!
//! transport.send(&[0u8; 8]).unwrap();
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_millis(10)).unwrap();
//! assert_eq!(&buf[..n], &[0x81, 0x00, 0x01]);
//! assert_eq!(transport.sent_packets().len(), 1);
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::Transport;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    script: VecDeque<Vec<u8>>,
    responder: Option<Responder>,
    /// Request waiting for the responder.
    pending: Option<Vec<u8>>,
    /// Accept at most this many bytes per send.
    send_limit: Option<usize>,
    receive_calls: usize,
}

/// Scripted or simulated device.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with nothing scripted; receives time out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that answers every packet through `responder`.
    ///
    /// Scripted responses, if any are queued, still take precedence.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let transport = Self::new();
        transport.lock().responder = Some(Box::new(responder));
        transport
    }

    /// Queue raw bytes for a future receive call.
    pub fn push_response(&self, raw: impl Into<Vec<u8>>) {
        self.lock().script.push_back(raw.into());
    }

    /// Queue a response made of `sequence_number` followed by `payload`.
    pub fn push_payload(&self, sequence_number: u16, payload: &[u8]) {
        let mut raw = sequence_number.to_le_bytes().to_vec();
        raw.extend_from_slice(payload);
        self.push_response(raw);
    }

    /// Make every send accept at most `limit` bytes.
    pub fn limit_send(&self, limit: usize) {
        self.lock().send_limit = Some(limit);
    }

    /// Every packet sent so far, oldest first.
    pub fn sent_packets(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Most recently sent packet.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        self.lock().sent.last().cloned()
    }

    /// Scripted responses not consumed yet.
    pub fn queued_responses(&self) -> usize {
        self.lock().script.len()
    }

    /// Number of receive calls made.
    pub fn receive_calls(&self) -> usize {
        self.lock().receive_calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide what was recorded
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let accepted = state.send_limit.map_or(data.len(), |limit| limit.min(data.len()));
        state.sent.push(data[..accepted].to_vec());
        state.pending = Some(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut state = self.lock();
        state.receive_calls += 1;

        let pending = state.pending.take();
        let response = match state.script.pop_front() {
            Some(raw) => raw,
            None => match (state.responder.as_mut(), pending) {
                (Some(responder), Some(request)) => responder(&request),
                _ => return Ok(0),
            },
        };

        // A real bulk read drops what does not fit
        let n = response.len().min(buf.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }
}
