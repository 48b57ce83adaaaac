//! Per-connection protocol context
//!
//! One [`Connection`] per attached device, constructed when the transport
//! reports the device and dropped when it goes away - there is no global
//! registry. The transport pushes raw byte chunks into [`ingest`]
//! (Connection::ingest) from whatever thread it owns; a mutex around the
//! reassembler and router gives the single-writer discipline the state
//! machine needs. Consumers hold [`Subscription`]s and read concurrently.
//!
//! [`ingest`]: Connection::ingest

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::protocol::SysexMessage;
use crate::protocol::metrics::Metrics;

use super::error::{SendError, TransportError};
use super::queue::Subscription;
use super::reassembly::Reassembler;
use super::router::{Router, SysexEvent};
use super::voice::{ControlChangeEvent, NoteEvent};

/// The seam to the physical MIDI transport.
///
/// Implementations wrap whatever actually moves bytes (CoreMIDI, ALSA, a
/// test double). Failures stay in the [`TransportError`] taxonomy; they are
/// never folded into protocol errors.
pub trait DeviceIo: Send {
    /// Hand raw bytes to the device for physical transmission.
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

struct Ingest {
    reassembler: Reassembler,
    router: Router,
}

/// Protocol context for one attached device.
pub struct Connection {
    ingest: Mutex<Ingest>,
    io: Mutex<Box<dyn DeviceIo>>,
}

impl Connection {
    /// Build a connection over the given device adapter.
    pub fn new(io: impl DeviceIo + 'static) -> Self {
        Metrics::record_connection_open();
        Self {
            ingest: Mutex::new(Ingest {
                reassembler: Reassembler::new(),
                router: Router::new(),
            }),
            io: Mutex::new(Box::new(io)),
        }
    }

    /// Feed one raw transport chunk.
    ///
    /// Safe to call from any thread; chunks are processed in call order, one
    /// at a time, so fragments from concurrent deliveries never interleave
    /// mid-frame.
    #[instrument(level = "trace", skip(self, chunk), fields(len = chunk.len()))]
    pub fn ingest(&self, chunk: &[u8]) {
        let mut guard = self.ingest.lock().expect("ingest mutex poisoned");
        let events = guard.reassembler.feed(chunk);
        for event in events {
            guard.router.route(event);
        }
    }

    /// Drop any partial reassembly state, e.g. after a stream discontinuity.
    pub fn reset(&self) {
        self.ingest
            .lock()
            .expect("ingest mutex poisoned")
            .reassembler
            .reset();
    }

    /// Subscribe to classified SysEx dumps.
    pub fn subscribe_sysex(&self) -> Subscription<SysexEvent> {
        self.ingest
            .lock()
            .expect("ingest mutex poisoned")
            .router
            .subscribe_sysex()
    }

    /// Subscribe to control-change events.
    pub fn subscribe_control_changes(&self) -> Subscription<ControlChangeEvent> {
        self.ingest
            .lock()
            .expect("ingest mutex poisoned")
            .router
            .subscribe_control_changes()
    }

    /// Subscribe to note events.
    pub fn subscribe_notes(&self) -> Subscription<NoteEvent> {
        self.ingest
            .lock()
            .expect("ingest mutex poisoned")
            .router
            .subscribe_notes()
    }

    /// Send raw, already-encoded bytes to the device.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.io
            .lock()
            .expect("device io mutex poisoned")
            .send_bytes(bytes)
    }

    /// Encode a message and send it to the device.
    ///
    /// Encode failures surface as [`SendError::Protocol`] before any byte
    /// reaches the adapter; adapter failures as [`SendError::Transport`].
    #[instrument(level = "debug", skip(self, message), fields(message_type = %message.message_type()))]
    pub fn send_message(&self, message: &SysexMessage) -> Result<(), SendError> {
        let bytes = message.encode()?;
        self.send_bytes(&bytes)?;
        Metrics::record_sent();
        debug!(len = bytes.len(), "message sent");
        Ok(())
    }

    /// Convenience wait for the next decoded dump, with a timeout.
    ///
    /// Equivalent to holding a SysEx subscription created now; prefer a
    /// standing subscription for anything beyond one-shot request/response.
    pub fn receive_sysex(&self, timeout: Duration) -> Option<SysexEvent> {
        self.subscribe_sysex().recv_timeout(timeout)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.ingest.lock() {
            guard.router.close();
        }
        Metrics::record_connection_close();
        debug!("connection closed");
    }
}
