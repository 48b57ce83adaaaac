use std::sync::atomic::{AtomicU64, Ordering};

use super::MessageType;

/// Track protocol counters without external dependencies.
pub(crate) struct Metrics;

static FRAMES_CLASSIFIED: AtomicU64 = AtomicU64::new(0);
static FRAMES_INVALID: AtomicU64 = AtomicU64::new(0);
static MESSAGES_SENT: AtomicU64 = AtomicU64::new(0);
static REASSEMBLY_RESTARTS: AtomicU64 = AtomicU64::new(0);
static EVENTS_DROPPED: AtomicU64 = AtomicU64::new(0);
static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

struct MessageTypeCounters {
    program_dump: AtomicU64,
    program_bulk_dump: AtomicU64,
    all_dump: AtomicU64,
}

static MESSAGE_COUNTERS: MessageTypeCounters = MessageTypeCounters::new();

impl MessageTypeCounters {
    const fn new() -> Self {
        Self {
            program_dump: AtomicU64::new(0),
            program_bulk_dump: AtomicU64::new(0),
            all_dump: AtomicU64::new(0),
        }
    }

    fn increment(&self, message_type: MessageType) {
        match message_type {
            MessageType::ProgramDump { .. } => {
                self.program_dump.fetch_add(1, Ordering::Relaxed);
            }
            MessageType::ProgramBulkDump { .. } => {
                self.program_bulk_dump.fetch_add(1, Ordering::Relaxed);
            }
            MessageType::AllDump { .. } => {
                self.all_dump.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Metrics {
    #[inline]
    pub(crate) fn record_classified(message_type: MessageType) {
        FRAMES_CLASSIFIED.fetch_add(1, Ordering::Relaxed);
        MESSAGE_COUNTERS.increment(message_type);
    }

    #[inline]
    pub(crate) fn record_invalid_frame() {
        FRAMES_INVALID.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sent() {
        MESSAGES_SENT.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reassembly_restart() {
        REASSEMBLY_RESTARTS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped_events(count: u64) {
        EVENTS_DROPPED.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_connection_open() {
        ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_connection_close() {
        ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            frames_classified: FRAMES_CLASSIFIED.load(Ordering::Relaxed),
            frames_invalid: FRAMES_INVALID.load(Ordering::Relaxed),
            messages_sent: MESSAGES_SENT.load(Ordering::Relaxed),
            reassembly_restarts: REASSEMBLY_RESTARTS.load(Ordering::Relaxed),
            events_dropped: EVENTS_DROPPED.load(Ordering::Relaxed),
            active_connections: ACTIVE_CONNECTIONS.load(Ordering::Relaxed),
            program_dumps: MESSAGE_COUNTERS.program_dump.load(Ordering::Relaxed),
            program_bulk_dumps: MESSAGE_COUNTERS.program_bulk_dump.load(Ordering::Relaxed),
            all_dumps: MESSAGE_COUNTERS.all_dump.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of the protocol counters.
#[derive(Default, Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    /// Frames that passed the full classification ladder
    pub frames_classified: u64,
    /// Fully framed messages rejected by classification
    pub frames_invalid: u64,
    /// Messages encoded and handed to the device adapter
    pub messages_sent: u64,
    /// Partial buffers discarded on an unexpected start marker
    pub reassembly_restarts: u64,
    /// Events evicted from delivery queues by overflow policies
    pub events_dropped: u64,
    /// Connections currently alive
    pub active_connections: u64,
    /// Classified ProgramDump frames (either polarity)
    pub program_dumps: u64,
    /// Classified ProgramBulkDump frames (either polarity)
    pub program_bulk_dumps: u64,
    /// Classified AllDump frames (either polarity)
    pub all_dumps: u64,
}

impl MetricsSnapshot {
    /// Fraction of fully framed messages that failed classification, or
    /// `None` before any frame has been seen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn invalid_frame_ratio(&self) -> Option<f64> {
        let total = self.frames_classified + self.frames_invalid;
        if total == 0 {
            return None;
        }
        Some(self.frames_invalid as f64 / total as f64)
    }
}
