//! Message routing and fan-out
//!
//! The router takes reassembled units and delivers them on three independent
//! bounded queues: SysEx dumps, control changes, and note events. Policies
//! are fixed per category:
//!
//! - SysEx: small buffer, drop-oldest. A stale patch dump is useless; the
//!   newest one wins.
//! - Control change: medium buffer, drop-oldest, so the window keeps moving
//!   and the just-arrived value is never the victim.
//! - Notes: large buffer, drop-oldest with pairing: once a note-on has been
//!   handed to a consumer, the matching note-off is never evicted, and a
//!   note-off arriving at a full buffer takes a slot from the oldest
//!   buffered note-on.

use std::collections::{HashSet, VecDeque};

use tracing::{trace, warn};

use crate::protocol::metrics::Metrics;
use crate::protocol::{self, Error, SysexMessage};

use super::queue::{DropOldest, QueuePolicy, Subscription, Topic};
use super::reassembly::InboundEvent;
use super::voice::{ChannelVoice, ControlChangeEvent, NoteEvent, NoteKind};

/// Buffer depth of the SysEx dump queue
pub const SYSEX_QUEUE_DEPTH: usize = 8;

/// Buffer depth of the control-change queue
pub const CONTROL_QUEUE_DEPTH: usize = 64;

/// Buffer depth of the note queue
pub const NOTE_QUEUE_DEPTH: usize = 256;

/// One delivery on the SysEx queue.
///
/// A fully framed but invalid message is delivered as its classification
/// error, offending buffer attached - reassembly noise never gets this far,
/// and nothing in the streaming path panics on wire input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysexEvent {
    /// A classified, decoded dump
    Message(SysexMessage),
    /// A complete frame the classifier rejected
    Invalid(Error),
}

/// Drop-oldest with note pairing, per subscription.
///
/// `open` tracks notes whose note-on was handed to the consumer and whose
/// note-off hasn't been. Updated under the queue lock, so the eviction
/// decision always sees exact delivery state.
struct NotePairing {
    open: HashSet<(u8, u8)>,
}

impl NotePairing {
    fn new() -> Self {
        Self {
            open: HashSet::new(),
        }
    }

    fn is_owed_off(&self, event: &NoteEvent) -> bool {
        event.kind == NoteKind::Off && self.open.contains(&event.note_id())
    }
}

impl QueuePolicy<NoteEvent> for NotePairing {
    fn make_room(&mut self, queue: &mut VecDeque<NoteEvent>, incoming: &NoteEvent) -> bool {
        if incoming.kind == NoteKind::Off {
            // A note-off outranks any buffered note-on.
            if let Some(index) = queue.iter().position(|event| event.kind == NoteKind::On) {
                let _ = queue.remove(index);
                return true;
            }
        }
        // Otherwise shed the oldest event that is not an owed note-off.
        if let Some(index) = queue.iter().position(|event| !self.is_owed_off(event)) {
            let _ = queue.remove(index);
            return true;
        }
        // Every buffered event is an owed note-off; drop the incoming event.
        false
    }

    fn on_delivered(&mut self, event: &NoteEvent) {
        match event.kind {
            NoteKind::On => {
                self.open.insert(event.note_id());
            }
            NoteKind::Off => {
                self.open.remove(&event.note_id());
            }
        }
    }
}

/// Per-connection fan-out of classified events into category queues.
pub struct Router {
    sysex: Topic<SysexEvent>,
    control: Topic<ControlChangeEvent>,
    notes: Topic<NoteEvent>,
}

impl Router {
    /// A router with the fixed per-category depths and policies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sysex: Topic::new(SYSEX_QUEUE_DEPTH, || Box::new(DropOldest)),
            control: Topic::new(CONTROL_QUEUE_DEPTH, || Box::new(DropOldest)),
            notes: Topic::new(NOTE_QUEUE_DEPTH, || Box::new(NotePairing::new())),
        }
    }

    /// Classify and deliver one reassembled unit.
    pub fn route(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Sysex(raw) => match protocol::decode_raw(&raw) {
                Ok(message) => {
                    Metrics::record_classified(message.message_type());
                    trace!(message_type = %message.message_type(), "sysex delivered");
                    self.sysex.publish(&SysexEvent::Message(message));
                }
                Err(error) => {
                    Metrics::record_invalid_frame();
                    warn!(%error, "rejected sysex frame");
                    self.sysex.publish(&SysexEvent::Invalid(error));
                }
            },
            InboundEvent::Voice(voice) => self.route_voice(voice),
        }
    }

    fn route_voice(&mut self, voice: ChannelVoice) {
        match voice {
            ChannelVoice::NoteOn {
                channel,
                key,
                velocity,
            } => self.notes.publish(&NoteEvent {
                kind: NoteKind::On,
                channel,
                key,
                velocity,
            }),
            ChannelVoice::NoteOff {
                channel,
                key,
                velocity,
            } => self.notes.publish(&NoteEvent {
                kind: NoteKind::Off,
                channel,
                key,
                velocity,
            }),
            ChannelVoice::ControlChange {
                channel,
                controller,
                value,
            } => self.control.publish(&ControlChangeEvent {
                channel,
                controller,
                value,
            }),
            other => {
                // Pressure, program change, and pitch bend have no delivery
                // category at this layer.
                trace!(status = other.status(), "voice message not routed");
            }
        }
    }

    /// Subscribe to classified SysEx dumps.
    pub fn subscribe_sysex(&mut self) -> Subscription<SysexEvent> {
        self.sysex.subscribe()
    }

    /// Subscribe to control-change events.
    pub fn subscribe_control_changes(&mut self) -> Subscription<ControlChangeEvent> {
        self.control.subscribe()
    }

    /// Subscribe to note events.
    pub fn subscribe_notes(&mut self) -> Subscription<NoteEvent> {
        self.notes.subscribe()
    }

    /// Close every queue; called when the owning connection terminates.
    pub fn close(&mut self) {
        self.sysex.close();
        self.control.close();
        self.notes.close();
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ParamTag, ParameterSet, RawMessage};

    fn note_on(key: u8) -> InboundEvent {
        InboundEvent::Voice(ChannelVoice::NoteOn {
            channel: 0,
            key,
            velocity: 100,
        })
    }

    fn note_off(key: u8) -> InboundEvent {
        InboundEvent::Voice(ChannelVoice::NoteOff {
            channel: 0,
            key,
            velocity: 0,
        })
    }

    #[test]
    fn valid_dump_delivered_decoded() {
        let mut router = Router::new();
        let subscription = router.subscribe_sysex();

        let mut params = ParameterSet::new();
        params.set(ParamTag::FilterCutoff, 42).unwrap();
        let encoded = SysexMessage::program_dump(0, params).encode().unwrap();
        router.route(InboundEvent::Sysex(RawMessage::new(encoded)));

        let SysexEvent::Message(message) = subscription.try_recv().unwrap() else {
            panic!("expected decoded message");
        };
        assert_eq!(message, SysexMessage::program_dump(0, params));
    }

    #[test]
    fn invalid_frame_delivered_as_error() {
        let mut router = Router::new();
        let subscription = router.subscribe_sysex();

        router.route(InboundEvent::Sysex(RawMessage::new(vec![
            0xF0, 0x3E, 0x04, 0x00, 0x2A, 0x00, 0xF7,
        ])));

        let SysexEvent::Invalid(error) = subscription.try_recv().unwrap() else {
            panic!("expected classification error");
        };
        assert!(matches!(error, Error::UnknownCommandByte { command: 0x2A, .. }));
    }

    #[test]
    fn control_changes_routed_to_their_queue() {
        let mut router = Router::new();
        let controls = router.subscribe_control_changes();
        let notes = router.subscribe_notes();

        router.route(InboundEvent::Voice(ChannelVoice::ControlChange {
            channel: 1,
            controller: 74,
            value: 90,
        }));

        assert_eq!(
            controls.try_recv(),
            Some(ControlChangeEvent {
                channel: 1,
                controller: 74,
                value: 90
            })
        );
        assert_eq!(notes.try_recv(), None);
    }

    #[test]
    fn unrouted_voice_messages_are_dropped() {
        let mut router = Router::new();
        let controls = router.subscribe_control_changes();
        let notes = router.subscribe_notes();

        router.route(InboundEvent::Voice(ChannelVoice::PitchBend {
            channel: 0,
            value: 0x2000,
        }));

        assert_eq!(controls.try_recv(), None);
        assert_eq!(notes.try_recv(), None);
    }

    #[test]
    fn note_off_evicts_buffered_note_on_when_full() {
        let mut router = Router::new();
        let notes = router.subscribe_notes();

        for index in 0..NOTE_QUEUE_DEPTH {
            let event = InboundEvent::Voice(ChannelVoice::NoteOn {
                channel: (index / 128) as u8,
                key: (index % 128) as u8,
                velocity: 100,
            });
            router.route(event);
        }
        assert_eq!(notes.len(), NOTE_QUEUE_DEPTH);

        router.route(note_off(5));
        assert_eq!(notes.len(), NOTE_QUEUE_DEPTH);

        // the oldest buffered note-on (channel 0, key 0) made way
        let mut events = Vec::new();
        while let Some(event) = notes.try_recv() {
            events.push(event);
        }
        let first = events.first().unwrap();
        assert_eq!((first.channel, first.key, first.kind), (0, 1, NoteKind::On));
        let last = events.last().unwrap();
        assert_eq!(last.kind, NoteKind::Off);
        assert_eq!(last.key, 5);
    }

    #[test]
    fn delivered_note_on_protects_its_note_off() {
        let mut router = Router::new();
        let notes = router.subscribe_notes();

        // note-on delivered to the consumer: key 60 is now open
        router.route(note_on(60));
        let delivered = notes.try_recv().unwrap();
        assert_eq!(delivered.kind, NoteKind::On);

        // its note-off enters the buffer, then the buffer floods
        router.route(note_off(60));
        for key in 0..(NOTE_QUEUE_DEPTH * 2) {
            router.route(note_on((key % 128) as u8));
        }

        // the owed note-off survived the flood
        let mut seen_off = false;
        while let Some(event) = notes.try_recv() {
            if event.kind == NoteKind::Off && event.key == 60 {
                seen_off = true;
            }
        }
        assert!(seen_off, "owed note-off was dropped under pressure");
    }
}
