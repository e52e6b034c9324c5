//! Control events injected into DVD program streams.
//!
//! DVD players feed the demuxer a private packet (stream id `0xFC`)
//! whenever navigation changes the timeline: a cell jump shifts every
//! following timestamp, a menu press flushes the decoders, a still
//! frame pauses the clock, and an angle or language change rebinds
//! the active audio substream. Each event is a small big-endian
//! record with a type word up front.

/// A navigation event carried by a DVD control packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DvdEvent {
    /// Add this many 90 kHz ticks to every later timestamp.
    PtsSkip(i64),
    /// Drop buffered data for the marked decoder and start clean.
    Flush(u32),
    /// Hold the last decoded picture until further notice.
    Still,
    /// Route the named audio stream id through the primary audio slot.
    AudioId(u32),
}

const EVENT_PTS_SKIP: u32 = 1;
const EVENT_FLUSH: u32 = 2;
const EVENT_STILL: u32 = 3;
const EVENT_AUDIO_ID: u32 = 4;

impl DvdEvent {
    /// Decodes a control payload, or `None` if the record is foreign
    /// or too short to hold its arguments.
    pub fn parse(data: &[u8]) -> Option<DvdEvent> {
        let kind = u32::from_be_bytes(data.get(0..4)?.try_into().ok()?);
        match kind {
            EVENT_PTS_SKIP => {
                let ticks = i64::from_be_bytes(data.get(4..12)?.try_into().ok()?);
                Some(DvdEvent::PtsSkip(ticks))
            }
            EVENT_FLUSH => {
                let target = u32::from_be_bytes(data.get(4..8)?.try_into().ok()?);
                Some(DvdEvent::Flush(target))
            }
            EVENT_STILL => Some(DvdEvent::Still),
            EVENT_AUDIO_ID => {
                let id = u32::from_be_bytes(data.get(4..8)?.try_into().ok()?);
                Some(DvdEvent::AudioId(id))
            }
            _ => None,
        }
    }
}
