//! Codec identification and parameter probing.
//!
//! Each registry entry ties an ISO 13818-1 `stream_type` byte to a
//! codec name, a default stream-id base and a probe function. The
//! demuxers use the registry two ways: to resolve entries of a program
//! stream map, and to sniff raw elementary streams by trying every
//! probe in order.

pub mod ac3;
pub mod mpegaudio;
pub mod mpegvideo;

use crate::av::{StreamInfo, StreamKind};
use crate::error::{MpegError, Result};

/// Audio probes report this sample size when the bitstream carries none.
pub(crate) const DEFAULT_SAMPLE_SIZE: u32 = 16;

/// A parameter probe: inspects the start of a payload and fills in
/// stream parameters on success.
pub type ProbeFn = fn(&mut StreamInfo, &[u8]) -> Result<()>;

/// One recognized codec.
pub struct StreamType {
    /// ISO 13818-1 `stream_type` byte, as carried in a program stream map.
    pub stream_type: u8,
    /// Base stream id assigned when the container names no real id.
    pub id_base: u8,
    /// Coarse classification.
    pub kind: StreamKind,
    /// Codec name.
    pub codec: &'static str,
    /// Parameter probe for this codec.
    pub probe: ProbeFn,
}

/// The codec registry, in elementary stream probe order.
pub static STREAM_TYPES: [StreamType; 10] = [
    StreamType {
        stream_type: 0x01,
        id_base: crate::av::VIDEO_ID_BASE,
        kind: StreamKind::Video,
        codec: "video/mpeg",
        probe: mpegvideo::probe,
    },
    StreamType {
        stream_type: 0x02,
        id_base: crate::av::VIDEO_ID_BASE,
        kind: StreamKind::Video,
        codec: "video/mpeg2",
        probe: mpegvideo::probe,
    },
    StreamType {
        stream_type: 0x03,
        id_base: crate::av::AUDIO_ID_BASE,
        kind: StreamKind::Audio,
        codec: "audio/mpeg",
        probe: mpegaudio::probe,
    },
    StreamType {
        stream_type: 0x03,
        id_base: crate::av::AUDIO_ID_BASE,
        kind: StreamKind::Audio,
        codec: "audio/mp2",
        probe: mpegaudio::probe,
    },
    StreamType {
        stream_type: 0x03,
        id_base: crate::av::AUDIO_ID_BASE,
        kind: StreamKind::Audio,
        codec: "audio/mp3",
        probe: mpegaudio::probe,
    },
    StreamType {
        stream_type: 0x04,
        id_base: crate::av::AUDIO_ID_BASE,
        kind: StreamKind::Audio,
        codec: "audio/mpeg",
        probe: mpegaudio::probe,
    },
    StreamType {
        stream_type: 0x0F,
        id_base: crate::av::AUDIO_ID_BASE,
        kind: StreamKind::Audio,
        codec: "audio/aac",
        probe: probe_null,
    },
    StreamType {
        stream_type: 0x10,
        id_base: crate::av::VIDEO_ID_BASE,
        kind: StreamKind::Video,
        codec: "video/mpeg4",
        probe: probe_null,
    },
    StreamType {
        stream_type: 0x1A,
        id_base: crate::av::VIDEO_ID_BASE,
        kind: StreamKind::Video,
        codec: "video/h264",
        probe: probe_null,
    },
    StreamType {
        stream_type: 0x80,
        id_base: crate::av::PRIVATE1_ID,
        kind: StreamKind::Audio,
        codec: "audio/ac3",
        probe: ac3::probe,
    },
];

/// Looks up the first registry entry with the given `stream_type` byte.
pub fn by_stream_type(stream_type: u8) -> Option<&'static StreamType> {
    STREAM_TYPES.iter().find(|t| t.stream_type == stream_type)
}

/// Looks up the first registry entry with the given codec name.
pub fn by_codec_name(codec: &str) -> Option<&'static StreamType> {
    STREAM_TYPES.iter().find(|t| t.codec == codec)
}

/// Probe for codecs recognized by id alone; it never matches payload.
pub fn probe_null(_info: &mut StreamInfo, _data: &[u8]) -> Result<()> {
    Err(MpegError::ProbeFailed(
        "no parameter probe for this codec".into(),
    ))
}
