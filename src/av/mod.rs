//! Core stream types shared by the demuxer backends: the MPEG stream-id
//! space, rational numbers for frame rates and aspect ratios, and the
//! descriptors the probes fill in.

use std::fmt;

mod packet;
pub use packet::*;

/// Wildcard stream id accepted by `read_packet` to match any stream.
pub const STREAM_ANY: u8 = 0xFF;

/// First MPEG video stream id (0xE0..=0xEF).
pub const VIDEO_ID_BASE: u8 = 0xE0;
/// First MPEG audio stream id (0xC0..=0xDF).
pub const AUDIO_ID_BASE: u8 = 0xC0;
/// First AC-3 sub-stream id (0x80..=0x87, carried under the private id).
pub const AC3_ID_BASE: u8 = 0x80;
/// First DTS sub-stream id (0x88..=0x8F).
pub const DTS_ID_BASE: u8 = 0x88;
/// First LPCM sub-stream id (0xA0..=0xA7).
pub const LPCM_ID_BASE: u8 = 0xA0;
/// First SPU (DVD subtitle) sub-stream id (0x20..=0x3F).
pub const SPU_ID_BASE: u8 = 0x20;
/// Private stream 1 id; AC-3/DTS/LPCM/SPU payloads hide behind it.
pub const PRIVATE1_ID: u8 = 0xBD;
/// Private stream 2 id.
pub const PRIVATE2_ID: u8 = 0xBF;

/// The nth MPEG video stream id.
pub fn video_stream_id(n: u8) -> u8 {
    VIDEO_ID_BASE + n
}

/// The nth MPEG audio stream id.
pub fn audio_stream_id(n: u8) -> u8 {
    AUDIO_ID_BASE + n
}

/// The nth AC-3 sub-stream id.
pub fn ac3_stream_id(n: u8) -> u8 {
    AC3_ID_BASE + n
}

/// The nth LPCM sub-stream id.
pub fn lpcm_stream_id(n: u8) -> u8 {
    LPCM_ID_BASE + n
}

/// True for MPEG video stream ids.
pub fn is_mpeg_video_id(id: u8) -> bool {
    (id & 0xF0) == 0xE0
}

/// True for MPEG audio stream ids.
pub fn is_mpeg_audio_id(id: u8) -> bool {
    (id & 0xE0) == 0xC0
}

/// True for AC-3 sub-stream ids.
pub fn is_ac3_id(id: u8) -> bool {
    (id & 0xF8) == 0x80
}

/// True for DTS sub-stream ids.
pub fn is_dts_id(id: u8) -> bool {
    (id & 0xF8) == 0x88
}

/// True for LPCM sub-stream ids.
pub fn is_lpcm_id(id: u8) -> bool {
    (id & 0xF8) == 0xA0
}

/// True for SPU sub-stream ids.
pub fn is_spu_id(id: u8) -> bool {
    (id & 0xE0) == 0x20
}

/// True for the two private stream ids.
pub fn is_private_id(id: u8) -> bool {
    id == PRIVATE1_ID || id == PRIVATE2_ID
}

/// True for any id carrying audio of some flavor.
pub fn is_audio_id(id: u8) -> bool {
    is_mpeg_audio_id(id) || is_ac3_id(id) || is_dts_id(id) || is_lpcm_id(id)
}

/// Stream selector for `read_packet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSelect {
    /// Accept a packet from any registered stream.
    Any,
    /// Accept only packets with this exact stream id.
    Id(u8),
}

impl StreamSelect {
    /// True when `id` satisfies this selector.
    pub fn matches(&self, id: u8) -> bool {
        match *self {
            StreamSelect::Any => true,
            StreamSelect::Id(want) => want == id || want == STREAM_ANY,
        }
    }
}

/// Broad stream classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// A video elementary stream.
    Video,
    /// An audio elementary stream.
    Audio,
    /// Multiplexed or control data (program stream map and friends).
    Multiplex,
}

/// A rational number, as used for frame rates and aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fraction {
    /// Numerator.
    pub num: u32,
    /// Denominator.
    pub den: u32,
}

impl Fraction {
    /// Builds a fraction without reducing it.
    pub const fn new(num: u32, den: u32) -> Self {
        Fraction { num, den }
    }

    /// True for the `0/0` table sentinel.
    pub fn is_unset(&self) -> bool {
        self.num == 0 && self.den == 0
    }

    /// Returns the fraction reduced by the greatest common divisor.
    pub fn reduced(self) -> Self {
        if self.num == 0 || self.den == 0 {
            return self;
        }
        let mut a = self.num;
        let mut b = self.den;
        while b != 0 {
            let t = a % b;
            a = b;
            b = t;
        }
        Fraction {
            num: self.num / a,
            den: self.den / a,
        }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Video-specific stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoParams {
    /// Frame rate from the sequence header or descriptor table.
    pub frame_rate: Fraction,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Display aspect ratio.
    pub aspect: Fraction,
    /// Frame count, when a container layer supplies one.
    pub frames: u32,
}

/// Audio-specific stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u32,
    /// Sample count, when a container layer supplies one.
    pub samples: u32,
    /// Block alignment in bytes.
    pub block_align: u32,
    /// Sample size in bits.
    pub sample_size: u32,
}

/// Format parameters of a discovered stream; the arm is the stream kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParams {
    /// Video parameters.
    Video(VideoParams),
    /// Audio parameters.
    Audio(AudioParams),
    /// No per-kind parameters (multiplex/control streams).
    Multiplex,
}

impl StreamParams {
    /// The kind this arm represents.
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamParams::Video(_) => StreamKind::Video,
            StreamParams::Audio(_) => StreamKind::Audio,
            StreamParams::Multiplex => StreamKind::Multiplex,
        }
    }
}

/// One elementary stream discovered inside a container.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Raw MPEG stream id (or private sub-stream id).
    pub stream_id: u8,
    /// Codec name, e.g. `"video/mpeg"` or `"audio/ac3"`.
    pub codec: &'static str,
    /// PTS of the packet that revealed this stream, in 90 kHz ticks.
    pub start_time: u64,
    /// Discovery index; stable for the life of the container.
    pub index: usize,
    /// Bitrate in kbit/s, zero when unknown.
    pub bit_rate: u32,
    /// Kind-specific parameters.
    pub params: StreamParams,
}

impl StreamInfo {
    /// A blank descriptor for a freshly registered stream.
    pub fn new(index: usize, stream_id: u8, codec: &'static str, params: StreamParams) -> Self {
        StreamInfo {
            stream_id,
            codec,
            start_time: 0,
            index,
            bit_rate: 0,
            params,
        }
    }

    /// The stream kind, derived from the parameter arm.
    pub fn kind(&self) -> StreamKind {
        self.params.kind()
    }

    /// Video parameters, when this is a video stream.
    pub fn video(&self) -> Option<&VideoParams> {
        match &self.params {
            StreamParams::Video(v) => Some(v),
            _ => None,
        }
    }

    /// Audio parameters, when this is an audio stream.
    pub fn audio(&self) -> Option<&AudioParams> {
        match &self.params {
            StreamParams::Audio(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for StreamParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamParams::Video(v) => {
                write!(f, "{}x{}", v.width, v.height)?;
                if !v.frame_rate.is_unset() {
                    write!(f, " {} fps", v.frame_rate)?;
                }
                if !v.aspect.is_unset() {
                    write!(f, " aspect {}", v.aspect)?;
                }
                Ok(())
            }
            StreamParams::Audio(a) => {
                write!(f, "{} Hz, {} ch", a.sample_rate, a.channels)?;
                if a.sample_size > 0 {
                    write!(f, ", {} bit", a.sample_size)?;
                }
                Ok(())
            }
            StreamParams::Multiplex => write!(f, "(multiplex)"),
        }
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream #{}: {} (id 0x{:02X}) {}",
            self.index, self.codec, self.stream_id, self.params
        )?;
        if self.bit_rate > 0 {
            match self.params {
                StreamParams::Video(_) => write!(f, " {} kbps", self.bit_rate)?,
                StreamParams::Audio(_) => write!(f, ", {} kbps", self.bit_rate)?,
                StreamParams::Multiplex => {}
            }
        }
        Ok(())
    }
}
