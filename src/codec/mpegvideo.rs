//! MPEG-1/2 video parameter probing.
//!
//! The probe expects a sequence header at the very start of the
//! payload. Payloads that open mid-GOP fail the probe; the demuxer
//! keeps the stream registered and simply reports default parameters.

use crate::av::{Fraction, StreamInfo, StreamParams, VideoParams};
use crate::error::{MpegError, Result};
use crate::utils::BitReader;

/// Frame rates by `frame_rate_code`. `0/0` marks reserved codes.
pub const FRAME_RATES: [Fraction; 16] = [
    Fraction::new(0, 0),
    Fraction::new(24000, 1001),
    Fraction::new(24, 1),
    Fraction::new(25, 1),
    Fraction::new(30000, 1001),
    Fraction::new(30, 1),
    Fraction::new(50, 1),
    Fraction::new(60000, 1001),
    Fraction::new(60, 1),
    Fraction::new(1, 1),
    Fraction::new(5, 1),
    Fraction::new(10, 1),
    Fraction::new(12, 1),
    Fraction::new(15, 1),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
];

/// Display aspect ratios by `aspect_ratio_information`. `0/0` marks
/// codes with no display ratio defined.
pub const ASPECT_RATIOS: [Fraction; 16] = [
    Fraction::new(0, 0),
    Fraction::new(1, 1),
    Fraction::new(4, 3),
    Fraction::new(16, 9),
    Fraction::new(221, 100),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
    Fraction::new(4, 3),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
    Fraction::new(4, 3),
    Fraction::new(4, 3),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
    Fraction::new(0, 0),
];

const SEQUENCE_HEADER: [u8; 4] = [0x00, 0x00, 0x01, 0xB3];
const MIN_HEADER_LEN: usize = 11;

/// Parses a sequence header at the start of `data` and fills in the
/// video parameters and bit rate.
pub fn probe(info: &mut StreamInfo, data: &[u8]) -> Result<()> {
    if data.len() < MIN_HEADER_LEN {
        return Err(MpegError::ProbeFailed(
            "not enough data for a sequence header".into(),
        ));
    }
    if data[..4] != SEQUENCE_HEADER {
        return Err(MpegError::ProbeFailed(
            "no sequence header at payload start".into(),
        ));
    }

    let mut r = BitReader::new(&data[4..]);
    let width = r.read_bits(12)?;
    let height = r.read_bits(12)?;
    let asr = r.read_bits(4)? as usize;
    let frc = r.read_bits(4)? as usize;
    // The rate field counts units of 400 bit/s.
    let rate = r.read_bits(18)?;

    info.params = StreamParams::Video(VideoParams {
        frame_rate: FRAME_RATES[frc],
        width: (width + 15) & !15,
        height: (height + 15) & !15,
        aspect: ASPECT_RATIOS[asr],
        frames: 0,
    });
    info.bit_rate = rate * 400 / 1000;
    Ok(())
}
