//! MPEG audio (layers I to III) parameter probing.

use crate::av::{AudioParams, StreamInfo, StreamParams};
use crate::error::{MpegError, Result};

/// Bitrates in kbit/s, indexed by `bitrate_index` and layer. Row 0 is
/// free format, row 15 is forbidden and never looked up.
const BITRATES: [[u32; 3]; 15] = [
    [0, 0, 0],
    [32, 32, 32],
    [64, 48, 40],
    [92, 56, 48],
    [128, 64, 56],
    [160, 80, 64],
    [192, 96, 80],
    [224, 112, 96],
    [256, 128, 112],
    [288, 160, 128],
    [320, 192, 160],
    [352, 224, 192],
    [384, 256, 224],
    [416, 320, 256],
    [448, 384, 320],
];

/// Sample rates in Hz by `sampling_frequency`; index 3 is reserved.
const FREQUENCIES: [u32; 4] = [44100, 48000, 32000, 0];

/// Layer numbers by the 2-bit layer field; 0 marks the reserved code.
const LAYERS: [u8; 4] = [0, 3, 2, 1];

const MIN_HEADER_LEN: usize = 4;

/// Parses a frame header at the start of `data` and fills in the audio
/// parameters and bit rate.
pub fn probe(info: &mut StreamInfo, data: &[u8]) -> Result<()> {
    if data.len() < MIN_HEADER_LEN {
        return Err(MpegError::ProbeFailed(
            "not enough data for an audio frame header".into(),
        ));
    }
    // The syncword is 12 set bits.
    if data[0] != 0xFF || data[1] & 0xF0 != 0xF0 {
        return Err(MpegError::ProbeFailed(
            "no audio syncword at payload start".into(),
        ));
    }

    let layer = LAYERS[((data[1] & 0x06) >> 1) as usize];
    if layer == 0 {
        return Err(MpegError::ProbeFailed("reserved layer code".into()));
    }
    let br_idx = (data[2] >> 4) as usize;
    if br_idx >= BITRATES.len() {
        return Err(MpegError::ProbeFailed("forbidden bitrate index".into()));
    }
    let freq_idx = ((data[2] & 0x0C) >> 2) as usize;
    let mode = (data[3] & 0xC0) >> 6;

    info.bit_rate = BITRATES[br_idx][(layer - 1) as usize];
    info.params = StreamParams::Audio(AudioParams {
        sample_rate: FREQUENCIES[freq_idx],
        channels: if mode == 3 { 1 } else { 2 },
        samples: 0,
        block_align: 0,
        sample_size: super::DEFAULT_SAMPLE_SIZE,
    });
    Ok(())
}
