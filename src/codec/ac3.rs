//! AC-3 audio parameter probing.

use crate::av::{AudioParams, StreamInfo, StreamParams};
use crate::error::{MpegError, Result};

/// Bitrates in kbit/s by `frmsizecod`. Codes come in pairs per rate,
/// one for each frame size variant.
const BITRATES: [u32; 38] = [
    32, 32, 40, 40, 48, 48, 56, 56, 64, 64, 80, 80, 96, 96, 112, 122, 128, 128, 160, 160, 192,
    192, 224, 244, 256, 256, 320, 320, 384, 384, 448, 448, 512, 512, 576, 576, 640, 640,
];

/// Channel counts by `acmod`.
const CHANNELS: [u32; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// Sample rates in Hz by `fscod`; code 3 is reserved.
const FREQUENCIES: [u32; 4] = [48000, 44100, 32000, 0];

const SYNCWORD: [u8; 2] = [0x0B, 0x77];
// Syncword, CRC, fscod/frmsizecod, bsid/bsmod, then the acmod byte.
const MIN_HEADER_LEN: usize = 7;

/// Parses a syncframe at the start of `data` and fills in the audio
/// parameters and bit rate.
pub fn probe(info: &mut StreamInfo, data: &[u8]) -> Result<()> {
    if data.len() < MIN_HEADER_LEN {
        return Err(MpegError::ProbeFailed(
            "not enough data for an AC-3 syncframe".into(),
        ));
    }
    if data[..2] != SYNCWORD {
        return Err(MpegError::ProbeFailed(
            "no AC-3 syncword at payload start".into(),
        ));
    }

    // Two CRC bytes sit between the syncword and the rate fields.
    let freq_idx = (data[4] >> 6) as usize;
    let br_idx = (data[4] & 0x3F) as usize;
    let acmod = (data[6] >> 5) as usize;

    info.bit_rate = if br_idx < BITRATES.len() {
        BITRATES[br_idx]
    } else {
        0
    };
    info.params = StreamParams::Audio(AudioParams {
        sample_rate: FREQUENCIES[freq_idx],
        channels: CHANNELS[acmod],
        samples: 0,
        block_align: 0,
        sample_size: super::DEFAULT_SAMPLE_SIZE,
    });
    Ok(())
}
