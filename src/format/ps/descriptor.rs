//! Elementary stream descriptors, as found in program stream maps.
//!
//! Only the descriptors that carry parameters the stream table keeps
//! are interpreted; everything else is measured and skipped.

use log::warn;

use crate::av::{Fraction, StreamInfo, StreamParams};
use crate::codec::mpegvideo::{ASPECT_RATIOS, FRAME_RATES};
use crate::error::{MpegError, Result};

const VIDEO_STREAM: u8 = 2;
const AUDIO_STREAM: u8 = 3;
const TARGET_BACKGROUND_GRID: u8 = 7;
const ISO_639_LANGUAGE: u8 = 10;

/// Applies one descriptor to `info` and returns the bytes it occupied.
pub(crate) fn parse_descriptor(info: &mut StreamInfo, data: &[u8]) -> Result<usize> {
    if data.len() < 2 {
        return Err(MpegError::BadFormat(
            "descriptor shorter than its tag and length".into(),
        ));
    }
    let tag = data[0];
    let len = data[1] as usize;
    let body = data
        .get(2..2 + len)
        .ok_or_else(|| MpegError::BadFormat("descriptor body runs past the map".into()))?;

    match tag {
        VIDEO_STREAM => {
            if body.is_empty() {
                return Err(MpegError::BadFormat("empty video stream descriptor".into()));
            }
            match &mut info.params {
                StreamParams::Video(v) => {
                    v.frame_rate = FRAME_RATES[((body[0] >> 3) & 0x0F) as usize];
                }
                _ => warn!("video stream descriptor for non-video stream"),
            }
        }
        TARGET_BACKGROUND_GRID => {
            if body.len() < 4 {
                return Err(MpegError::BadFormat(
                    "short target background grid descriptor".into(),
                ));
            }
            let n = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
            match &mut info.params {
                StreamParams::Video(v) => {
                    v.width = (n >> 18) & 0x3FFF;
                    v.height = (n >> 4) & 0x3FFF;
                    let code = (n & 0x0F) as usize;
                    if code == 1 {
                        v.aspect = Fraction::new(v.width, v.height).reduced();
                    } else if !ASPECT_RATIOS[code].is_unset() {
                        v.aspect = ASPECT_RATIOS[code];
                    }
                }
                _ => warn!("target background grid descriptor for non-video stream"),
            }
        }
        // Recognized but carrying nothing the stream table keeps.
        AUDIO_STREAM | ISO_639_LANGUAGE => {}
        _ => {}
    }

    Ok(len + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::VideoParams;
    use pretty_assertions::assert_eq;

    fn video_info() -> StreamInfo {
        StreamInfo::new(
            0,
            0xE0,
            "video/mpeg2",
            StreamParams::Video(VideoParams::default()),
        )
    }

    #[test]
    fn video_descriptor_sets_frame_rate() {
        // Frame rate code 3 sits in bits 6..3 of the first body byte.
        let mut info = video_info();
        let used = parse_descriptor(&mut info, &[2, 2, 0x18, 0x48]).unwrap();
        assert_eq!(used, 4);
        assert_eq!(info.video().unwrap().frame_rate, Fraction::new(25, 1));
    }

    #[test]
    fn grid_descriptor_sets_dimensions_and_aspect() {
        // 704x576, aspect code 1: ratio comes from the grid itself.
        let n: u32 = (704 << 18) | (576 << 4) | 1;
        let mut body = vec![7, 4];
        body.extend_from_slice(&n.to_be_bytes());

        let mut info = video_info();
        parse_descriptor(&mut info, &body).unwrap();
        let v = info.video().unwrap();
        assert_eq!((v.width, v.height), (704, 576));
        assert_eq!(v.aspect, Fraction::new(11, 9));

        // Aspect code 3 maps through the table instead.
        let n: u32 = (1920 << 18) | (1080 << 4) | 3;
        let mut body = vec![7, 4];
        body.extend_from_slice(&n.to_be_bytes());
        parse_descriptor(&mut info, &body).unwrap();
        assert_eq!(info.video().unwrap().aspect, Fraction::new(16, 9));
    }

    #[test]
    fn video_descriptors_leave_audio_streams_alone() {
        let mut info = StreamInfo::new(1, 0xC0, "audio/mpeg", StreamParams::Multiplex);
        let used = parse_descriptor(&mut info, &[2, 2, 0x18, 0x48]).unwrap();
        assert_eq!(used, 4);
        assert_eq!(info.params, StreamParams::Multiplex);
    }

    #[test]
    fn unknown_descriptors_are_skipped_by_length() {
        let mut info = video_info();
        let before = info.clone();
        let used = parse_descriptor(&mut info, &[0x0A, 3, b'e', b'n', b'g', 0xFF]).unwrap();
        assert_eq!(used, 5);
        assert_eq!(info, before);

        let used = parse_descriptor(&mut info, &[0x99, 1, 0x00]).unwrap();
        assert_eq!(used, 3);
    }

    #[test]
    fn rejects_truncated_descriptors() {
        let mut info = video_info();
        assert!(parse_descriptor(&mut info, &[2]).is_err());
        assert!(parse_descriptor(&mut info, &[2, 6, 0x18]).is_err());
        assert!(parse_descriptor(&mut info, &[7, 2, 0x01, 0x02]).is_err());
    }
}
