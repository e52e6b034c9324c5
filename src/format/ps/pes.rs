//! PES packet framing.
//!
//! A program stream is a sequence of `00 00 01` start codes, each
//! followed by a stream id byte. Pack headers (id `0xBA`) wrap the
//! packet that follows them; everything else is a PES packet with a
//! 16-bit length and an id-dependent header layout. MPEG-2 headers
//! carry an explicit length byte; MPEG-1 headers are walked field by
//! field. Payloads of the two private stream ids open with a 4-byte
//! substream prefix that names the real stream.

use bytes::{BufMut, BytesMut};
use log::warn;

use crate::av::{is_audio_id, is_mpeg_video_id, is_private_id, Packet, PacketKind};
use crate::error::{MpegError, Result};
use crate::io::ByteSource;

use super::{PACK_HEADER, PROGRAM_END, SCAN_TRIES_NARROW, SCAN_TRIES_WIDE};

const STARTCODE_LEN: usize = 3;
const PES_BEGIN_LEN: usize = 6;

/// A parsed PES packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesHeader {
    /// Stream id; for private stream payloads this is the substream id.
    pub stream_id: u8,
    /// The `PES_packet_length` field.
    pub packet_len: u16,
    /// Bytes from the start code to the first payload byte.
    pub header_len: usize,
    /// Payload length implied by `packet_len` and `header_len`.
    pub payload_len: usize,
    /// Presentation timestamp in 90 kHz ticks.
    pub pts: Option<u64>,
    /// Decode timestamp in 90 kHz ticks.
    pub dts: Option<u64>,
}

fn truncated() -> MpegError {
    MpegError::BadFormat("PES header runs past the packet end".into())
}

/// Decodes the 33-bit timestamp layout shared by PTS and DTS fields:
/// 3 bits, then two 15-bit groups, each followed by a marker bit.
fn parse_timestamp(b: &[u8]) -> u64 {
    ((b[0] as u64 & 0x0E) << 29)
        | ((b[1] as u64) << 22)
        | ((b[2] as u64 & 0xFE) << 14)
        | ((b[3] as u64) << 7)
        | ((b[4] as u64) >> 1)
}

/// Scans forward to the next `00 00 01` start code, consuming at most
/// `tries` bytes. Returns how many garbage bytes preceded the code.
pub(crate) fn find_startcode<S: ByteSource>(src: &mut S, tries: usize) -> Result<usize> {
    let mut zeros = 0usize;
    let mut consumed = 0usize;

    while consumed < tries {
        let byte = src.read_u8()?;
        consumed += 1;
        if byte == 0x00 {
            zeros += 1;
        } else if byte == 0x01 && zeros >= 2 {
            let skipped = consumed - STARTCODE_LEN;
            if skipped > 0 {
                warn!("start code {skipped} bytes past the expected position");
            }
            return Ok(skipped);
        } else {
            zeros = 0;
        }
    }
    warn!("no start code within {tries} bytes");
    Err(MpegError::BadFormat("start code not found".into()))
}

/// Consumes a pack header whose `00 00 01 BA` prefix has already been
/// read and returns the captured bytes that followed the prefix.
///
/// The marker bits of the first byte tell the layouts apart: MPEG-2
/// packs carry eight field bytes, a stuffing length and that much
/// stuffing; MPEG-1 packs are a fixed seven field bytes.
fn read_pack_header<S: ByteSource>(src: &mut S) -> Result<Vec<u8>> {
    let marker = src.read_u8()?;
    let mut buf = Vec::with_capacity(18);
    buf.push(marker);

    if marker & 0xC0 == 0x40 {
        let mut fields = [0u8; 8];
        src.read_exact_buf(&mut fields)?;
        buf.extend_from_slice(&fields);
        let sl = src.read_u8()?;
        buf.push(sl);
        for _ in 0..(sl & 0x07) {
            buf.push(src.read_u8()?);
        }
    } else {
        let mut fields = [0u8; 7];
        src.read_exact_buf(&mut fields)?;
        buf.extend_from_slice(&fields);
    }
    Ok(buf)
}

/// Parses the header region of a PES packet. `data` must start at the
/// `00 00 01` prefix and hold the complete packet.
pub(crate) fn parse_pes_header(data: &[u8]) -> Result<PesHeader> {
    if data.len() < PES_BEGIN_LEN + 1 {
        return Err(truncated());
    }
    if data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
        return Err(MpegError::BadFormat("not at a PES packet boundary".into()));
    }

    let mut stream_id = data[3];
    let packet_len = u16::from_be_bytes([data[4], data[5]]);
    let mut pts = None;
    let mut dts = None;
    let mut pos = PES_BEGIN_LEN;

    let c = data[pos];
    if c & 0xC0 == 0x80 {
        // MPEG-2 header: flag bytes and an explicit length.
        if data.len() < 9 {
            return Err(truncated());
        }
        pos = data[8] as usize + 9;
        if data[7] & 0x80 != 0 {
            let ts = data.get(9..14).ok_or_else(truncated)?;
            pts = Some(parse_timestamp(ts));
        }
        if data[7] & 0x40 != 0 {
            let ts = data.get(14..19).ok_or_else(truncated)?;
            dts = Some(parse_timestamp(ts));
        }
    } else {
        // MPEG-1 header, walked field by field.
        let mut c = c;
        while c == 0xFF {
            pos += 1;
            c = *data.get(pos).ok_or_else(truncated)?;
        }
        if c & 0xC0 == 0x40 {
            // STD buffer size field.
            pos += 2;
            c = *data.get(pos).ok_or_else(truncated)?;
        }
        if c & 0xE0 == 0x20 {
            let ts = data.get(pos..pos + 5).ok_or_else(truncated)?;
            pts = Some(parse_timestamp(ts));
            pos += 4;
        }
        if c & 0xF0 == 0x30 {
            // A decode stamp follows the presentation stamp here; it
            // is skipped without decoding.
            pos += 5;
        }
        pos += 1;
    }

    let mut header_len = pos;
    if header_len > data.len() {
        return Err(truncated());
    }

    let mut payload_len = if packet_len > 0 {
        (packet_len as usize)
            .checked_sub(header_len - PES_BEGIN_LEN)
            .ok_or_else(|| MpegError::BadFormat("PES header longer than its packet".into()))?
    } else {
        0
    };

    if is_private_id(stream_id) {
        if payload_len < 4 || data.len() < header_len + 4 {
            return Err(MpegError::BadFormat(
                "private payload too short for a substream prefix".into(),
            ));
        }
        stream_id = data[header_len];
        header_len += 4;
        payload_len -= 4;
    }

    Ok(PesHeader {
        stream_id,
        packet_len,
        header_len,
        payload_len,
        pts,
        dts,
    })
}

/// Reads the next packet from `src`.
///
/// `Ok(None)` marks a clean end of the stream: end of input at a
/// packet boundary, or the program end code. A pack header preceding
/// the packet is consumed along the way and captured into the packet's
/// header region. With `deep_scan` set the start code scan tolerates
/// almost no garbage, which makes discovery passes fail fast on data
/// that is not a program stream.
pub fn read_pes_packet<S: ByteSource>(src: &mut S, deep_scan: bool) -> Result<Option<Packet>> {
    let tries = if deep_scan {
        SCAN_TRIES_NARROW
    } else {
        SCAN_TRIES_WIDE
    };

    match find_startcode(src, tries) {
        Ok(_) => {}
        Err(MpegError::EndOfStream) => return Ok(None),
        Err(e) => return Err(e),
    }
    let mut stream_id = src.read_u8()?;

    if stream_id == PROGRAM_END {
        return Ok(None);
    }

    let mut pack = Vec::new();
    if stream_id == PACK_HEADER {
        pack.extend_from_slice(&[0x00, 0x00, 0x01, PACK_HEADER]);
        pack.extend_from_slice(&read_pack_header(src)?);
        // The wrapped packet must open right after the pack header.
        find_startcode(src, STARTCODE_LEN)?;
        stream_id = src.read_u8()?;
    }

    let len_hi = src.read_u8()?;
    let len_lo = src.read_u8()?;
    let pes_len = u16::from_be_bytes([len_hi, len_lo]) as usize;

    let pack_len = pack.len();
    let mut buf = BytesMut::with_capacity(pack_len + PES_BEGIN_LEN + pes_len);
    buf.put_slice(&pack);
    buf.put_slice(&[0x00, 0x00, 0x01, stream_id, len_hi, len_lo]);
    let body_start = buf.len();
    buf.resize(body_start + pes_len, 0);
    src.read_exact_buf(&mut buf[body_start..])?;
    let buf = buf.freeze();

    if is_mpeg_video_id(stream_id) || is_audio_id(stream_id) || is_private_id(stream_id) {
        let hdr = parse_pes_header(&buf[pack_len..])?;
        let mut pkt = Packet::from_parts(
            PacketKind::Data,
            hdr.stream_id,
            buf,
            pack_len,
            pack_len + hdr.header_len,
        );
        pkt.pts = hdr.pts;
        pkt.dts = hdr.dts;
        Ok(Some(pkt))
    } else {
        // Control and multiplex packets keep their payload opaque.
        Ok(Some(Packet::from_parts(
            PacketKind::Data,
            stream_id,
            buf,
            pack_len,
            pack_len + PES_BEGIN_LEN,
        )))
    }
}

/// Encodes a 33-bit timestamp in the 5-byte PTS/DTS layout.
#[cfg(test)]
pub(crate) fn write_pts(buf: &mut BytesMut, marker: u8, ts: u64) {
    let ts = ts & 0x1_FFFF_FFFF;
    buf.put_u8(marker | ((ts >> 29) & 0x0E) as u8 | 0x01);
    buf.put_u16((((ts >> 14) & 0xFFFE) | 0x01) as u16);
    buf.put_u16((((ts << 1) & 0xFFFE) | 0x01) as u16);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::IoSource;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use std::io::Cursor;

    fn mem(data: &[u8]) -> IoSource<Cursor<Vec<u8>>> {
        IoSource::new(Cursor::new(data.to_vec()))
    }

    /// Builds an MPEG-2 style PES packet with optional timestamps.
    fn pes2_packet(id: u8, pts: Option<u64>, dts: Option<u64>, payload: &[u8]) -> Vec<u8> {
        let mut body = BytesMut::new();
        let mut flags = 0u8;
        if pts.is_some() {
            flags |= 0x80;
        }
        if dts.is_some() {
            flags |= 0x40;
        }
        let stamp_len = pts.map_or(0, |_| 5) + dts.map_or(0, |_| 5);
        body.put_u8(0x80);
        body.put_u8(flags);
        body.put_u8(stamp_len);
        if let Some(t) = pts {
            write_pts(&mut body, if dts.is_some() { 0x30 } else { 0x20 }, t);
        }
        if let Some(t) = dts {
            write_pts(&mut body, 0x10, t);
        }
        body.put_slice(payload);

        let mut out = vec![0x00, 0x00, 0x01, id];
        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn scanner_reports_skipped_bytes() {
        let mut src = mem(&[0xDE, 0xAD, 0x00, 0x00, 0x01, 0xE0]);
        assert_eq!(find_startcode(&mut src, 16).unwrap(), 2);
        assert_eq!(src.read_u8().unwrap(), 0xE0);

        let mut src = mem(&[0x00, 0x00, 0x01, 0xC0]);
        assert_eq!(find_startcode(&mut src, 16).unwrap(), 0);

        // A longer zero run still counts as a valid prefix.
        let mut src = mem(&[0x00, 0x00, 0x00, 0x00, 0x01, 0xC0]);
        assert_eq!(find_startcode(&mut src, 16).unwrap(), 2);
    }

    #[test]
    fn scanner_gives_up_at_its_byte_budget() {
        // All zeroes for longer than the budget: the scan must stop.
        let mut src = mem(&[0x00; 64]);
        let err = find_startcode(&mut src, 32).unwrap_err();
        assert!(matches!(err, MpegError::BadFormat(_)));

        let mut src = mem(&[0x55; 8]);
        assert!(find_startcode(&mut src, 8).is_err());
    }

    #[test]
    fn end_of_input_is_a_clean_end() {
        let mut src = mem(&[]);
        assert!(read_pes_packet(&mut src, false).unwrap().is_none());

        let mut src = mem(&[0x00, 0x00, 0x01, PROGRAM_END]);
        assert!(read_pes_packet(&mut src, false).unwrap().is_none());
    }

    #[test]
    fn parses_mpeg2_header_with_both_stamps() {
        let raw = pes2_packet(0xE0, Some(90_000), Some(87_000), b"frame");
        let hdr = parse_pes_header(&raw).unwrap();

        assert_eq!(hdr.stream_id, 0xE0);
        assert_eq!(hdr.pts, Some(90_000));
        assert_eq!(hdr.dts, Some(87_000));
        assert_eq!(hdr.header_len, 9 + 10);
        assert_eq!(hdr.payload_len, 5);
    }

    #[test]
    fn parses_mpeg1_header_variants() {
        // Stuffing, an STD buffer field, then a lone presentation stamp.
        let mut body = BytesMut::new();
        body.put_u8(0xFF);
        body.put_u8(0xFF);
        body.put_slice(&[0x40, 0x20]);
        write_pts(&mut body, 0x20, 54_321);
        body.put_slice(b"payload");
        let mut raw = vec![0x00, 0x00, 0x01, 0xC0];
        raw.extend_from_slice(&(body.len() as u16).to_be_bytes());
        raw.extend_from_slice(&body);

        let hdr = parse_pes_header(&raw).unwrap();
        assert_eq!(hdr.pts, Some(54_321));
        assert_eq!(hdr.dts, None);
        assert_eq!(hdr.header_len, 6 + 2 + 2 + 5);
        assert_eq!(hdr.payload_len, 7);

        // No stamps at all: a single 0x0F closes the header.
        let mut raw = vec![0x00, 0x00, 0x01, 0xC0, 0x00, 0x04, 0x0F];
        raw.extend_from_slice(b"abc");
        let hdr = parse_pes_header(&raw).unwrap();
        assert_eq!(hdr.pts, None);
        assert_eq!(hdr.header_len, 7);
        assert_eq!(hdr.payload_len, 3);
    }

    #[test]
    fn unwraps_private_substream_prefix() {
        // AC-3 substream 0x81 behind private stream 1: the payload
        // opens with the substream id and three framing bytes.
        let mut payload = vec![0x81, 0x01, 0x00, 0x02];
        payload.extend_from_slice(&[0x0B, 0x77, 0xAA]);
        let raw = pes2_packet(0xBD, Some(1234), None, &payload);

        let hdr = parse_pes_header(&raw).unwrap();
        assert_eq!(hdr.stream_id, 0x81);
        assert_eq!(hdr.header_len, 9 + 5 + 4);
        assert_eq!(hdr.payload_len, 3);
        assert_eq!(hdr.pts, Some(1234));
    }

    #[test]
    fn rejects_malformed_headers() {
        // Header length byte pointing past the packet.
        let raw = [0x00, 0x00, 0x01, 0xE0, 0x00, 0x03, 0x80, 0x00, 0xF0];
        assert!(parse_pes_header(&raw).is_err());

        // Length field smaller than the parsed header.
        let mut raw = pes2_packet(0xE0, Some(1), None, b"x");
        raw[5] = 0x02;
        assert!(parse_pes_header(&raw).is_err());

        // Private payload with no room for the substream prefix.
        let raw = pes2_packet(0xBD, None, None, &[0x81]);
        assert!(parse_pes_header(&raw).is_err());
    }

    #[test]
    fn reads_packet_behind_mpeg2_pack_header() {
        let mut data = vec![0x00, 0x00, 0x01, 0xBA];
        // Marker 01 in the top bits, 8 field bytes, stuffing length
        // 0xF9 (one stuffing byte), the stuffing itself.
        data.push(0x44);
        data.extend_from_slice(&[0x00, 0x04, 0x00, 0x04, 0x01, 0x00, 0x01, 0x89]);
        data.push(0xF9);
        data.push(0xFF);
        data.extend_from_slice(&pes2_packet(0xE0, Some(45_000), None, b"vid"));

        let mut src = mem(&data);
        let pkt = read_pes_packet(&mut src, true).unwrap().unwrap();

        assert_eq!(pkt.stream_id, 0xE0);
        assert_eq!(pkt.pts, Some(45_000));
        assert_eq!(pkt.pack_header().len(), 4 + 10 + 1);
        assert_eq!(pkt.data(), b"vid");
        // The header view spans the pack prefix and the PES header.
        assert_eq!(pkt.hdr_size(), 15 + 9 + 5);

        // Nothing left afterwards.
        assert!(read_pes_packet(&mut src, true).unwrap().is_none());
    }

    #[test]
    fn reads_packet_behind_mpeg1_pack_header() {
        let mut data = vec![0x00, 0x00, 0x01, 0xBA];
        // MPEG-1 pack: marker 0010 in the top bits, 8 bytes total.
        data.push(0x21);
        data.extend_from_slice(&[0x00, 0x01, 0x00, 0x01, 0x80, 0x1B, 0x81]);
        data.extend_from_slice(&pes2_packet(0xC0, None, None, b"aud"));

        let mut src = mem(&data);
        let pkt = read_pes_packet(&mut src, true).unwrap().unwrap();

        assert_eq!(pkt.stream_id, 0xC0);
        assert_eq!(pkt.pack_header().len(), 4 + 8);
        assert_eq!(pkt.data(), b"aud");
    }

    #[test]
    fn opaque_ids_keep_their_payload_unparsed() {
        // A padding packet: payload bytes start right after the length.
        let mut data = vec![0x00, 0x00, 0x01, 0xBE, 0x00, 0x04];
        data.extend_from_slice(&[0xFF; 4]);

        let mut src = mem(&data);
        let pkt = read_pes_packet(&mut src, false).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0xBE);
        assert_eq!(pkt.size(), 4);
        assert_eq!(pkt.hdr_size(), 6);
        assert_eq!(pkt.pts, None);
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut raw = pes2_packet(0xE0, Some(90_000), None, b"frame");
        raw.truncate(raw.len() - 3);
        let mut src = mem(&raw);
        assert!(read_pes_packet(&mut src, false).is_err());
    }

    #[test]
    fn payload_split_holds_at_size_extremes() {
        let raw = pes2_packet(0xE0, None, None, b"");
        let mut src = mem(&raw);
        let pkt = read_pes_packet(&mut src, false).unwrap().unwrap();
        assert_eq!(pkt.size(), 0);
        assert_eq!(pkt.hdr_size(), 9);
        assert!(pkt.data().is_empty());

        let raw = pes2_packet(0xE0, None, None, b"x");
        let mut src = mem(&raw);
        let pkt = read_pes_packet(&mut src, false).unwrap().unwrap();
        assert_eq!(pkt.size(), 1);
        assert_eq!(pkt.header().len(), 9);

        // The largest length the 16-bit field can declare.
        let payload = vec![0xAB; usize::from(u16::MAX) - 3];
        let raw = pes2_packet(0xE0, None, None, &payload);
        let mut src = mem(&raw);
        let pkt = read_pes_packet(&mut src, false).unwrap().unwrap();
        assert_eq!(pkt.size(), payload.len());
        assert_eq!(pkt.hdr_size(), 9);
        assert_eq!(pkt.data().last(), Some(&0xAB));
    }

    #[quickcheck]
    fn timestamp_layout_roundtrips(ts: u64) -> bool {
        let mut buf = BytesMut::new();
        write_pts(&mut buf, 0x20, ts);
        parse_timestamp(&buf) == ts & 0x1_FFFF_FFFF
    }
}
