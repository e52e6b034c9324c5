#[cfg(test)]
mod tests {
    use mpegio::av::{PacketKind, StreamKind, StreamSelect, PRIVATE1_ID};
    use mpegio::format::{Mpeg, MpegKind, OpenOptions};
    use mpegio::io::{FileSource, IoSource};
    use std::fs;
    use std::io::Cursor;

    const MEGABYTE: usize = 1 << 20;

    /// An MPEG-1 video sequence header for a 720x576 PAL stream.
    const VIDEO_SEQ: [u8; 11] = [
        0x00, 0x00, 0x01, 0xB3, 0x2D, 0x02, 0x40, 0x23, 0x17, 0xED, 0x20,
    ];
    /// An MPEG audio frame header, layer II at 224 kbit/s.
    const AUDIO_HDR: [u8; 4] = [0xFF, 0xFD, 0xB0, 0x04];
    /// The start of an AC-3 sync frame at 384 kbit/s.
    const AC3_FRAME: [u8; 7] = [0x0B, 0x77, 0x1A, 0x2C, 0x1C, 0x40, 0xE0];

    fn mem(data: Vec<u8>) -> IoSource<Cursor<Vec<u8>>> {
        IoSource::new(Cursor::new(data))
    }

    /// Encodes a 33-bit timestamp in the 5-byte PTS/DTS wire layout.
    fn put_pts(buf: &mut Vec<u8>, marker: u8, ts: u64) {
        let ts = ts & 0x1_FFFF_FFFF;
        buf.push(marker | ((ts >> 29) & 0x0E) as u8 | 0x01);
        buf.extend_from_slice(&((((ts >> 14) & 0xFFFE) | 0x01) as u16).to_be_bytes());
        buf.extend_from_slice(&((((ts << 1) & 0xFFFE) | 0x01) as u16).to_be_bytes());
    }

    /// One MPEG-2 style PES packet, optionally stamped.
    fn pes2(id: u8, pts: Option<u64>, payload: &[u8]) -> Vec<u8> {
        let hlen: u8 = if pts.is_some() { 5 } else { 0 };
        let mut buf = vec![0x00, 0x00, 0x01, id];
        buf.extend_from_slice(&(3 + u16::from(hlen) + payload.len() as u16).to_be_bytes());
        buf.push(0x80);
        buf.push(if pts.is_some() { 0x80 } else { 0x00 });
        buf.push(hlen);
        if let Some(ts) = pts {
            put_pts(&mut buf, 0x20, ts);
        }
        buf.extend_from_slice(payload);
        buf
    }

    /// A packet of an id whose payload stays unparsed, e.g. padding.
    fn raw_pes(id: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x00, 0x00, 0x01, id];
        buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    /// A private stream 1 packet carrying sub-stream `sub`.
    fn private_pes(sub: u8, pts: Option<u64>, body: &[u8]) -> Vec<u8> {
        let mut payload = vec![sub, 0x01, 0x00, 0x02];
        payload.extend_from_slice(body);
        pes2(0xBD, pts, &payload)
    }

    /// An MPEG-2 pack header with no stuffing, 14 bytes.
    fn mpeg2_pack() -> Vec<u8> {
        let mut buf = vec![0x00, 0x00, 0x01, 0xBA, 0x44];
        buf.extend_from_slice(&[0x00, 0x04, 0x00, 0x04, 0x01, 0x00, 0x01, 0x89]);
        buf.push(0xF8);
        buf
    }

    /// A small DVD-flavored multiplex: packed video, MPEG audio and an
    /// AC-3 sub-stream, a padding packet, and a program end code.
    fn dvd_mux() -> Vec<u8> {
        let mut data = mpeg2_pack();
        data.extend(pes2(0xE0, Some(90_000), &VIDEO_SEQ));
        data.extend(mpeg2_pack());
        data.extend(pes2(0xC0, Some(90_900), &AUDIO_HDR));
        data.extend(mpeg2_pack());
        data.extend(private_pes(0x80, Some(91_800), &AC3_FRAME));
        data.extend(raw_pes(0xBE, &[0xFF; 16]));
        data.extend(pes2(0xE0, None, b"second-frame"));
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0xB9]);
        data
    }

    #[test]
    fn demux_a_packed_program_stream() {
        let mut mpeg = Mpeg::open(MpegKind::Any, mem(dvd_mux()), &OpenOptions::default())
            .expect("open should autodetect the program stream");

        assert_eq!(mpeg.kind(), MpegKind::Ps);
        assert_eq!(mpeg.stream_count(), 3);

        let video = mpeg.stream_info(0).unwrap();
        assert_eq!(video.codec, "video/mpeg");
        assert_eq!(video.stream_id, 0xE0);
        assert_eq!(video.kind(), StreamKind::Video);
        assert_eq!(video.start_time, 90_000);
        assert_eq!(video.bit_rate, 9_800);
        let params = video.video().unwrap();
        assert_eq!(params.width, 720);
        assert_eq!(params.height, 576);

        let audio = mpeg.stream_info(1).unwrap();
        assert_eq!(audio.codec, "audio/mpeg");
        assert_eq!(audio.stream_id, 0xC0);
        assert_eq!(audio.bit_rate, 224);

        let ac3 = mpeg.stream_info(2).unwrap();
        assert_eq!(ac3.codec, "audio/ac3");
        assert_eq!(ac3.stream_id, 0x80);
        assert_eq!(ac3.bit_rate, 384);
        assert_eq!(ac3.audio().unwrap().channels, 5);

        // The probe rewound the source, so reads start at the first
        // packet. The pack header travels with it.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.kind, PacketKind::Data);
        assert_eq!(pkt.stream_id, 0xE0);
        assert_eq!(pkt.pts, Some(90_000));
        assert_eq!(pkt.data(), &VIDEO_SEQ[..]);
        assert_eq!(pkt.pack_header().len(), 14);
        assert_eq!(pkt.hdr_size(), 14 + 9 + 5);

        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0xC0);
        assert_eq!(pkt.pts, Some(90_900));
        assert_eq!(pkt.data(), &AUDIO_HDR[..]);

        // AC-3 payloads lose 4 sub-header bytes on the read path.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0x80);
        assert_eq!(pkt.pts, Some(91_800));
        assert_eq!(pkt.data(), &AC3_FRAME[4..]);

        // Padding is dropped; the unstamped video packet follows.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0xE0);
        assert_eq!(pkt.pts, None);
        assert_eq!(pkt.data(), b"second-frame");

        // The program end code closes the stream cleanly.
        assert!(mpeg.read_packet(StreamSelect::Any).unwrap().is_none());
        assert_eq!(mpeg.last_error(), None);
        assert_eq!(mpeg.duration(), None);
    }

    #[test]
    fn filtered_reads_serve_one_stream() {
        let mut mpeg =
            Mpeg::open(MpegKind::Ps, mem(dvd_mux()), &OpenOptions::default()).unwrap();

        // Non-matching packets are consumed along the way.
        let pkt = mpeg.read_packet(StreamSelect::Id(0xC0)).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0xC0);
        assert_eq!(pkt.data(), &AUDIO_HDR[..]);

        assert!(mpeg.read_packet(StreamSelect::Id(0xC0)).unwrap().is_none());
    }

    #[test]
    fn autodetect_classifies_a_raw_ac3_stream() {
        let mut data = AC3_FRAME.to_vec();
        data.resize(4_096, 0);
        let mut mpeg = Mpeg::open(MpegKind::Any, mem(data), &OpenOptions::default())
            .expect("open should fall back to the elementary stream layout");

        assert_eq!(mpeg.kind(), MpegKind::Es);
        assert_eq!(mpeg.stream_count(), 1);
        let info = mpeg.stream_info(0).unwrap();
        assert_eq!(info.codec, "audio/ac3");
        assert_eq!(info.stream_id, PRIVATE1_ID);
        assert_eq!(info.bit_rate, 384);

        // Raw chunks from the rewound source, a selector means nothing.
        let mut total = 0usize;
        let mut chunks = 0usize;
        while let Some(pkt) = mpeg.read_packet(StreamSelect::Any).unwrap() {
            if chunks == 0 {
                assert_eq!(&pkt.data()[..2], &[0x0B, 0x77]);
            }
            assert_eq!(pkt.stream_id, PRIVATE1_ID);
            total += pkt.size();
            chunks += 1;
        }
        assert_eq!(total, 4_096);
        assert_eq!(chunks, 4);
    }

    #[test]
    fn file_backed_source_estimates_duration() {
        let mut image = pes2(0xE0, Some(9_000), &VIDEO_SEQ);
        // A tail of exactly one megabyte that opens with the last
        // stamped packet, so the end scan lands on a packet boundary.
        let mut tail = pes2(0xE0, Some(909_000), &[0u8; 64]);
        while tail.len() + 32_009 < MEGABYTE {
            tail.extend(pes2(0xE0, None, &[0u8; 32_000]));
        }
        let pad = MEGABYTE - tail.len() - 9;
        tail.extend(pes2(0xE0, None, &vec![0u8; pad]));
        assert_eq!(tail.len(), MEGABYTE);
        image.extend(tail);

        let path = std::env::temp_dir().join(format!("mpegio-demux-{}.mpg", std::process::id()));
        fs::write(&path, &image).unwrap();

        let src = FileSource::open(&path).unwrap();
        let mut mpeg = Mpeg::open(MpegKind::Ps, src, &OpenOptions::default()).unwrap();

        assert_eq!(mpeg.stream_count(), 1);
        assert_eq!(mpeg.stream_info(0).unwrap().codec, "video/mpeg");
        // 900_000 ticks at 90 kHz, reported on the 27 MHz clock.
        assert_eq!(mpeg.duration(), Some(270_000_000));

        // Packet reads start back at the head of the file.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.pts, Some(9_000));

        drop(mpeg.close());
        fs::remove_file(&path).unwrap();
    }
}
