//! Program stream demultiplexer.
//!
//! A [`PsDemuxer`] pulls PES packets off a byte source, learns which
//! elementary streams the multiplex carries (either by statistical
//! probing or by reading the program stream map), and then serves
//! per-stream packet reads with the per-category payload fixups DVD
//! sources need. Packets whose id was never registered are dropped,
//! so a probe pass has to run before general reading is useful.

use std::io::SeekFrom;

use log::{debug, info, warn};

use crate::av::{
    is_ac3_id, is_dts_id, is_lpcm_id, is_mpeg_audio_id, is_mpeg_video_id, is_spu_id, AudioParams,
    Packet, PacketKind, StreamInfo, StreamKind, StreamParams, StreamSelect, VideoParams,
    AC3_ID_BASE, AUDIO_ID_BASE, DTS_ID_BASE, LPCM_ID_BASE, SPU_ID_BASE, VIDEO_ID_BASE,
};
use crate::codec::{by_codec_name, by_stream_type};
use crate::error::{MpegError, Result};
use crate::format::ps::descriptor::parse_descriptor;
use crate::format::ps::events::DvdEvent;
use crate::format::ps::pes::read_pes_packet;
use crate::format::ps::{DVD_PES_ID, PROBE_PACKETS_MAX, PROGRAM_STREAM_MAP, STREAM_BASE_CAPACITY};
use crate::format::{Demuxer, OpenOptions, StreamTableStrategy};
use crate::io::ByteSource;

const MEGABYTE: u64 = 1 << 20;

/// Demultiplexer for MPEG-1 and MPEG-2 program streams.
///
/// Construction never touches the source; call [`Demuxer::probe`] to
/// populate the stream table, then [`Demuxer::read_packet`] to pull
/// data. When used through [`Mpeg`](crate::format::Mpeg) the probe and
/// the seek bookkeeping around it happen automatically.
#[derive(Debug)]
pub struct PsDemuxer<S> {
    src: S,
    streams: Vec<StreamInfo>,
    /// Wire stream id to discovery index.
    imap: [Option<usize>; 256],
    /// Discovery index to wire stream id.
    map: Vec<u8>,
    /// Consumer-facing index to discovery index.
    smap: Vec<usize>,
    rate: u64,
    pts_offset: i64,
    duration: Option<u64>,
    tc_order: bool,
    strategy: StreamTableStrategy,
}

impl<S: ByteSource> PsDemuxer<S> {
    /// Wraps `src` with the given options. No I/O happens here.
    pub fn new(src: S, opts: &OpenOptions) -> Self {
        PsDemuxer {
            src,
            streams: Vec::with_capacity(STREAM_BASE_CAPACITY),
            imap: [None; 256],
            map: Vec::new(),
            smap: Vec::new(),
            rate: 0,
            pts_offset: 0,
            duration: None,
            tc_order: opts.tc_order,
            strategy: opts.stream_table,
        }
    }

    /// Estimated total duration in 27 MHz ticks, when one could be
    /// computed (seekable source larger than a megabyte).
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Rough multiplex byte rate, refined as packets are read.
    pub fn byte_rate(&self) -> u64 {
        self.rate
    }

    /// The underlying byte source, e.g. for repositioning between the
    /// probe pass and packet reads when driving the backend directly.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.src
    }

    /// Consumes the demuxer and hands the byte source back.
    pub fn into_source(self) -> S {
        self.src
    }

    /// Registers every recognizable stream seen in the probe window.
    fn probe_streams(&mut self) -> Result<()> {
        info!("MPEG-PS: probing each stream individually");

        let mut probed = 0usize;
        let mut unknown = 0usize;
        for _ in 0..PROBE_PACKETS_MAX {
            let pes = match read_pes_packet(&mut self.src, true) {
                Ok(Some(p)) => p,
                Ok(None) | Err(_) => break,
            };
            let id = pes.stream_id;

            if !(is_mpeg_video_id(id)
                || is_mpeg_audio_id(id)
                || is_ac3_id(id)
                || is_lpcm_id(id))
            {
                unknown += 1;
                continue;
            }
            if self.imap[id as usize].is_some() {
                continue;
            }

            let (codec, params) = if is_mpeg_video_id(id) {
                ("video/mpeg", StreamParams::Video(VideoParams::default()))
            } else if is_mpeg_audio_id(id) {
                ("audio/mpeg", StreamParams::Audio(AudioParams::default()))
            } else if is_ac3_id(id) {
                ("audio/ac3", StreamParams::Audio(AudioParams::default()))
            } else {
                ("audio/lpcm", StreamParams::Audio(AudioParams::default()))
            };

            let index = self.streams.len();
            let mut info = StreamInfo::new(index, id, codec, params);
            info.start_time = pes.pts.unwrap_or(0);

            // A failed probe leaves the defaults; the registration stands.
            if let Some(st) = by_codec_name(codec) {
                if let Err(e) = (st.probe)(&mut info, pes.data()) {
                    debug!("MPEG-PS: stream 0x{id:02X} probe failed: {e}");
                }
            }

            self.imap[id as usize] = Some(index);
            self.map.push(id);
            self.streams.push(info);
            probed += 1;
        }

        info!("MPEG-PS: found {unknown} packets of unknown streams");

        if probed == 0 {
            warn!("MPEG-PS: unable to find any known stream in this file");
            return Err(MpegError::ProbeFailed(
                "no recognizable stream within the probe window".into(),
            ));
        }
        Ok(())
    }

    /// Builds the stream table from a program stream map packet.
    fn parse_stream_map(&mut self) -> Result<()> {
        info!("MPEG-PS: looking for a program stream map");

        for n in 0..PROBE_PACKETS_MAX {
            let pes = match read_pes_packet(&mut self.src, true) {
                Ok(Some(p)) => p,
                Ok(None) | Err(_) => break,
            };
            if pes.stream_id != PROGRAM_STREAM_MAP {
                continue;
            }
            self.walk_stream_map(pes.data())?;
            info!("MPEG-PS: program stream map found at packet {n}");
            return Ok(());
        }

        warn!("MPEG-PS: no program stream map within the probe window, giving up");
        Err(MpegError::ProbeFailed(
            "program stream map not found".into(),
        ))
    }

    fn walk_stream_map(&mut self, data: &[u8]) -> Result<()> {
        fn short() -> MpegError {
            MpegError::BadFormat("program stream map truncated".into())
        }

        // Two indicator bytes, then the program-level info block.
        let info_len = data
            .get(2..4)
            .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
            .ok_or_else(short)?;
        let pos = 4 + info_len;
        let map_len = data
            .get(pos..pos + 2)
            .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
            .ok_or_else(short)?;
        let mut entries = data.get(pos + 2..pos + 2 + map_len).ok_or_else(short)?;

        // Synthesized ids count up from each category's base.
        let mut counters = [0u8; 256];
        while !entries.is_empty() {
            if entries.len() < 4 {
                return Err(short());
            }
            let stype = entries[0];
            let wire_id = entries[1];
            let desc_len = usize::from(u16::from_be_bytes([entries[2], entries[3]]));
            let descriptors = entries.get(4..4 + desc_len).ok_or_else(short)?;
            entries = &entries[4 + desc_len..];

            let st = match by_stream_type(stype) {
                Some(st) => st,
                None => {
                    debug!("MPEG-PS: map entry with unknown stream type 0x{stype:02X}");
                    continue;
                }
            };

            let params = match st.kind {
                StreamKind::Video => StreamParams::Video(VideoParams::default()),
                StreamKind::Audio => StreamParams::Audio(AudioParams::default()),
                StreamKind::Multiplex => StreamParams::Multiplex,
            };
            let index = self.streams.len();
            let seq = counters[usize::from(st.id_base)];
            let assigned = match st.id_base.checked_add(seq) {
                Some(id) => id,
                None => {
                    warn!(
                        "MPEG-PS: map exhausts the 0x{:02X} id range, dropping a type 0x{stype:02X} entry",
                        st.id_base
                    );
                    continue;
                }
            };
            counters[usize::from(st.id_base)] = seq.saturating_add(1);

            let mut info = StreamInfo::new(index, assigned, st.codec, params);
            let mut off = 0;
            while off < descriptors.len() {
                off += parse_descriptor(&mut info, &descriptors[off..])?;
            }

            self.imap[wire_id as usize] = Some(index);
            self.map.push(wire_id);
            self.streams.push(info);
        }
        Ok(())
    }

    /// Scans forward for the next packet carrying a PTS.
    fn next_timestamp(&mut self) -> Option<u64> {
        for _ in 0..PROBE_PACKETS_MAX * 2 {
            match read_pes_packet(&mut self.src, false) {
                Ok(Some(pes)) => {
                    if let Some(pts) = pes.pts {
                        return Some(pts);
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }
        None
    }

    fn compute_duration(&mut self) -> Result<()> {
        if self.src.is_streamed() {
            return Ok(());
        }
        let total = match self.src.size() {
            Some(n) if n > MEGABYTE => n,
            _ => return Ok(()),
        };
        debug!("MPEG-PS: determining stream length over {total} bytes");

        self.src.seek(SeekFrom::Start(0))?;
        let first = self.next_timestamp();
        let first_pos = self.src.tell()?;

        self.src.seek(SeekFrom::End(-(MEGABYTE as i64)))?;
        let mut last = None;
        while let Some(ts) = self.next_timestamp() {
            last = Some(ts);
        }
        let last_pos = self.src.tell()?;

        match (first, last) {
            (Some(s), Some(e)) if e > s => {
                let dt = e - s;
                let dp = last_pos.saturating_sub(first_pos);
                self.rate = dp * 90 / dt;
                self.duration = Some(300 * dt);
                debug!(
                    "MPEG-PS: timestamps {s}..{e} over {dp} bytes, rate {} b/s",
                    self.rate
                );
                Ok(())
            }
            _ => Err(MpegError::BadFormat(
                "no usable timestamp pair for duration estimation".into(),
            )),
        }
    }

    /// Rebuilds `smap`, optionally in the fixed category order
    /// video, MPEG audio, AC-3, LPCM, DTS, SPU.
    fn build_stream_map(&mut self) {
        self.smap = (0..self.streams.len()).collect();
        if !self.tc_order {
            return;
        }

        let categories: [(fn(u8) -> bool, u8); 6] = [
            (is_mpeg_video_id, VIDEO_ID_BASE),
            (is_mpeg_audio_id, AUDIO_ID_BASE),
            (is_ac3_id, AC3_ID_BASE),
            (is_lpcm_id, LPCM_ID_BASE),
            (is_dts_id, DTS_ID_BASE),
            (is_spu_id, SPU_ID_BASE),
        ];

        let mut base = 0usize;
        for (in_category, id_base) in categories {
            let mut count = 0usize;
            for (i, stream) in self.streams.iter().enumerate() {
                if !in_category(stream.stream_id) {
                    continue;
                }
                let slot = base + usize::from(stream.stream_id - id_base);
                match self.smap.get_mut(slot) {
                    Some(s) => *s = i,
                    None => warn!(
                        "MPEG-PS: stream 0x{:02X} falls outside the ordered map, keeping its discovery slot",
                        stream.stream_id
                    ),
                }
                count += 1;
            }
            base += count;
        }
    }

    /// Routes the primary audio slot to a new sub-stream id.
    fn rebind_audio(&mut self, id: u8) {
        if self.map.len() <= 1 {
            warn!("MPEG-PS: audio switch to 0x{id:02X} with no audio slot to rebind");
            return;
        }
        let old = self.map[1];
        self.imap[old as usize] = None;
        self.imap[id as usize] = Some(1);
        self.map[1] = id;
    }
}

impl<S: ByteSource> Demuxer for PsDemuxer<S> {
    fn probe(&mut self) -> Result<()> {
        let res = match self.strategy {
            StreamTableStrategy::Probe => self.probe_streams(),
            StreamTableStrategy::ParseMap => self.parse_stream_map(),
            StreamTableStrategy::MapThenProbe => match self.parse_stream_map() {
                Err(MpegError::ProbeFailed(_)) => {
                    info!("MPEG-PS: no program stream map, probing instead");
                    self.src.seek(SeekFrom::Start(0))?;
                    self.probe_streams()
                }
                other => other,
            },
        };
        if let Err(e) = self.compute_duration() {
            debug!("MPEG-PS: duration estimation failed: {e}");
        }
        self.build_stream_map();
        res
    }

    fn read_packet(&mut self, select: StreamSelect) -> Result<Option<Packet>> {
        loop {
            let mut pkt = match read_pes_packet(&mut self.src, false)? {
                Some(p) => p,
                None => return Ok(None),
            };

            let sx = self.imap[pkt.stream_id as usize];

            if is_ac3_id(pkt.stream_id) || is_dts_id(pkt.stream_id) {
                // Another 4 bytes of private sub-header follow the
                // sub-stream prefix the PES parser already removed.
                pkt.trim_front(4);
            } else if is_lpcm_id(pkt.stream_id) {
                let aup = pkt
                    .data()
                    .get(2..4)
                    .map(|b| u64::from(u16::from_be_bytes([b[0], b[1]])))
                    .unwrap_or(0);
                pkt.trim_front(7);
                if let (Some(pts), Some(sx)) = (pkt.pts, sx) {
                    let bit_rate = u64::from(self.streams[sx].bit_rate);
                    if bit_rate > 0 {
                        pkt.pts = Some(pts.saturating_sub(27_000_000 * aup / bit_rate));
                    }
                }
            } else if is_spu_id(pkt.stream_id) {
                pkt.trim_front(1);
            } else if pkt.stream_id == DVD_PES_ID {
                match DvdEvent::parse(pkt.data()) {
                    Some(DvdEvent::PtsSkip(ticks)) => self.pts_offset = ticks,
                    Some(DvdEvent::Flush(target)) => match u8::try_from(target) {
                        Ok(target) => {
                            pkt.kind = PacketKind::Flush;
                            pkt.stream_id = target;
                            return Ok(Some(pkt));
                        }
                        Err(_) => {
                            warn!("MPEG-PS: flush event names no real stream (0x{target:X}), dropping it");
                        }
                    },
                    Some(DvdEvent::Still) => {
                        pkt.kind = PacketKind::Still;
                        return Ok(Some(pkt));
                    }
                    Some(DvdEvent::AudioId(id)) => match u8::try_from(id) {
                        Ok(id) => self.rebind_audio(id),
                        Err(_) => {
                            warn!("MPEG-PS: audio switch names no real stream (0x{id:X}), dropping it");
                        }
                    },
                    None => {}
                }
                continue;
            }

            if sx.is_none() || !select.matches(pkt.stream_id) {
                continue;
            }

            if let Some(pts) = pkt.pts {
                // A skip past the stream start floors at zero.
                let pts = pts.saturating_add_signed(self.pts_offset);
                pkt.pts = Some(pts);
                if let Some(dts) = pkt.dts {
                    pkt.dts = Some(dts.saturating_add_signed(self.pts_offset));
                }
                if pts > 0 {
                    if let Ok(pos) = self.src.tell() {
                        self.rate = pos * 90 / pts;
                    }
                }
            }

            return Ok(Some(pkt));
        }
    }

    fn stream_count(&self) -> usize {
        self.streams.len()
    }

    fn stream_info(&self, n: usize) -> Option<&StreamInfo> {
        self.streams.get(*self.smap.get(n)?)
    }
}
