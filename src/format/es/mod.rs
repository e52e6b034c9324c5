//! Elementary stream pseudo-demultiplexer.
//!
//! Wraps a raw, single-stream byte source such as a bare `.m1v` or
//! `.mp2` file. Probing reads one fixed lookahead window and asks
//! every registered stream type to recognize it; reading returns raw
//! fixed-size chunks, since an elementary stream has no packet
//! framing of its own.

use log::warn;

use crate::av::{Packet, StreamInfo, StreamParams, StreamSelect};
use crate::codec::STREAM_TYPES;
use crate::error::{MpegError, Result};
use crate::format::Demuxer;
use crate::io::ByteSource;

/// Bytes handed to each probing routine.
const ES_PROBE_LEN: usize = 256;
/// Chunk size served by `read_packet`.
const ES_PKT_SIZE: usize = 1024;

/// Demultiplexer, in name only, for a raw elementary stream.
///
/// There is always exactly one stream; its descriptor starts blank
/// and is filled by [`Demuxer::probe`].
#[derive(Debug)]
pub struct EsDemuxer<S> {
    src: S,
    stream: StreamInfo,
}

impl<S: ByteSource> EsDemuxer<S> {
    /// Wraps `src`. No I/O happens here.
    pub fn new(src: S) -> Self {
        EsDemuxer {
            src,
            stream: StreamInfo::new(0, 0, "unknown", StreamParams::Multiplex),
        }
    }

    /// The underlying byte source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.src
    }

    /// Consumes the demuxer and hands the byte source back.
    pub fn into_source(self) -> S {
        self.src
    }
}

impl<S: ByteSource> Demuxer for EsDemuxer<S> {
    fn probe(&mut self) -> Result<()> {
        let mut window = [0u8; ES_PROBE_LEN];
        self.src.read_exact_buf(&mut window)?;

        for st in STREAM_TYPES.iter() {
            if (st.probe)(&mut self.stream, &window).is_ok() {
                self.stream.stream_id = st.id_base;
                self.stream.codec = st.codec;
                return Ok(());
            }
        }

        warn!("MPEG-ES: unknown file type, is this really an elementary stream?");
        Err(MpegError::BadFormat(
            "no probe recognizes this elementary stream".into(),
        ))
    }

    fn read_packet(&mut self, _select: StreamSelect) -> Result<Option<Packet>> {
        let mut buf = vec![0u8; ES_PKT_SIZE];
        let n = self.src.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(Packet::new(buf).with_stream_id(self.stream.stream_id)))
    }

    fn stream_count(&self) -> usize {
        1
    }

    fn stream_info(&self, n: usize) -> Option<&StreamInfo> {
        if n == 0 {
            Some(&self.stream)
        } else {
            None
        }
    }
}
