//! # Container Formats
//!
//! This module holds the two container backends and the front door
//! that picks between them:
//!
//! - [`ps`]: MPEG-1 system stream / MPEG-2 program stream demuxer
//! - [`es`]: raw elementary stream pseudo-demuxer
//! - [`Mpeg`]: the dispatching container, with autodetection
//!
//! Backends implement the [`Demuxer`] trait and can be driven directly
//! when the caller already knows the layout and wants to manage seek
//! positions itself. [`Mpeg::open`] is the usual entry point: it picks
//! the backend, runs stream discovery, and restores the source
//! position afterwards so packet reads start from the beginning.
//!
//! ## Example
//!
//! ```rust
//! use mpegio::av::StreamSelect;
//! use mpegio::format::{Mpeg, MpegKind, OpenOptions};
//! use mpegio::io::IoSource;
//! use std::io::Cursor;
//!
//! # fn main() -> mpegio::Result<()> {
//! // A lone program end code: a well formed, empty program stream.
//! let src = IoSource::new(Cursor::new(vec![0x00, 0x00, 0x01, 0xB9]));
//! let opts = OpenOptions {
//!     probe: false,
//!     ..OpenOptions::default()
//! };
//! let mut mpeg = Mpeg::open(MpegKind::Ps, src, &opts)?;
//! assert_eq!(mpeg.stream_count(), 0);
//! assert!(mpeg.read_packet(StreamSelect::Any)?.is_none());
//! # Ok(())
//! # }
//! ```

use std::cell::Cell;
use std::io::SeekFrom;

use log::{error, info};

use crate::av::{Packet, StreamInfo, StreamSelect};
use crate::error::{MpegError, MpegErrorKind, Result};
use crate::io::ByteSource;

pub mod es;
pub mod ps;

pub use self::es::EsDemuxer;
pub use self::ps::PsDemuxer;

/// Common capability of the container backends.
pub trait Demuxer {
    /// Scans the source from its current position and populates the
    /// stream table. Reading before a successful probe yields nothing
    /// on the program stream backend, which drops unregistered ids.
    fn probe(&mut self) -> Result<()>;

    /// Returns the next packet matching `select`, or `None` once the
    /// stream has cleanly ended.
    fn read_packet(&mut self, select: StreamSelect) -> Result<Option<Packet>>;

    /// Number of streams discovered so far.
    fn stream_count(&self) -> usize;

    /// The descriptor at consumer-facing position `n`, or `None` when
    /// `n` is outside `0..stream_count()`.
    fn stream_info(&self, n: usize) -> Option<&StreamInfo>;
}

/// Container layouts accepted by [`Mpeg::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpegKind {
    /// Autodetect: try the program stream layout, fall back to a raw
    /// elementary stream when probing says the file has no packet
    /// framing. Without probing there is nothing to tell the layouts
    /// apart and the program stream backend is chosen.
    #[default]
    Any,
    /// Raw elementary stream.
    Es,
    /// MPEG-1 system stream or MPEG-2 program stream.
    Ps,
}

/// How the program stream backend builds its stream table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamTableStrategy {
    /// Statistically probe the first packets of the multiplex.
    #[default]
    Probe,
    /// Parse the program stream map; fail when the file carries none.
    ParseMap,
    /// Parse the program stream map, rewinding to statistical probing
    /// when the file carries none.
    MapThenProbe,
}

/// Open-time options, threaded into the backend constructors.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    /// Run stream discovery as part of [`Mpeg::open`]. On by default;
    /// switching it off defers discovery to an explicit
    /// [`Mpeg::probe`] call.
    pub probe: bool,
    /// Serve the stream table in the fixed category order video, MPEG
    /// audio, AC-3, LPCM, DTS, SPU instead of discovery order.
    pub tc_order: bool,
    /// Stream-table strategy for the program stream backend.
    pub stream_table: StreamTableStrategy,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            probe: true,
            tc_order: false,
            stream_table: StreamTableStrategy::default(),
        }
    }
}

#[derive(Debug)]
enum Backend<S> {
    Es(EsDemuxer<S>),
    Ps(PsDemuxer<S>),
}

/// An open MPEG container over a byte source.
///
/// The container owns its backend, which owns the source; [`close`]
/// (or [`into_source`]) hands the source back intact. Besides plain
/// `Result` propagation the kind of the most recent failure is kept
/// in a last-error cell for callers that interrogate errors after the
/// fact; the cell makes the container deliberately not `Sync`, which
/// matches the single-threaded contract of the byte source.
///
/// [`close`]: Mpeg::close
/// [`into_source`]: Mpeg::into_source
#[derive(Debug)]
pub struct Mpeg<S> {
    backend: Backend<S>,
    last_error: Cell<Option<MpegErrorKind>>,
}

impl<S: ByteSource> Mpeg<S> {
    /// Opens `src` as a container of the given layout.
    ///
    /// With [`OpenOptions::probe`] set this runs stream discovery
    /// before returning, leaving the source back at its starting
    /// position. Autodetection ([`MpegKind::Any`]) tries the program
    /// stream backend first and falls back to the elementary stream
    /// backend when probing fails with a format or classification
    /// error; any other failure is terminal.
    pub fn open(kind: MpegKind, src: S, opts: &OpenOptions) -> Result<Self> {
        let res = Self::dispatch(kind, src, opts);
        if let Err(e) = &res {
            error!("MPEG: open failed: {e}");
        }
        res
    }

    fn dispatch(kind: MpegKind, src: S, opts: &OpenOptions) -> Result<Self> {
        let mut mpeg = match kind {
            MpegKind::Es => Self::with_backend(Backend::Es(EsDemuxer::new(src))),
            MpegKind::Ps => Self::with_backend(Backend::Ps(PsDemuxer::new(src, opts))),
            MpegKind::Any => {
                let mut ps = Self::with_backend(Backend::Ps(PsDemuxer::new(src, opts)));
                if !opts.probe {
                    return Ok(ps);
                }
                info!("MPEG: trying the program stream layout");
                return match ps.probe() {
                    Ok(()) => Ok(ps),
                    Err(e)
                        if matches!(
                            e.kind(),
                            MpegErrorKind::BadFormat | MpegErrorKind::ProbeFailed
                        ) =>
                    {
                        info!("MPEG: not a program stream, trying the elementary stream layout");
                        let mut es =
                            Self::with_backend(Backend::Es(EsDemuxer::new(ps.into_source())));
                        match es.probe() {
                            Ok(()) => Ok(es),
                            Err(_) => Err(MpegError::UnknownFormat(
                                "neither a program stream nor a recognizable elementary stream"
                                    .into(),
                            )),
                        }
                    }
                    Err(e) => Err(e),
                };
            }
        };
        if opts.probe {
            mpeg.probe()?;
        }
        Ok(mpeg)
    }

    fn with_backend(backend: Backend<S>) -> Self {
        Mpeg {
            backend,
            last_error: Cell::new(None),
        }
    }

    fn source_mut(&mut self) -> &mut S {
        match &mut self.backend {
            Backend::Es(d) => d.source_mut(),
            Backend::Ps(d) => d.source_mut(),
        }
    }

    fn record<T>(&self, res: Result<T>) -> Result<T> {
        if let Err(e) = &res {
            self.last_error.set(Some(e.kind()));
        }
        res
    }

    /// Runs stream discovery, bracketed by seek bookkeeping: the
    /// current source position is recorded, the scan starts from the
    /// beginning, and the position is restored afterwards. A failure
    /// of the scan takes precedence over a failure of the restoring
    /// seek; pure positioning problems surface as seek errors, which
    /// tells them apart from classification failures.
    pub fn probe(&mut self) -> Result<()> {
        let res = self.probe_inner();
        self.record(res)
    }

    fn probe_inner(&mut self) -> Result<()> {
        let pos = self.source_mut().tell()?;
        self.source_mut().seek(SeekFrom::Start(0))?;
        let probed = match &mut self.backend {
            Backend::Es(d) => d.probe(),
            Backend::Ps(d) => d.probe(),
        };
        let restored = self.source_mut().seek(SeekFrom::Start(pos));
        probed?;
        restored?;
        Ok(())
    }

    /// Returns the next packet matching `select`, or `None` once the
    /// stream has cleanly ended. Ownership of the packet transfers to
    /// the caller.
    pub fn read_packet(&mut self, select: StreamSelect) -> Result<Option<Packet>> {
        let res = match &mut self.backend {
            Backend::Es(d) => d.read_packet(select),
            Backend::Ps(d) => d.read_packet(select),
        };
        self.record(res)
    }

    /// Number of streams discovered so far.
    pub fn stream_count(&self) -> usize {
        match &self.backend {
            Backend::Es(d) => d.stream_count(),
            Backend::Ps(d) => d.stream_count(),
        }
    }

    /// The descriptor at consumer-facing position `n`.
    ///
    /// `None` for positions outside `0..stream_count()`; the miss is
    /// recorded as an invalid-stream condition in the last-error cell.
    pub fn stream_info(&self, n: usize) -> Option<&StreamInfo> {
        let info = match &self.backend {
            Backend::Es(d) => d.stream_info(n),
            Backend::Ps(d) => d.stream_info(n),
        };
        if info.is_none() {
            self.last_error.set(Some(MpegErrorKind::InvalidStream));
        }
        info
    }

    /// The backend layout this container settled on: [`MpegKind::Ps`]
    /// or [`MpegKind::Es`], never [`MpegKind::Any`].
    pub fn kind(&self) -> MpegKind {
        match self.backend {
            Backend::Es(_) => MpegKind::Es,
            Backend::Ps(_) => MpegKind::Ps,
        }
    }

    /// Estimated total duration in 27 MHz ticks. Only the program
    /// stream backend computes one, and only over seekable sources
    /// larger than a megabyte.
    pub fn duration(&self) -> Option<u64> {
        match &self.backend {
            Backend::Es(_) => None,
            Backend::Ps(d) => d.duration(),
        }
    }

    /// The kind of the most recent failure, if any operation on this
    /// container has failed. Never reset by later successes.
    pub fn last_error(&self) -> Option<MpegErrorKind> {
        self.last_error.get()
    }

    /// Closes the container, handing the byte source back intact.
    pub fn close(self) -> S {
        self.into_source()
    }

    /// Consumes the container and returns the byte source.
    pub fn into_source(self) -> S {
        match self.backend {
            Backend::Es(d) => d.into_source(),
            Backend::Ps(d) => d.into_source(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::StreamKind;
    use crate::io::IoSource;
    use bytes::{BufMut, BytesMut};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const VIDEO_SEQ: [u8; 11] = [
        0x00, 0x00, 0x01, 0xB3, 0x2D, 0x02, 0x40, 0x23, 0x17, 0xED, 0x20,
    ];
    const AUDIO_HDR: [u8; 4] = [0xFF, 0xFD, 0xB0, 0x04];

    fn mem(data: Vec<u8>) -> IoSource<Cursor<Vec<u8>>> {
        IoSource::new(Cursor::new(data))
    }

    fn pes2(id: u8, pts: Option<u64>, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_slice(&[0x00, 0x00, 0x01, id]);
        let hlen: u8 = if pts.is_some() { 5 } else { 0 };
        buf.put_u16(3 + u16::from(hlen) + payload.len() as u16);
        buf.put_u8(0x80);
        buf.put_u8(if pts.is_some() { 0x80 } else { 0x00 });
        buf.put_u8(hlen);
        if let Some(ts) = pts {
            ps::pes::write_pts(&mut buf, 0x20, ts);
        }
        buf.put_slice(payload);
        buf.to_vec()
    }

    fn ps_image() -> Vec<u8> {
        let mut data = pes2(0xE0, Some(900), &VIDEO_SEQ);
        data.extend(pes2(0xC0, Some(1_000), &AUDIO_HDR));
        data.extend(pes2(0xE0, None, b"frame2"));
        data
    }

    fn es_image() -> Vec<u8> {
        let mut data = VIDEO_SEQ.to_vec();
        data.resize(2_000, 0);
        data
    }

    #[test]
    fn open_ps_probes_and_rewinds() {
        let mut mpeg = Mpeg::open(MpegKind::Ps, mem(ps_image()), &OpenOptions::default()).unwrap();

        assert_eq!(mpeg.kind(), MpegKind::Ps);
        assert_eq!(mpeg.stream_count(), 2);
        assert_eq!(mpeg.stream_info(0).unwrap().codec, "video/mpeg");
        assert_eq!(mpeg.stream_info(1).unwrap().codec, "audio/mpeg");

        // The probe rewound the source: the first packet comes back.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.stream_id, 0xE0);
        assert_eq!(pkt.pts, Some(900));
        assert_eq!(mpeg.last_error(), None);
    }

    #[test]
    fn autodetect_prefers_the_program_stream() {
        let mpeg = Mpeg::open(MpegKind::Any, mem(ps_image()), &OpenOptions::default()).unwrap();
        assert_eq!(mpeg.kind(), MpegKind::Ps);
        assert_eq!(mpeg.stream_count(), 2);
    }

    #[test]
    fn autodetect_falls_back_to_elementary() {
        let mut mpeg =
            Mpeg::open(MpegKind::Any, mem(es_image()), &OpenOptions::default()).unwrap();

        assert_eq!(mpeg.kind(), MpegKind::Es);
        assert_eq!(mpeg.stream_count(), 1);
        let info = mpeg.stream_info(0).unwrap();
        assert_eq!(info.codec, "video/mpeg");
        assert_eq!(info.kind(), StreamKind::Video);

        // ES reads restart from the rewound source, in raw chunks.
        let pkt = mpeg.read_packet(StreamSelect::Any).unwrap().unwrap();
        assert_eq!(pkt.size(), 1_024);
        assert_eq!(&pkt.data()[..4], &VIDEO_SEQ[..4]);
    }

    #[test]
    fn autodetect_rejects_alien_bytes() {
        let err = Mpeg::open(
            MpegKind::Any,
            mem(vec![0x42; 2_000]),
            &OpenOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), MpegErrorKind::UnknownFormat);
    }

    #[test]
    fn es_open_rejects_a_too_short_source() {
        let err = Mpeg::open(
            MpegKind::Es,
            mem(VIDEO_SEQ.to_vec()),
            &OpenOptions::default(),
        )
        .unwrap_err();
        // The probe window could not be filled.
        assert_eq!(err.kind(), MpegErrorKind::Read);
    }

    #[test]
    fn failed_probe_is_recorded_in_the_error_cell() {
        let opts = OpenOptions {
            probe: false,
            ..OpenOptions::default()
        };
        let mut mpeg = Mpeg::open(MpegKind::Ps, mem(vec![0x42; 64]), &opts).unwrap();
        assert_eq!(mpeg.last_error(), None);

        assert!(mpeg.probe().is_err());
        assert_eq!(mpeg.last_error(), Some(MpegErrorKind::ProbeFailed));

        // Later successes leave the cell alone.
        assert_eq!(mpeg.stream_count(), 0);
        assert_eq!(mpeg.last_error(), Some(MpegErrorKind::ProbeFailed));
    }

    #[test]
    fn stream_info_miss_is_an_invalid_reference() {
        let mpeg = Mpeg::open(MpegKind::Ps, mem(ps_image()), &OpenOptions::default()).unwrap();
        assert!(mpeg.stream_info(2).is_none());
        assert_eq!(mpeg.last_error(), Some(MpegErrorKind::InvalidStream));
    }

    #[test]
    fn close_returns_the_source_intact() {
        let image = ps_image();
        let mpeg = Mpeg::open(MpegKind::Ps, mem(image.clone()), &OpenOptions::default()).unwrap();
        let src = mpeg.close();
        assert_eq!(src.into_inner().into_inner(), image);
    }
}
