#![doc(html_root_url = "https://docs.rs/mpegio/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # mpegio - MPEG Program/Elementary Stream Demuxer
//!
//! `mpegio` is a pull-based demultiplexer for MPEG-1 system streams,
//! MPEG-2 program streams and raw elementary streams. It locates
//! packet boundaries by start-code scanning, parses PES headers for
//! timestamps, classifies the embedded audio and video streams by
//! sniffing their codec headers, and hands demuxed packets to the
//! caller one at a time. It never decodes payloads and never writes
//! streams.
//!
//! ## Features
//!
//! ### Container Support
//! - MPEG-2 program stream and MPEG-1 system stream demultiplexing
//! - Raw elementary stream wrapping with codec autodetection
//! - Container autodetection with program-to-elementary fallback
//!
//! ### Stream Discovery
//! - Statistical probing of the first packets of a multiplex
//! - Program stream map parsing, alone or as a composite strategy
//! - MPEG video, MPEG audio and AC-3 parameter extraction
//! - Duration estimation from timestamps near both file ends
//!
//! ### DVD Compatibility
//! - Private substream unwrapping (AC-3, DTS, LPCM, subtitles)
//! - Navigation events: timestamp skips, decoder flushes, stills,
//!   audio substream switching
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mpegio = "0.1.0"
//! ```
//!
//! ### Enumerating Streams
//!
//! ```rust,no_run
//! use mpegio::format::{Mpeg, MpegKind, OpenOptions};
//! use mpegio::io::FileSource;
//!
//! fn main() -> mpegio::Result<()> {
//!     let src = FileSource::open("movie.vob")?;
//!     let mpeg = Mpeg::open(MpegKind::Any, src, &OpenOptions::default())?;
//!
//!     for n in 0..mpeg.stream_count() {
//!         if let Some(info) = mpeg.stream_info(n) {
//!             println!("{info}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Pulling Packets For One Stream
//!
//! ```rust,no_run
//! use mpegio::av::StreamSelect;
//! use mpegio::format::{Mpeg, MpegKind, OpenOptions};
//! use mpegio::io::FileSource;
//!
//! fn main() -> mpegio::Result<()> {
//!     let src = FileSource::open("movie.mpg")?;
//!     let mut mpeg = Mpeg::open(MpegKind::Ps, src, &OpenOptions::default())?;
//!
//!     // Pull every packet of the first video stream (id 0xE0).
//!     while let Some(pkt) = mpeg.read_packet(StreamSelect::Id(0xE0))? {
//!         println!(
//!             "packet: {} payload bytes, pts {:?}",
//!             pkt.size(),
//!             pkt.pts
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: Core stream types shared by the backends
//!   - Packet abstraction with the header/payload split
//!   - Stream descriptors and the MPEG stream-id space
//!   - Rational numbers for frame rates and aspect ratios
//!
//! - `codec`: Codec registry and parameter probes
//!   - MPEG-1/2 video sequence header parsing
//!   - MPEG audio frame header parsing
//!   - AC-3 syncinfo parsing
//!
//! - `format`: Container demuxers and the dispatching front door
//!   - Program stream backend with stream discovery and DVD events
//!   - Elementary stream backend
//!   - The `Mpeg` container with layout autodetection
//!
//! - `io`: The byte-source capability the demuxers pull from
//!   - Buffered file-backed source
//!   - Adapter for any `Read + Seek` value
//!
//! - `error`: Error handling types and utilities
//!   - One error enum covering I/O, format and reference failures
//!   - Fieldless error kinds for after-the-fact interrogation
//!
//! - `utils`: Bit-level helpers used by the codec probes
//!
/// Core stream types: packets, descriptors, stream ids
pub mod av;

/// Codec registry and parameter probing
pub mod codec;

/// Error types and utilities
pub mod error;

/// Container format demuxers (program stream, elementary stream)
pub mod format;

/// Byte-source abstraction and implementations
pub mod io;

/// Common utilities and helper functions
pub mod utils;

pub use error::{MpegError, MpegErrorKind, Result};
