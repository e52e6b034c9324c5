//! # MPEG Program Stream (PS) Implementation
//!
//! This module handles the MPEG-1 system stream and MPEG-2 program
//! stream layouts: PES packet framing, pack headers, the program
//! stream map, DVD navigation events and stream discovery.
//!
//! ## Core Features
//!
//! - **Packet reading**: start-code resynchronization, pack header
//!   consumption and PES header parsing for both MPEG-1 and MPEG-2
//!   header styles
//! - **Stream discovery**: statistical probing of the first packets,
//!   or parsing of a program stream map when one is present
//! - **DVD compatibility**: private substream unwrapping (AC-3, DTS,
//!   LPCM, SPU) and navigation event handling
//!
//! ## Example
//!
//! ```rust
//! use mpegio::format::ps::PsDemuxer;
//! use mpegio::format::{Demuxer, OpenOptions};
//! use mpegio::io::IoSource;
//! use std::io::Cursor;
//!
//! # fn main() -> mpegio::Result<()> {
//! // A lone program end code: a well formed, empty program stream.
//! let data = vec![0x00, 0x00, 0x01, 0xB9];
//! let src = IoSource::new(Cursor::new(data));
//! let mut ps = PsDemuxer::new(src, &OpenOptions::default());
//! assert!(ps.read_packet(mpegio::av::StreamSelect::Any)?.is_none());
//! # Ok(())
//! # }
//! ```

/// Program stream demuxer built on the PES packet reader.
pub mod demuxer;

/// Elementary stream descriptor parsing for program stream maps.
pub mod descriptor;

/// DVD navigation events carried in private packets.
pub mod events;

/// PES packet framing: start codes, pack headers, header parsing.
pub mod pes;

pub use demuxer::PsDemuxer;
pub use events::DvdEvent;
pub use pes::{read_pes_packet, PesHeader};

/// Pack header stream id.
pub const PACK_HEADER: u8 = 0xBA;
/// System header stream id.
pub const SYSTEM_HEADER: u8 = 0xBB;
/// Program end code.
pub const PROGRAM_END: u8 = 0xB9;
/// Program stream map id.
pub const PROGRAM_STREAM_MAP: u8 = 0xBC;
/// Padding stream id.
pub const PADDING_STREAM: u8 = 0xBE;
/// Carrier id for DVD navigation events.
pub const DVD_PES_ID: u8 = 0xFC;

/// Byte budget for start code scans between packets mid-stream.
pub(crate) const SCAN_TRIES_WIDE: usize = 256;
/// Byte budget used during stream probing, where garbage means failure.
pub(crate) const SCAN_TRIES_NARROW: usize = 4;
/// Packets inspected at most by the discovery passes.
pub(crate) const PROBE_PACKETS_MAX: usize = 256;
/// Initial capacity of the stream table.
pub(crate) const STREAM_BASE_CAPACITY: usize = 4;
