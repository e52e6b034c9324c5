use bytes::Bytes;

/// What a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Ordinary elementary stream payload.
    Data,
    /// DVD flush event; decoders should drop buffered data.
    Flush,
    /// DVD still-frame event; the current frame stays on screen.
    Still,
}

/// One demuxed packet: the captured header bytes plus the payload.
///
/// The backing buffer holds the whole captured region. A pack header
/// prefix (when one preceded the packet), the PES header, and the
/// payload all live in it contiguously; the accessors slice out the
/// pieces. Timestamps are 90 kHz ticks.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Payload classification.
    pub kind: PacketKind,
    /// Stream id, or private sub-stream id for private payloads.
    pub stream_id: u8,
    /// Presentation timestamp, when the header carried one.
    pub pts: Option<u64>,
    /// Decode timestamp, when the header carried one.
    pub dts: Option<u64>,
    /// Key-frame flag. The demuxer never sets this; transport layers
    /// stacked on top may.
    pub is_key: bool,
    buf: Bytes,
    pack_len: usize,
    hdr_end: usize,
    data_start: usize,
}

impl Packet {
    /// Wraps raw bytes as an all-payload packet with no header region.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            kind: PacketKind::Data,
            stream_id: 0,
            pts: None,
            dts: None,
            is_key: false,
            buf: data.into(),
            pack_len: 0,
            hdr_end: 0,
            data_start: 0,
        }
    }

    /// Sets the presentation timestamp.
    pub fn with_pts(mut self, pts: u64) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Sets the decode timestamp.
    pub fn with_dts(mut self, dts: u64) -> Self {
        self.dts = Some(dts);
        self
    }

    /// Sets the stream id.
    pub fn with_stream_id(mut self, id: u8) -> Self {
        self.stream_id = id;
        self
    }

    /// Sets the key-frame flag.
    pub fn with_key_flag(mut self, is_key: bool) -> Self {
        self.is_key = is_key;
        self
    }

    /// Builds a packet around a captured region.
    ///
    /// `pack_len` bytes of pack header prefix, then PES header bytes up
    /// to `hdr_end`, then payload. Requires
    /// `pack_len <= hdr_end <= buf.len()`.
    pub(crate) fn from_parts(
        kind: PacketKind,
        stream_id: u8,
        buf: Bytes,
        pack_len: usize,
        hdr_end: usize,
    ) -> Self {
        debug_assert!(pack_len <= hdr_end && hdr_end <= buf.len());
        Self {
            kind,
            stream_id,
            pts: None,
            dts: None,
            is_key: false,
            buf,
            pack_len,
            hdr_end,
            data_start: hdr_end,
        }
    }

    /// Drops `n` bytes from the front of the payload, used for the
    /// per-substream framing prefixes of DVD private payloads.
    pub(crate) fn trim_front(&mut self, n: usize) {
        self.data_start = (self.data_start + n).min(self.buf.len());
    }

    /// The captured header region: pack header prefix plus PES header.
    pub fn header(&self) -> &[u8] {
        &self.buf[..self.hdr_end]
    }

    /// The pack header prefix alone; empty when none preceded the packet.
    pub fn pack_header(&self) -> &[u8] {
        &self.buf[..self.pack_len]
    }

    /// The payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.buf[self.data_start..]
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.buf.len() - self.data_start
    }

    /// Header region length in bytes.
    pub fn hdr_size(&self) -> usize {
        self.hdr_end
    }
}
