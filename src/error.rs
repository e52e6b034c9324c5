//! Error and result types shared by every module of the crate.

use thiserror::Error;

/// Errors produced while opening, probing, or reading an MPEG stream.
#[derive(Error, Debug)]
pub enum MpegError {
    /// Underlying I/O failure that is neither a plain read nor a seek.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A read from the byte source failed or came up short mid-structure.
    #[error("read failed: {0}")]
    Read(String),

    /// A seek or tell on the byte source failed.
    #[error("seek failed: {0}")]
    Seek(String),

    /// The byte source ended cleanly; not a failure in itself.
    #[error("end of stream")]
    EndOfStream,

    /// The container type requested or detected is not supported.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// Header bytes did not match the expected structure.
    #[error("bad format: {0}")]
    BadFormat(String),

    /// Probing could not classify the stream.
    #[error("probe failed: {0}")]
    ProbeFailed(String),

    /// A stream index outside the container's stream table.
    #[error("invalid stream reference: {0}")]
    InvalidStream(usize),
}

/// The kind of an [`MpegError`], stripped of its message.
///
/// Containers record the kind of the most recent failure so callers that
/// prefer errno-style interrogation can ask for it after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegErrorKind {
    /// General I/O failure.
    Io,
    /// Read failure.
    Read,
    /// Seek or tell failure.
    Seek,
    /// Clean end of stream.
    EndOfStream,
    /// Unsupported container type.
    UnknownFormat,
    /// Malformed header bytes.
    BadFormat,
    /// Stream classification failed.
    ProbeFailed,
    /// Out-of-range stream index.
    InvalidStream,
}

impl MpegError {
    /// Returns the fieldless kind of this error.
    pub fn kind(&self) -> MpegErrorKind {
        match self {
            MpegError::Io(_) => MpegErrorKind::Io,
            MpegError::Read(_) => MpegErrorKind::Read,
            MpegError::Seek(_) => MpegErrorKind::Seek,
            MpegError::EndOfStream => MpegErrorKind::EndOfStream,
            MpegError::UnknownFormat(_) => MpegErrorKind::UnknownFormat,
            MpegError::BadFormat(_) => MpegErrorKind::BadFormat,
            MpegError::ProbeFailed(_) => MpegErrorKind::ProbeFailed,
            MpegError::InvalidStream(_) => MpegErrorKind::InvalidStream,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MpegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            MpegError::BadFormat("x".into()).kind(),
            MpegErrorKind::BadFormat
        );
        assert_eq!(MpegError::EndOfStream.kind(), MpegErrorKind::EndOfStream);
        assert_eq!(MpegError::InvalidStream(7).kind(), MpegErrorKind::InvalidStream);
    }

    #[test]
    fn io_error_converts() {
        let err: MpegError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), MpegErrorKind::Io);
    }
}
