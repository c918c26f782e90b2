//! Error and status types shared by every tag format.
use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;

/// The closed set of outcomes a tag operation can report to a caller.
///
/// Unlike the internal per-component parse errors, this is the type callers
/// actually see: every `read`/`write` against a tag format resolves to one
/// of these, never an exception-like unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    NoTag,
    NoFrame,
    FrameIdBadPosition,
    PayloadTooLargeForFrame,
    TagVersionError,
    NoTagLength,
    FileRenameError,
    IoError,
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let msg = match self {
            StatusCode::Ok => "ok",
            StatusCode::NoTag => "no tag present",
            StatusCode::NoFrame => "frame not found",
            StatusCode::FrameIdBadPosition => "frame identifier at implausible position",
            StatusCode::PayloadTooLargeForFrame => "payload too large for a fixed frame slot",
            StatusCode::TagVersionError => "unrecognized or unsupported tag version",
            StatusCode::NoTagLength => "tag declares no usable length",
            StatusCode::FileRenameError => "could not rename rewritten file into place",
            StatusCode::IoError => "io error",
        };

        write!(f, "{}", msg)
    }
}

impl error::Error for StatusCode {}

/// Which tag format a [`FrameStatus`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Id3v1,
    Id3v2,
    Ape,
}

impl Display for TagKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            TagKind::Id3v1 => "ID3v1",
            TagKind::Id3v2 => "ID3v2",
            TagKind::Ape => "APEv2",
        };

        write!(f, "{}", name)
    }
}

/// The outcome of an operation against one specific tag format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStatus {
    pub frame_kind: TagKind,
    pub status: StatusCode,
}

impl FrameStatus {
    pub fn new(frame_kind: TagKind, status: StatusCode) -> Self {
        Self { frame_kind, status }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::Ok
    }
}

impl Display for FrameStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.frame_kind, self.status)
    }
}

/// Errors surfaced while performing the atomic sibling-file rewrite.
///
/// Distinct from [`StatusCode`] because a rewrite is the one place a durable
/// side effect (a stray `.mod` file) can outlive a failed call; keeping this
/// error separate lets the rewriter describe *which* step failed while the
/// tag formats above only ever need to know whether it succeeded.
#[derive(Debug)]
pub enum RewriteError {
    Io(io::Error),
    Rename(io::Error),
}

impl Display for RewriteError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RewriteError::Io(e) => write!(f, "io error during rewrite: {}", e),
            RewriteError::Rename(e) => write!(f, "could not rename sibling into place: {}", e),
        }
    }
}

impl error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RewriteError::Io(e) | RewriteError::Rename(e) => Some(e),
        }
    }
}

impl From<RewriteError> for StatusCode {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::Io(_) => StatusCode::IoError,
            RewriteError::Rename(_) => StatusCode::FileRenameError,
        }
    }
}
