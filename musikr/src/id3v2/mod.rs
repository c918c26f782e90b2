//! ID3v2: a variable-length, frame-based tag sitting at the start of the
//! file, with three wire versions (2.2, 2.3, 2.4) differing only in
//! identifier length, frame-header length, and frame-size encoding scheme.

use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, warn};

use crate::core::codec::{self, Scheme};
use crate::err::{FrameStatus, StatusCode, TagKind};
use crate::meta::MetaEntry;
use crate::rewrite;
use crate::search;
use crate::string;

const HEADER_SIZE: usize = 10;
const FOOTER_SIZE: usize = 10;
const MAGIC: &[u8; 3] = b"ID3";

/// `TagVersion` carries everything that differs between wire versions as
/// plain data, so every operation below dispatches on it with a `match`
/// rather than through a trait object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TagVersion {
    V22,
    V23,
    V24,
}

impl TagVersion {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(TagVersion::V22),
            3 => Some(TagVersion::V23),
            4 => Some(TagVersion::V24),
            _ => None,
        }
    }

    fn id_length(self) -> usize {
        match self {
            TagVersion::V22 => 3,
            TagVersion::V23 | TagVersion::V24 => 4,
        }
    }

    fn frame_header_size(self) -> usize {
        match self {
            TagVersion::V22 => 6,
            TagVersion::V23 | TagVersion::V24 => 10,
        }
    }

    fn frame_size_len(self) -> usize {
        self.id_length()
    }

    fn frame_size_scheme(self) -> Scheme {
        match self {
            TagVersion::V22 | TagVersion::V23 => Scheme::BigEndian,
            TagVersion::V24 => Scheme::Synchsafe,
        }
    }

    fn meta_id(self, entry: MetaEntry) -> Option<&'static str> {
        match self {
            TagVersion::V22 => entry.id3v2_2_id(),
            TagVersion::V23 => entry.id3v2_3_id(),
            TagVersion::V24 => entry.id3v2_4_id(),
        }
    }
}

/// Flags carried in byte 5 of the 10-byte header. Only `footer_present`
/// affects sizing; the rest are read-only metadata the engine never acts on.
#[derive(Clone, Copy, Debug)]
struct TagFlags {
    #[allow(dead_code)]
    unsynchronisation: bool,
    #[allow(dead_code)]
    extended_header: bool,
    #[allow(dead_code)]
    experimental: bool,
    footer_present: bool,
}

impl TagFlags {
    fn parse(byte: u8) -> Self {
        Self {
            unsynchronisation: byte & 0x80 != 0,
            extended_header: byte & 0x40 != 0,
            experimental: byte & 0x20 != 0,
            footer_present: byte & 0x10 != 0,
        }
    }
}

struct LoadedTag {
    version: TagVersion,
    flags: TagFlags,
    tag_size: u32,
    buffer: Vec<u8>,
}

enum DetectError {
    NoMagic,
    BadVersion,
}

fn detect(file: &mut std::fs::File) -> io::Result<Result<(TagVersion, TagFlags, u32), DetectError>> {
    file.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; HEADER_SIZE];
    if file.read_exact(&mut header).is_err() {
        return Ok(Err(DetectError::NoMagic));
    }

    if &header[0..3] != MAGIC {
        return Ok(Err(DetectError::NoMagic));
    }

    let version = match TagVersion::from_byte(header[3]) {
        Some(v) => v,
        None => return Ok(Err(DetectError::BadVersion)),
    };

    let flags = TagFlags::parse(header[5]);
    let tag_size = codec::decode(&header[6..10], Scheme::Synchsafe);

    Ok(Ok((version, flags, tag_size)))
}

/// Reads the 10-byte header and, if it identifies a real tag, the full
/// region that follows it: `10 + tag_size` bytes, plus another 10 for the
/// tag footer when the footer-present flag is set.
fn load(path: &Path) -> io::Result<Result<LoadedTag, DetectError>> {
    let mut file = OpenOptions::new().read(true).open(path)?;

    let (version, flags, tag_size) = match detect(&mut file)? {
        Ok(v) => v,
        Err(e) => return Ok(Err(e)),
    };

    let region_len = HEADER_SIZE + tag_size as usize + if flags.footer_present { FOOTER_SIZE } else { 0 };

    file.seek(SeekFrom::Start(0))?;
    let mut buffer = vec![0u8; region_len];
    file.read_exact(&mut buffer)?;

    Ok(Ok(LoadedTag {
        version,
        flags,
        tag_size,
        buffer,
    }))
}

fn status(code: StatusCode) -> FrameStatus {
    FrameStatus::new(TagKind::Id3v2, code)
}

/// The two status-flag bits and two format-flag bits v2.3/v2.4 carry after a
/// frame's size field. Read-only metadata: the engine never acts on them
/// beyond logging a note when a payload can't safely be read as text.
/// ID3v2.2 frames have no flag bytes at all.
#[derive(Clone, Copy, Debug)]
struct FrameFlags {
    #[allow(dead_code)]
    tag_alter_preservation: bool,
    #[allow(dead_code)]
    read_only: bool,
    compression: bool,
    encryption: bool,
}

impl FrameFlags {
    fn parse(version: TagVersion, bytes: [u8; 2]) -> Self {
        let (status_byte, format_byte) = (bytes[0], bytes[1]);

        match version {
            TagVersion::V23 => Self {
                tag_alter_preservation: status_byte & 0x80 != 0,
                read_only: status_byte & 0x20 != 0,
                compression: format_byte & 0x80 != 0,
                encryption: format_byte & 0x40 != 0,
            },
            TagVersion::V24 => Self {
                tag_alter_preservation: status_byte & 0x40 != 0,
                read_only: status_byte & 0x10 != 0,
                compression: format_byte & 0x08 != 0,
                encryption: format_byte & 0x04 != 0,
            },
            TagVersion::V22 => Self {
                tag_alter_preservation: false,
                read_only: false,
                compression: false,
                encryption: false,
            },
        }
    }
}

/// A located, validated frame header inside a loaded tag buffer.
struct FrameLocation {
    frame_start: usize,
    payload_start: usize,
    payload_len: usize,
    #[allow(dead_code)]
    flags: Option<FrameFlags>,
}

/// True if `buffer[pos..]` starts with either a plausible next frame ID
/// (four uppercase-ASCII-or-digit bytes) or the zero-padding that trails the
/// last real frame, or if there isn't enough data left to tell either way.
fn looks_like_frame_boundary(buffer: &[u8], pos: usize) -> bool {
    if pos + 4 > buffer.len() {
        return true;
    }

    let candidate = &buffer[pos..pos + 4];
    candidate.iter().all(|&b| b == 0) || candidate.iter().all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Finds `id` inside `tag.buffer`, validating the candidate by re-parsing
/// its header: a plain substring hit could be payload bytes belonging to an
/// earlier frame, so a match is only trusted if its declared size keeps the
/// payload inside the tag region.
fn locate_frame(tag: &LoadedTag, id: &str) -> Option<FrameLocation> {
    let pos = search::find_at_or_after(&tag.buffer, id.as_bytes(), HEADER_SIZE, 0)?;

    let id_len = tag.version.id_length();
    let size_len = tag.version.frame_size_len();
    let header_len = tag.version.frame_header_size();

    let size_field_start = pos + id_len;
    let size_field_end = size_field_start + size_len;
    if size_field_end > tag.buffer.len() {
        return None;
    }

    let size_field = &tag.buffer[size_field_start..size_field_end];
    let mut payload_len = codec::decode(size_field, tag.version.frame_size_scheme()) as usize;

    // Some v2.4 writers (iTunes, historically) emit a plain big-endian size
    // rather than the synchsafe one the spec requires. If the synchsafe
    // reading doesn't land on a plausible next frame, retry as big-endian.
    if tag.version == TagVersion::V24 && !looks_like_frame_boundary(&tag.buffer, pos + header_len + payload_len) {
        let retried_len = codec::decode(size_field, Scheme::BigEndian) as usize;
        if looks_like_frame_boundary(&tag.buffer, pos + header_len + retried_len) {
            debug!("{}: frame size decodes as plain big-endian, not synchsafe (iTunes quirk)", id);
            payload_len = retried_len;
        }
    }

    let payload_start = pos + header_len;
    let payload_end = payload_start + payload_len;

    if payload_end > tag.buffer.len() {
        return None;
    }

    let flags = if header_len > id_len + size_len {
        let flags_start = size_field_start + size_len;
        let parsed = FrameFlags::parse(tag.version, [tag.buffer[flags_start], tag.buffer[flags_start + 1]]);

        if parsed.compression || parsed.encryption {
            debug!("{}: frame claims compression or encryption, payload will not decode as text", id);
        }

        Some(parsed)
    } else {
        None
    };

    Some(FrameLocation {
        frame_start: pos,
        payload_start,
        payload_len,
        flags,
    })
}

pub fn is_present(path: &Path) -> bool {
    matches!(load(path), Ok(Ok(_)))
}

/// Reads a [`MetaEntry`] from the ID3v2 tag at the start of `path`, if
/// present.
pub fn read(path: &Path, entry: MetaEntry) -> (Option<String>, FrameStatus) {
    let tag = match load(path) {
        Ok(Ok(tag)) => tag,
        Ok(Err(DetectError::NoMagic)) => {
            debug!("{}: no ID3v2 magic", path.display());
            return (None, status(StatusCode::NoTag));
        }
        Ok(Err(DetectError::BadVersion)) => {
            warn!("{}: unrecognized ID3v2 version byte", path.display());
            return (None, status(StatusCode::TagVersionError));
        }
        Err(err) => {
            warn!("{}: failed to read ID3v2 tag: {}", path.display(), err);
            return (None, status(StatusCode::IoError));
        }
    };

    if tag.tag_size == 0 {
        return (None, status(StatusCode::NoTagLength));
    }

    let id = match tag.version.meta_id(entry) {
        Some(id) => id,
        None => return (None, status(StatusCode::NoFrame)),
    };

    let frame = match locate_frame(&tag, id) {
        Some(frame) => frame,
        None => {
            debug!("{}: no {} frame", path.display(), id);
            return (None, status(StatusCode::NoFrame));
        }
    };

    let payload = &tag.buffer[frame.payload_start..frame.payload_start + frame.payload_len];
    let (_, text) = string::decode_frame_payload(payload);

    (Some(text), status(StatusCode::Ok))
}

/// Writes a [`MetaEntry`] into the ID3v2 tag at the start of `path`.
///
/// A payload that fits in the frame's existing declared size is patched in
/// place, zero-padded to that size, leaving every size field untouched. A
/// longer payload grows the frame: its size field, the tag's overall size
/// field, and the bytes themselves are spliced into a new buffer and handed
/// to the atomic rewriter.
pub fn write(path: &Path, entry: MetaEntry, content: &str) -> FrameStatus {
    let tag = match load(path) {
        Ok(Ok(tag)) => tag,
        Ok(Err(DetectError::NoMagic)) => {
            debug!("{}: no ID3v2 magic", path.display());
            return status(StatusCode::NoTag);
        }
        Ok(Err(DetectError::BadVersion)) => {
            warn!("{}: unrecognized ID3v2 version byte", path.display());
            return status(StatusCode::TagVersionError);
        }
        Err(err) => {
            warn!("{}: failed to read ID3v2 tag: {}", path.display(), err);
            return status(StatusCode::IoError);
        }
    };

    let id = match tag.version.meta_id(entry) {
        Some(id) => id,
        None => return status(StatusCode::NoFrame),
    };

    let frame = match locate_frame(&tag, id) {
        Some(frame) => frame,
        None => return status(StatusCode::NoFrame),
    };

    let existing_payload = &tag.buffer[frame.payload_start..frame.payload_start + frame.payload_len];
    let (encoding, _) = string::decode_frame_payload(existing_payload);
    let new_payload = string::encode_frame_payload(content, encoding);

    let delta = new_payload.len() as i64 - frame.payload_len as i64;

    if delta <= 0 {
        let mut padded = new_payload;
        padded.resize(frame.payload_len, 0);

        return match write_in_place(path, frame.payload_start, &padded) {
            Ok(()) => status(StatusCode::Ok),
            Err(_) => status(StatusCode::IoError),
        };
    }

    let id_len = tag.version.id_length();
    let size_len = tag.version.frame_size_len();
    let size_field_start = frame.frame_start + id_len;

    let new_frame_size_field = match codec::update(
        &tag.buffer[size_field_start..size_field_start + size_len],
        delta as u32,
        tag.version.frame_size_scheme(),
    ) {
        Ok(bytes) => bytes,
        Err(_) => return status(StatusCode::PayloadTooLargeForFrame),
    };

    let new_tag_size_field = match codec::update(&tag.buffer[6..10], delta as u32, Scheme::Synchsafe) {
        Ok(bytes) => bytes,
        Err(_) => return status(StatusCode::PayloadTooLargeForFrame),
    };

    let old_total_len = tag.buffer.len() as u64;
    let mut new_buffer = Vec::with_capacity(tag.buffer.len() + delta as usize);
    new_buffer.extend_from_slice(&tag.buffer[..6]);
    new_buffer.extend_from_slice(&new_tag_size_field);
    new_buffer.extend_from_slice(&tag.buffer[10..size_field_start]);
    new_buffer.extend_from_slice(&new_frame_size_field);
    new_buffer.extend_from_slice(&tag.buffer[size_field_start + size_len..frame.payload_start]);
    new_buffer.extend_from_slice(&new_payload);
    new_buffer.extend_from_slice(&tag.buffer[frame.payload_start + frame.payload_len..]);

    if tag.flags.footer_present {
        let footer_size_start = new_buffer.len() - FOOTER_SIZE + 6;
        let new_footer_size_field = match codec::update(
            &new_buffer[footer_size_start..footer_size_start + 4],
            delta as u32,
            Scheme::Synchsafe,
        ) {
            Ok(bytes) => bytes,
            Err(_) => return status(StatusCode::PayloadTooLargeForFrame),
        };
        new_buffer[footer_size_start..footer_size_start + 4].copy_from_slice(&new_footer_size_field);
    }

    match rewrite::rewrite_tag_region(path, 0, old_total_len, &new_buffer) {
        Ok(()) => status(StatusCode::Ok),
        Err(err) => status(err.into()),
    }
}

fn write_in_place(path: &Path, offset: usize, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset as u64))?;
    file.write_all(data)
}
