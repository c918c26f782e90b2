//! APEv2: a keyed frame list addressed through a 32-byte footer (and,
//! optionally, a duplicate 32-byte header).

use std::convert::TryFrom;
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, warn};

use crate::core::codec::{self, Scheme};
use crate::err::{FrameStatus, StatusCode, TagKind};
use crate::meta::MetaEntry;
use crate::rewrite;

const FOOTER_SIZE: u64 = 32;
const PREAMBLE: &[u8; 8] = b"APETAGEX";
const ID3V1_SIZE: u64 = 128;

fn status(code: StatusCode) -> FrameStatus {
    FrameStatus::new(TagKind::Ape, code)
}

struct Footer {
    tag_size: u32,
    frame_count: u32,
}

fn parse_footer(raw: &[u8; 32]) -> Option<Footer> {
    if &raw[0..8] != PREAMBLE {
        return None;
    }

    let version = codec::decode(&raw[8..12], Scheme::LittleEndian);
    if version != 1000 && version != 2000 {
        return None;
    }

    let tag_size = codec::decode(&raw[12..16], Scheme::LittleEndian);
    let frame_count = codec::decode(&raw[16..20], Scheme::LittleEndian);

    Some(Footer {
        tag_size,
        frame_count,
    })
}

/// A fully-loaded APE tag region: the raw bytes of an optional header, the
/// frame list, and the footer, plus where that region sits in the file.
struct Region {
    region_start: u64,
    buffer: Vec<u8>,
    header_present: bool,
    frames_start: usize,
    frame_count: u32,
}

struct Frame {
    key: String,
    /// Offset of the 4-byte LE payload-size field, relative to `buffer`.
    size_field_start: usize,
    /// Offset of the payload itself, relative to `buffer`.
    payload_start: usize,
    payload_len: usize,
}

fn read_footer_at(file: &mut std::fs::File, footer_begin: u64) -> io::Result<Option<Footer>> {
    file.seek(SeekFrom::Start(footer_begin))?;
    let mut raw = [0u8; 32];
    if file.read_exact(&mut raw).is_err() {
        return Ok(None);
    }

    Ok(parse_footer(&raw))
}

fn load_region(path: &Path) -> io::Result<Option<Region>> {
    let mut file = OpenOptions::new().read(true).open(path)?;
    let len = file.seek(SeekFrom::End(0))?;

    if len < FOOTER_SIZE {
        return Ok(None);
    }

    // Probe end-of-file first, then 128 bytes earlier in case an ID3v1
    // trailer follows the APE tag.
    let candidates = [
        len.checked_sub(FOOTER_SIZE),
        len.checked_sub(FOOTER_SIZE + ID3V1_SIZE),
    ];

    let mut found = None;
    for footer_begin in candidates.iter().flatten() {
        if let Some(footer) = read_footer_at(&mut file, *footer_begin)? {
            found = Some((footer_begin, footer));
            break;
        }
    }

    let (footer_begin, footer) = match found {
        Some(v) => v,
        None => return Ok(None),
    };

    let tag_size = u64::from(footer.tag_size);
    let frames_start_abs = match footer_begin.checked_add(FOOTER_SIZE).and_then(|v| v.checked_sub(tag_size)) {
        Some(v) => v,
        None => return Ok(None),
    };

    let header_start_abs = frames_start_abs.checked_sub(FOOTER_SIZE);
    let header_present = match header_start_abs {
        Some(start) => {
            file.seek(SeekFrom::Start(start))?;
            let mut raw = [0u8; 32];
            file.read_exact(&mut raw).is_ok() && &raw[0..8] == PREAMBLE
        }
        None => false,
    };

    let region_start = if header_present {
        header_start_abs.unwrap()
    } else {
        frames_start_abs
    };
    let region_end = footer_begin + FOOTER_SIZE;

    file.seek(SeekFrom::Start(region_start))?;
    let mut buffer = vec![0u8; (region_end - region_start) as usize];
    file.read_exact(&mut buffer)?;

    let frames_start = (frames_start_abs - region_start) as usize;

    Ok(Some(Region {
        region_start,
        buffer,
        header_present,
        frames_start,
        frame_count: footer.frame_count,
    }))
}

fn parse_frames(region: &Region) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(region.frame_count as usize);
    let mut pos = region.frames_start;

    for _ in 0..region.frame_count {
        if pos + 8 > region.buffer.len() {
            break;
        }

        let payload_len = codec::decode(&region.buffer[pos..pos + 4], Scheme::LittleEndian) as usize;
        let size_field_start = pos;
        let key_start = pos + 8;

        let key_end = match region.buffer[key_start..].iter().position(|&b| b == 0) {
            Some(rel) => key_start + rel,
            None => break,
        };

        let key = String::from_utf8_lossy(&region.buffer[key_start..key_end]).to_string();
        let payload_start = key_end + 1;

        if payload_start + payload_len > region.buffer.len() {
            break;
        }

        frames.push(Frame {
            key,
            size_field_start,
            payload_start,
            payload_len,
        });

        pos = payload_start + payload_len;
    }

    frames
}

pub fn is_present(path: &Path) -> bool {
    matches!(load_region(path), Ok(Some(_)))
}

pub fn read(path: &Path, entry: MetaEntry) -> (Option<String>, FrameStatus) {
    let key = match entry.ape_key() {
        Some(key) => key,
        None => return (None, status(StatusCode::NoFrame)),
    };

    let region = match load_region(path) {
        Ok(Some(region)) => region,
        Ok(None) => {
            debug!("{}: no APE footer", path.display());
            return (None, status(StatusCode::NoTag));
        }
        Err(err) => {
            warn!("{}: failed to read APE tag: {}", path.display(), err);
            return (None, status(StatusCode::IoError));
        }
    };

    let frames = parse_frames(&region);
    let frame = match frames.iter().find(|f| f.key.eq_ignore_ascii_case(key)) {
        Some(f) => f,
        None => {
            debug!("{}: no {} frame", path.display(), key);
            return (None, status(StatusCode::NoFrame));
        }
    };

    let payload = &region.buffer[frame.payload_start..frame.payload_start + frame.payload_len];
    // A shorter in-place write zero-pads up to the frame's declared size
    // without shrinking it, so trailing padding bytes must be stripped here.
    let value = crate::string::strip_decoded(&String::from_utf8_lossy(payload));

    (Some(value), status(StatusCode::Ok))
}

pub fn write(path: &Path, entry: MetaEntry, content: &str) -> FrameStatus {
    let key = match entry.ape_key() {
        Some(key) => key,
        None => return status(StatusCode::NoFrame),
    };

    let mut region = match load_region(path) {
        Ok(Some(region)) => region,
        Ok(None) => {
            debug!("{}: no APE footer", path.display());
            return status(StatusCode::NoTag);
        }
        Err(err) => {
            warn!("{}: failed to read APE tag: {}", path.display(), err);
            return status(StatusCode::IoError);
        }
    };

    let frames = parse_frames(&region);
    let frame_index = match frames.iter().position(|f| f.key.eq_ignore_ascii_case(key)) {
        Some(i) => i,
        None => return status(StatusCode::NoFrame),
    };
    let frame = &frames[frame_index];

    let new_payload = content.as_bytes();
    let delta = new_payload.len() as i64 - frame.payload_len as i64;

    if delta <= 0 {
        // Fits in the existing slot: overwrite in place and zero-pad the
        // remainder, leaving the frame's declared size untouched.
        let mut padded = new_payload.to_vec();
        padded.resize(frame.payload_len, 0);
        let abs_offset = region.region_start + frame.payload_start as u64;
        return match patch_in_place(path, abs_offset, &padded) {
            Ok(()) => status(StatusCode::Ok),
            Err(_) => status(StatusCode::IoError),
        };
    }

    let new_size_field = match codec::encode(new_payload.len() as u32, 4, Scheme::LittleEndian) {
        Ok(bytes) => bytes,
        Err(_) => return status(StatusCode::PayloadTooLargeForFrame),
    };

    let mut new_buffer = Vec::with_capacity((region.buffer.len() as i64 + delta).max(0) as usize);
    new_buffer.extend_from_slice(&region.buffer[..frame.size_field_start]);
    new_buffer.extend_from_slice(&new_size_field);
    new_buffer.extend_from_slice(&region.buffer[frame.size_field_start + 4..frame.payload_start]);
    new_buffer.extend_from_slice(new_payload);
    new_buffer.extend_from_slice(&region.buffer[frame.payload_start + frame.payload_len..]);

    let old_footer_start = region.buffer.len() - FOOTER_SIZE as usize;
    let new_footer_start = new_buffer.len() - FOOTER_SIZE as usize;
    debug_assert_eq!(old_footer_start as i64 + delta, new_footer_start as i64);

    if bump_tag_size(&mut new_buffer, new_footer_start, delta).is_err() {
        return status(StatusCode::PayloadTooLargeForFrame);
    }

    if region.header_present && bump_tag_size(&mut new_buffer, 0, delta).is_err() {
        return status(StatusCode::PayloadTooLargeForFrame);
    }

    region.buffer = new_buffer;

    match rewrite::rewrite_tag_region(
        path,
        region.region_start,
        (old_footer_start as u64 + FOOTER_SIZE) as u64,
        &region.buffer,
    ) {
        Ok(()) => status(StatusCode::Ok),
        Err(err) => status(err.into()),
    }
}

/// Increases the tag-size field of the 32-byte header/footer structure that
/// starts at `struct_start` within `buffer` by `delta`.
fn bump_tag_size(buffer: &mut [u8], struct_start: usize, delta: i64) -> Result<(), ()> {
    let field = struct_start + 12..struct_start + 16;
    let extra = u32::try_from(delta).map_err(|_| ())?;
    let updated = codec::update(&buffer[field.clone()], extra, Scheme::LittleEndian).map_err(|_| ())?;
    buffer[field].copy_from_slice(&updated);
    Ok(())
}

fn patch_in_place(path: &Path, offset: u64, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("musikr_ape_test_{}_{}", std::process::id(), name));
        path
    }

    fn build_frame(key: &str, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&0u32.to_le_bytes()); // flags
        frame.extend_from_slice(key.as_bytes());
        frame.push(0);
        frame.extend_from_slice(payload);
        frame
    }

    fn build_tag(frames: &[Vec<u8>]) -> Vec<u8> {
        let frames_bytes: Vec<u8> = frames.iter().flatten().copied().collect();
        let frame_count = frames.len() as u32;
        let tag_size = frames_bytes.len() as u32 + FOOTER_SIZE as u32;

        let mut footer = Vec::new();
        footer.extend_from_slice(PREAMBLE);
        footer.extend_from_slice(&1000u32.to_le_bytes());
        footer.extend_from_slice(&tag_size.to_le_bytes());
        footer.extend_from_slice(&frame_count.to_le_bytes());
        footer.extend_from_slice(&[0u8; 4]); // flags
        footer.extend_from_slice(&[0u8; 8]); // reserved

        let mut out = frames_bytes;
        out.extend(footer);
        out
    }

    #[test]
    fn shrinking_write_is_padded_but_reads_back_exact() {
        let path = temp_path("shrink");
        let tag = build_tag(&[build_frame("ARTIST", b"Alice")]);
        let mut file = b"AUDIODATA".to_vec();
        file.extend(&tag);
        fs::write(&path, &file).unwrap();

        let before_len = fs::metadata(&path).unwrap().len();
        let st = write(&path, MetaEntry::Artist, "Bob");
        assert_eq!(st.status, StatusCode::Ok);

        // In-place shrink: file length and declared frame size are both
        // untouched, only the payload bytes themselves changed.
        let after_len = fs::metadata(&path).unwrap().len();
        assert_eq!(before_len, after_len);

        let (value, read_status) = read(&path, MetaEntry::Artist);
        assert_eq!(read_status.status, StatusCode::Ok);
        assert_eq!(value.unwrap(), "Bob");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn scenario_4_ape_artist_grows() {
        let path = temp_path("scenario4");
        let tag = build_tag(&[build_frame("ARTIST", b"Alice")]);
        let mut file = b"AUDIODATA".to_vec();
        file.extend(&tag);
        fs::write(&path, &file).unwrap();

        let st = write(&path, MetaEntry::Artist, "AliceBobCarol");
        assert_eq!(st.status, StatusCode::Ok);

        let (value, read_status) = read(&path, MetaEntry::Artist);
        assert_eq!(read_status.status, StatusCode::Ok);
        assert_eq!(value.unwrap(), "AliceBobCarol");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn detects_absence() {
        let path = temp_path("absent");
        fs::write(&path, b"no tag at all here").unwrap();

        let (value, st) = read(&path, MetaEntry::Title);
        assert_eq!(value, None);
        assert_eq!(st.status, StatusCode::NoTag);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn probes_before_id3v1_trailer() {
        let path = temp_path("before_id3v1");
        let tag = build_tag(&[build_frame("TITLE", b"Hello")]);
        let mut file = b"AUDIO".to_vec();
        file.extend(&tag);

        let mut id3v1 = vec![0u8; 128];
        id3v1[0..3].copy_from_slice(b"TAG");
        file.extend(id3v1);

        fs::write(&path, &file).unwrap();

        let (value, st) = read(&path, MetaEntry::Title);
        assert_eq!(st.status, StatusCode::Ok);
        assert_eq!(value.unwrap(), "Hello");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn idempotent_growth_then_rewrite_same_value() {
        let path = temp_path("idempotent");
        let tag = build_tag(&[build_frame("ALBUM", b"A")]);
        let mut file = b"AUDIO".to_vec();
        file.extend(&tag);
        fs::write(&path, &file).unwrap();

        write(&path, MetaEntry::Album, "LongerAlbumName");
        let after_first = fs::read(&path).unwrap();

        write(&path, MetaEntry::Album, "LongerAlbumName");
        let after_second = fs::read(&path).unwrap();

        assert_eq!(after_first, after_second);

        fs::remove_file(&path).unwrap();
    }
}
