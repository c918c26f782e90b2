//! ID3v1: the fixed 128-byte trailer.

use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, warn};

use crate::err::{FrameStatus, StatusCode, TagKind};
use crate::meta::MetaEntry;
use crate::string::{self, TextEncoding};

const TAG_SIZE: u64 = 128;
const HEADER_ID: &[u8; 3] = b"TAG";

fn status(code: StatusCode) -> FrameStatus {
    FrameStatus::new(TagKind::Id3v1, code)
}

/// Reads the trailing 128 bytes of `path`, returning them only if they
/// start with the `"TAG"` identifier.
fn read_tag(path: &Path) -> io::Result<Option<[u8; 128]>> {
    let mut file = OpenOptions::new().read(true).open(path)?;
    let len = file.seek(SeekFrom::End(0))?;

    if len < TAG_SIZE {
        return Ok(None);
    }

    file.seek(SeekFrom::Start(len - TAG_SIZE))?;
    let mut buf = [0u8; 128];
    file.read_exact(&mut buf)?;

    if &buf[0..3] != HEADER_ID {
        return Ok(None);
    }

    Ok(Some(buf))
}

pub fn is_present(path: &Path) -> bool {
    matches!(read_tag(path), Ok(Some(_)))
}

/// Reads a [`MetaEntry`] from the ID3v1 trailer, if present.
pub fn read(path: &Path, entry: MetaEntry) -> (Option<String>, FrameStatus) {
    let tag = match read_tag(path) {
        Ok(Some(tag)) => tag,
        Ok(None) => {
            debug!("{}: no ID3v1 trailer", path.display());
            return (None, status(StatusCode::NoTag));
        }
        Err(err) => {
            warn!("{}: failed to read ID3v1 trailer: {}", path.display(), err);
            return (None, status(StatusCode::IoError));
        }
    };

    let slot = match entry.id3v1_slot() {
        Some(slot) => slot,
        None => return (None, status(StatusCode::NoFrame)),
    };

    let raw = &tag[slot.start..slot.end];

    let value = if entry == MetaEntry::Genre {
        raw[0].to_string()
    } else {
        string::decode(raw, TextEncoding::Latin1)
    };

    (Some(value), status(StatusCode::Ok))
}

/// Writes a [`MetaEntry`] into the ID3v1 trailer in place.
///
/// ID3v1 slots are fixed length: a payload that does not fit is refused
/// with `PayloadTooLargeForFrame` rather than growing the tag, since ID3v1
/// has no length field to grow.
pub fn write(path: &Path, entry: MetaEntry, content: &str) -> FrameStatus {
    if !is_present(path) {
        return status(StatusCode::NoTag);
    }

    let slot = match entry.id3v1_slot() {
        Some(slot) => slot,
        None => return status(StatusCode::NoFrame),
    };

    let bytes = if entry == MetaEntry::Genre {
        match content.parse::<u8>() {
            Ok(byte) => vec![byte],
            Err(_) => return status(StatusCode::PayloadTooLargeForFrame),
        }
    } else {
        content.as_bytes().to_vec()
    };

    if bytes.len() > slot.len() {
        return status(StatusCode::PayloadTooLargeForFrame);
    }

    let mut padded = bytes;
    padded.resize(slot.len(), 0);

    let result = (|| -> io::Result<()> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.seek(SeekFrom::End(0))?;
        let trailer_start = len - TAG_SIZE;
        file.seek(SeekFrom::Start(trailer_start + slot.start as u64))?;
        file.write_all(&padded)
    })();

    match result {
        Ok(()) => status(StatusCode::Ok),
        Err(_) => status(StatusCode::IoError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("musikr_id3v1_test_{}_{}", std::process::id(), name));
        path
    }

    fn build_file(body: &[u8]) -> Vec<u8> {
        let mut tag = vec![0u8; 128];
        tag[0..3].copy_from_slice(b"TAG");

        let mut file = body.to_vec();
        file.extend(tag);
        file
    }

    #[test]
    fn detects_absence_of_tag() {
        let path = temp_path("absent");
        fs::write(&path, b"just audio data, no tag here").unwrap();

        let (value, st) = read(&path, MetaEntry::Album);
        assert_eq!(value, None);
        assert_eq!(st.status, StatusCode::NoTag);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn scenario_2_write_into_zeroed_album_slot() {
        let path = temp_path("scenario2");
        fs::write(&path, build_file(b"AUDIO")).unwrap();

        let st = write(&path, MetaEntry::Album, "ABC");
        assert_eq!(st.status, StatusCode::Ok);

        let data = fs::read(&path).unwrap();
        let trailer_start = data.len() - 128;
        assert_eq!(&data[trailer_start + 63..trailer_start + 66], b"ABC");
        assert_eq!(&data[trailer_start + 66..trailer_start + 93], &vec![0u8; 27][..]);
        assert_eq!(data.len(), "AUDIO".len() + 128);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn payload_too_long_is_refused() {
        let path = temp_path("toolong");
        fs::write(&path, build_file(b"AUDIO")).unwrap();

        let st = write(&path, MetaEntry::Genre, "999");
        assert_eq!(st.status, StatusCode::PayloadTooLargeForFrame);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn round_trip_title() {
        let path = temp_path("roundtrip");
        fs::write(&path, build_file(b"AUDIO")).unwrap();

        write(&path, MetaEntry::Title, "My Title");
        let (value, st) = read(&path, MetaEntry::Title);
        assert_eq!(st.status, StatusCode::Ok);
        assert_eq!(value.unwrap(), "My Title");

        fs::remove_file(&path).unwrap();
    }
}
