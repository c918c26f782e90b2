//! `TagFacade`: a single entry point over all three tag formats.
//!
//! Reads try formats in the fixed order `Ape -> Id3v1 -> Id3v2` and return
//! the first hit. Writes apply to every format currently present in the
//! file, so a file carrying both an ID3v1 trailer and an ID3v2 header stays
//! consistent across both after a single call.

use std::path::Path;

use crate::ape;
use crate::err::{FrameStatus, StatusCode, TagKind};
use crate::id3v1;
use crate::id3v2;
use crate::meta::MetaEntry;

fn status(code: StatusCode) -> FrameStatus {
    // Not tied to any one format; `TagKind::Id3v1` is an arbitrary choice
    // used only when no format was actually consulted.
    FrameStatus::new(TagKind::Id3v1, code)
}

/// Reads `entry` from `path`, trying APE, then ID3v1, then ID3v2, and
/// returning the first format whose tag is present.
pub fn read(path: &Path, entry: MetaEntry) -> (Option<String>, FrameStatus) {
    if ape::is_present(path) {
        return ape::read(path, entry);
    }

    if id3v1::is_present(path) {
        return id3v1::read(path, entry);
    }

    if id3v2::is_present(path) {
        return id3v2::read(path, entry);
    }

    (None, status(StatusCode::NoTag))
}

/// Writes `entry` into every tag format currently present in `path`.
///
/// Returns the ID3v2 status if ID3v2 is present (it is the richest format
/// and usually the one callers care about), otherwise the first present
/// format's status. If no format is present at all, returns `NoTag`.
pub fn write(path: &Path, entry: MetaEntry, content: &str) -> FrameStatus {
    let mut any_present = false;
    let mut primary: Option<FrameStatus> = None;

    if id3v2::is_present(path) {
        any_present = true;
        primary = Some(id3v2::write(path, entry, content));
    }

    if id3v1::is_present(path) {
        any_present = true;
        let st = id3v1::write(path, entry, content);
        if primary.is_none() {
            primary = Some(st);
        }
    }

    if ape::is_present(path) {
        any_present = true;
        let st = ape::write(path, entry, content);
        if primary.is_none() {
            primary = Some(st);
        }
    }

    if !any_present {
        return status(StatusCode::NoTag);
    }

    primary.expect("any_present implies primary was set")
}

/// Reads every [`MetaEntry`] this crate knows about from every tag format
/// present in `path`, returning each present format's independent view
/// rather than collapsing them through the read-order arbitration `read`
/// applies.
pub fn read_all(path: &Path) -> Vec<(TagKind, MetaEntry, String)> {
    let mut results = Vec::new();

    for &entry in MetaEntry::all() {
        if ape::is_present(path) {
            if let (Some(value), st) = ape::read(path, entry) {
                if st.is_ok() {
                    results.push((TagKind::Ape, entry, value));
                }
            }
        }

        if id3v1::is_present(path) {
            if let (Some(value), st) = id3v1::read(path, entry) {
                if st.is_ok() {
                    results.push((TagKind::Id3v1, entry, value));
                }
            }
        }

        if id3v2::is_present(path) {
            if let (Some(value), st) = id3v2::read(path, entry) {
                if st.is_ok() {
                    results.push((TagKind::Id3v2, entry, value));
                }
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use crate::core::codec::{self, Scheme};
    use crate::string;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("musikr_facade_test_{}_{}", std::process::id(), name));
        path
    }

    fn build_id3v1_tag(album: &str) -> Vec<u8> {
        let mut tag = vec![0u8; 128];
        tag[0..3].copy_from_slice(b"TAG");
        let bytes = album.as_bytes();
        tag[63..63 + bytes.len()].copy_from_slice(bytes);
        tag
    }

    fn build_text_frame_v23(id: &str, text: &str) -> Vec<u8> {
        let payload = string::encode_frame_payload(text, string::TextEncoding::Latin1);
        let mut frame = Vec::new();
        frame.extend_from_slice(id.as_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend(payload);
        frame
    }

    fn build_id3v2_tag(frames: &[Vec<u8>]) -> Vec<u8> {
        let frames_bytes: Vec<u8> = frames.iter().flatten().copied().collect();
        let tag_size = codec::encode(frames_bytes.len() as u32, 4, Scheme::Synchsafe).unwrap();

        let mut out = Vec::new();
        out.extend_from_slice(b"ID3");
        out.push(3);
        out.push(0);
        out.push(0);
        out.extend(tag_size);
        out.extend(frames_bytes);
        out
    }

    #[test]
    fn no_tag_present_returns_no_tag() {
        let path = temp_path("none");
        fs::write(&path, b"just plain audio bytes").unwrap();

        let (value, st) = read(&path, MetaEntry::Album);
        assert_eq!(value, None);
        assert_eq!(st.status, StatusCode::NoTag);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn scenario_3_id3v2_wins_when_no_ape_present() {
        let path = temp_path("scenario3");
        // No competing ID3v1 trailer here: the fixed read order Ape -> Id3v1
        // -> Id3v2 means a file carrying both would have ID3v1 win instead,
        // since it is probed first.
        let file = build_id3v2_tag(&[build_text_frame_v23("TIT2", "FromId3v2")]);
        fs::write(&path, &file).unwrap();

        let (value, st) = read(&path, MetaEntry::Title);
        assert_eq!(st.status, StatusCode::Ok);
        assert_eq!(value.unwrap(), "FromId3v2");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn write_applies_to_every_present_format() {
        let path = temp_path("writeall");
        let mut file = build_id3v2_tag(&[build_text_frame_v23("TALB", "OldV2Album")]);
        file.extend(build_id3v1_tag("OldV1Album"));
        fs::write(&path, &file).unwrap();

        let st = write(&path, MetaEntry::Album, "NewAlbum");
        assert!(st.is_ok());

        let (v2_value, _) = id3v2::read(&path, MetaEntry::Album);
        assert_eq!(v2_value.unwrap(), "NewAlbum");

        let (v1_value, _) = id3v1::read(&path, MetaEntry::Album);
        assert_eq!(v1_value.unwrap(), "NewAlbum");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn read_all_surfaces_every_present_tags_view_independently() {
        let path = temp_path("readall");
        let mut file = build_id3v2_tag(&[build_text_frame_v23("TALB", "V2Album")]);
        file.extend(build_id3v1_tag("V1Album"));
        fs::write(&path, &file).unwrap();

        let all = read_all(&path);
        assert!(all.contains(&(TagKind::Id3v2, MetaEntry::Album, "V2Album".to_string())));
        assert!(all.contains(&(TagKind::Id3v1, MetaEntry::Album, "V1Album".to_string())));

        fs::remove_file(&path).unwrap();
    }
}
