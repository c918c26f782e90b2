//! The semantic field names the rest of the crate reads and writes, and
//! their mapping onto each tag format's own identifier spelling.

/// A semantic tag field, independent of which format's identifier spells it
/// out on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MetaEntry {
    Album,
    Artist,
    Genre,
    Title,
    Year,
    Composer,
    Date,
    TextWriter,
    TrackPosition,
    AudioEncryption,
    Language,
    Time,
    OriginalFilename,
    FileType,
    BandOrchestra,
    Comment,
}

/// An ID3v1 field's fixed byte range within the 128-byte trailer.
#[derive(Clone, Copy, Debug)]
pub struct Id3v1Slot {
    pub start: usize,
    pub end: usize,
}

impl Id3v1Slot {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl MetaEntry {
    /// The frame identifier used by ID3v2.2 (3-character identifiers).
    pub fn id3v2_2_id(self) -> Option<&'static str> {
        match self {
            MetaEntry::Title => Some("TT2"),
            MetaEntry::Artist => Some("TP1"),
            MetaEntry::Album => Some("TAL"),
            MetaEntry::Year => Some("TYE"),
            MetaEntry::Comment => Some("COM"),
            MetaEntry::Genre => Some("TCO"),
            MetaEntry::Composer => Some("TCM"),
            MetaEntry::Date => Some("TDA"),
            MetaEntry::TextWriter => Some("TXT"),
            MetaEntry::TrackPosition => Some("TRK"),
            MetaEntry::FileType => Some("TFT"),
            MetaEntry::BandOrchestra => Some("TP2"),
            _ => None,
        }
    }

    /// The frame identifier used by ID3v2.3 (4-character identifiers).
    pub fn id3v2_3_id(self) -> Option<&'static str> {
        match self {
            MetaEntry::Title => Some("TIT2"),
            MetaEntry::Artist => Some("TPE1"),
            MetaEntry::Album => Some("TALB"),
            MetaEntry::Year => Some("TYER"),
            MetaEntry::Comment => Some("COMM"),
            MetaEntry::Genre => Some("TCON"),
            MetaEntry::Composer => Some("TCOM"),
            MetaEntry::Date => Some("TDAT"),
            MetaEntry::TextWriter => Some("TEXT"),
            MetaEntry::TrackPosition => Some("TRCK"),
            MetaEntry::FileType => Some("TFLT"),
            MetaEntry::BandOrchestra => Some("TPE2"),
            _ => None,
        }
    }

    /// The frame identifier used by ID3v2.4 (4-character identifiers).
    ///
    /// `Year` and `Date` both resolve to the combined `TDRC` timestamp
    /// frame in v2.4; every other mapping is identical to v2.3.
    pub fn id3v2_4_id(self) -> Option<&'static str> {
        match self {
            MetaEntry::Year | MetaEntry::Date => Some("TDRC"),
            other => other.id3v2_3_id(),
        }
    }

    /// The APE key, always uppercase ASCII.
    pub fn ape_key(self) -> Option<&'static str> {
        match self {
            MetaEntry::Title => Some("TITLE"),
            MetaEntry::Artist => Some("ARTIST"),
            MetaEntry::Album => Some("ALBUM"),
            MetaEntry::Year => Some("YEAR"),
            MetaEntry::Comment => Some("COMMENT"),
            MetaEntry::Genre => Some("GENRE"),
            MetaEntry::Composer => Some("COMPOSER"),
            _ => None,
        }
    }

    /// The fixed ID3v1 byte range, if this field has one.
    ///
    /// Offsets are relative to the start of the 128-byte trailer, which
    /// begins with the 3-byte `"TAG"` identifier — every field slot starts
    /// at or after byte 3.
    pub fn id3v1_slot(self) -> Option<Id3v1Slot> {
        match self {
            MetaEntry::Title => Some(Id3v1Slot { start: 3, end: 33 }),
            MetaEntry::Artist => Some(Id3v1Slot { start: 33, end: 63 }),
            MetaEntry::Album => Some(Id3v1Slot { start: 63, end: 93 }),
            MetaEntry::Year => Some(Id3v1Slot { start: 93, end: 97 }),
            MetaEntry::Comment => Some(Id3v1Slot {
                start: 97,
                end: 127,
            }),
            MetaEntry::Genre => Some(Id3v1Slot {
                start: 127,
                end: 128,
            }),
            _ => None,
        }
    }

    /// Every field this crate knows about, in declaration order. Used by
    /// `read_all` to enumerate a file's tags.
    pub fn all() -> &'static [MetaEntry] {
        &[
            MetaEntry::Album,
            MetaEntry::Artist,
            MetaEntry::Genre,
            MetaEntry::Title,
            MetaEntry::Year,
            MetaEntry::Composer,
            MetaEntry::Date,
            MetaEntry::TextWriter,
            MetaEntry::TrackPosition,
            MetaEntry::AudioEncryption,
            MetaEntry::Language,
            MetaEntry::Time,
            MetaEntry::OriginalFilename,
            MetaEntry::FileType,
            MetaEntry::BandOrchestra,
            MetaEntry::Comment,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id3v1_slots_match_spec_table() {
        assert_eq!(MetaEntry::Title.id3v1_slot().unwrap().len(), 30);
        assert_eq!(MetaEntry::Artist.id3v1_slot().unwrap().len(), 30);
        assert_eq!(MetaEntry::Album.id3v1_slot().unwrap().len(), 30);
        assert_eq!(MetaEntry::Year.id3v1_slot().unwrap().len(), 4);
        assert_eq!(MetaEntry::Comment.id3v1_slot().unwrap().len(), 30);
        assert_eq!(MetaEntry::Genre.id3v1_slot().unwrap().len(), 1);
    }

    #[test]
    fn year_maps_to_tdrc_in_v24_but_tyer_in_v23() {
        assert_eq!(MetaEntry::Year.id3v2_3_id(), Some("TYER"));
        assert_eq!(MetaEntry::Year.id3v2_4_id(), Some("TDRC"));
    }
}
