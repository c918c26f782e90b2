use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;

use musikr::MetaEntry;

static TAG_NAMES: &[(&str, MetaEntry)] = &[
    ("album", MetaEntry::Album),
    ("artist", MetaEntry::Artist),
    ("genre", MetaEntry::Genre),
    ("title", MetaEntry::Title),
    ("year", MetaEntry::Year),
    ("composer", MetaEntry::Composer),
    ("date", MetaEntry::Date),
    ("writer", MetaEntry::TextWriter),
    ("track", MetaEntry::TrackPosition),
    ("language", MetaEntry::Language),
    ("band", MetaEntry::BandOrchestra),
    ("comment", MetaEntry::Comment),
];

/// Parses a CLI tag name (e.g. `"album"`) into the [`MetaEntry`] it names.
pub fn entry_from_arg(arg: &str) -> Result<MetaEntry, OpError> {
    TAG_NAMES
        .iter()
        .find(|(name, _)| *name == arg)
        .map(|(_, entry)| *entry)
        .ok_or_else(|| OpError::InvalidTag(arg.to_string()))
}

/// The CLI name for a [`MetaEntry`], used when printing `show` output.
pub fn arg_from_entry(entry: MetaEntry) -> &'static str {
    TAG_NAMES
        .iter()
        .find(|(_, e)| *e == entry)
        .map(|(name, _)| *name)
        .unwrap_or("unknown")
}

#[derive(Debug)]
pub enum OpError {
    IoError(io::Error),
    InvalidTag(String),
    NotFound(String),
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::IoError(err) => write![f, "{}", err],
            Self::InvalidTag(tag) => write![f, "unrecognized tag \"{}\"", tag],
            Self::NotFound(path) => write![f, "no such file or directory: {}", path],
        }
    }
}

impl error::Error for OpError {}

impl From<io::Error> for OpError {
    fn from(other: io::Error) -> Self {
        Self::IoError(other)
    }
}
