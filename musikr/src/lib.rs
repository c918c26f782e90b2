//! Musikr is a tag reading/writing library built primarily for the `musikr` CLI tool.
//!
//! Three independent tag formats are supported directly ([`id3v1`], [`id3v2`],
//! [`ape`]), plus [`facade`], a format-agnostic entry point over all three.

#![forbid(unsafe_code)]

mod core;

pub mod ape;
pub mod err;
pub mod facade;
pub mod id3v1;
pub mod id3v2;
pub mod meta;
mod rewrite;
mod search;
pub mod string;

pub use err::{FrameStatus, StatusCode, TagKind};
pub use meta::MetaEntry;

pub use facade::{read, read_all, write};
