//! Core utilities shared by every tag format: byte-slice parsing ergonomics
//! and the integer encodings tag/frame size fields are stored in.

pub(crate) mod codec;
