//! Audio input and output
//!
//! Decoding goes through symphonia, stems are written as WAV with hound, and
//! passthrough copies are byte-for-byte.

pub mod decoder;
pub mod writer;

pub use decoder::{decode, decode_stereo};
pub use writer::{copy_verbatim, write_stereo_wav};
