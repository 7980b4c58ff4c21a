//! Two-input mixdown through an external transcoder.
//!
//! A `MergeRequest` validates both sources and fixes the output path; the
//! `MergeEngine` builds the ffmpeg argument list and runs it through a
//! `Transcoder`.

mod engine;
mod request;
mod transcoder;

pub use engine::{MergeEngine, encode_args, mix_args};
pub use request::{MergeRequest, merged_file_name};
pub use transcoder::{FfmpegTranscoder, Transcoder};
