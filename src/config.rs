//! soundmix settings: library directories, the ffmpeg binary and codec, the
//! Commons search endpoint, listed extensions, UI timing and logging.
//!
//! `Settings::load` layers `SOUNDMIX__*` environment variables over an
//! optional TOML file; missing keys take the struct defaults.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
