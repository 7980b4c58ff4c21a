//! Per-screen playback state machine over an opaque player backend.

mod backend;
mod controller;
mod sink;
mod source;

pub use backend::PlayerBackend;
pub use controller::{LoadPolicy, PlayState, PlaybackController};
pub use sink::RodioBackend;
pub use source::MediaSource;

#[cfg(test)]
mod tests;
