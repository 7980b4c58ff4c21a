use crate::error::PlaybackError;

use super::source::MediaSource;

/// The platform player a `PlaybackController` drives.
///
/// A backend holds at most one opened source. `open` is only called on a
/// released backend; the controller guarantees the ordering.
pub trait PlayerBackend {
    /// Prepare `source` for playback, paused at position zero.
    fn open(&mut self, source: &MediaSource) -> Result<(), PlaybackError>;
    fn start(&mut self);
    fn pause(&mut self);
    /// Seek back to position zero, leaving the player paused.
    fn rewind(&mut self) -> Result<(), PlaybackError>;
    /// Free the opened resource. Safe when nothing is open.
    fn release(&mut self);
    /// True once the opened source has played to its end.
    fn finished(&self) -> bool;
}
