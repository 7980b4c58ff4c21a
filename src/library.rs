//! Library of audio files on disk.
//!
//! Three fixed directories (recordings, downloads, merges) are re-scanned on
//! every listing; nothing is cached between calls.

mod layout;
mod model;
mod probe;
mod scan;

pub use layout::{LibraryDirs, ensure};
pub use model::{AudioFile, Category};
pub use probe::{MediaProbe, ProbeInfo};
pub use scan::LibraryIndex;
