//! `rodio` implementation of `PlayerBackend`.
//!
//! Every open builds a fresh paused `Sink` on the shared output mixer.
//! Rewinding rebuilds the sink from the retained source, which is the same
//! seek-by-rebuild approach used for scrubbing.

use std::fs::File;
use std::io::{BufReader, Cursor};

use rodio::mixer::Mixer;
use rodio::{Decoder, Sink};

use crate::error::PlaybackError;

use super::backend::PlayerBackend;
use super::source::MediaSource;

pub struct RodioBackend {
    mixer: Mixer,
    sink: Option<Sink>,
    source: Option<MediaSource>,
}

impl RodioBackend {
    pub fn new(mixer: Mixer) -> Self {
        Self {
            mixer,
            sink: None,
            source: None,
        }
    }
}

/// Create a paused `Sink` for `source`, positioned at the start.
fn create_sink(mixer: &Mixer, source: &MediaSource) -> Result<Sink, PlaybackError> {
    let sink = Sink::connect_new(mixer);
    match source {
        MediaSource::File(f) => {
            let file = File::open(&f.path).map_err(|e| PlaybackError::Open {
                path: f.path.clone(),
                reason: e.to_string(),
            })?;
            let decoder = Decoder::new(BufReader::new(file))
                .map_err(|e| PlaybackError::Decode(format!("{}: {e}", f.path.display())))?;
            sink.append(decoder);
        }
        MediaSource::Remote { url, bytes, .. } => {
            let decoder = Decoder::new(Cursor::new(bytes.clone()))
                .map_err(|e| PlaybackError::Decode(format!("{url}: {e}")))?;
            sink.append(decoder);
        }
    }
    sink.pause();
    Ok(sink)
}

impl PlayerBackend for RodioBackend {
    fn open(&mut self, source: &MediaSource) -> Result<(), PlaybackError> {
        self.release();
        self.sink = Some(create_sink(&self.mixer, source)?);
        self.source = Some(source.clone());
        Ok(())
    }

    fn start(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
    }

    fn rewind(&mut self) -> Result<(), PlaybackError> {
        let Some(source) = self.source.clone() else {
            return Ok(());
        };
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.sink = Some(create_sink(&self.mixer, &source)?);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.source = None;
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}
