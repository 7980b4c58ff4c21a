use tracing::debug;

use crate::error::PlaybackError;

use super::backend::PlayerBackend;
use super::source::MediaSource;

/// Where a controller is in its lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Loaded but not playing: not started yet, or played to the end.
    Stopped,
    Playing,
    Paused,
}

/// How a screen reacts when the user picks an item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Picking loads the item; "Start" is pressed once to begin, after
    /// which only pause/resume and restart are offered.
    ExplicitStart,
    /// Picking a new item plays it at once; picking the same item again
    /// toggles pause/resume.
    AutoPlay,
}

/// One playback session. Each screen owns its own controller.
///
/// Invariants: `Playing` and `Paused` always have a loaded source, `Idle`
/// never does, and the backend never has more than one source open.
pub struct PlaybackController<B: PlayerBackend> {
    backend: B,
    policy: LoadPolicy,
    current: Option<MediaSource>,
    state: PlayState,
    has_started: bool,
}

impl<B: PlayerBackend> PlaybackController<B> {
    pub fn new(backend: B, policy: LoadPolicy) -> Self {
        Self {
            backend,
            policy,
            current: None,
            state: PlayState::Idle,
            has_started: false,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn current(&self) -> Option<&MediaSource> {
        self.current.as_ref()
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn is_current(&self, source: &MediaSource) -> bool {
        self.current.as_ref().is_some_and(|c| c.same_as(source))
    }

    pub fn can_start(&self) -> bool {
        self.current.is_some() && self.state == PlayState::Stopped && !self.has_started
    }

    pub fn can_toggle_pause(&self) -> bool {
        matches!(self.state, PlayState::Playing | PlayState::Paused)
    }

    pub fn can_restart(&self) -> bool {
        self.current.is_some() && self.state != PlayState::Playing
    }

    /// Load `source`, releasing whatever was loaded before.
    ///
    /// Ends in `Stopped`, or `Playing` under `AutoPlay`. If the backend
    /// cannot open the source the controller is left `Idle`.
    pub fn load(&mut self, source: MediaSource) -> Result<(), PlaybackError> {
        self.release();
        self.backend.open(&source)?;
        debug!(source = %source.label(), policy = ?self.policy, "loaded");

        self.current = Some(source);
        self.state = PlayState::Stopped;
        if self.policy == LoadPolicy::AutoPlay {
            self.backend.start();
            self.state = PlayState::Playing;
            self.has_started = true;
        }
        Ok(())
    }

    /// A click on an item in the screen's list.
    pub fn select(&mut self, source: MediaSource) -> Result<(), PlaybackError> {
        if !self.is_current(&source) {
            return self.load(source);
        }
        if self.policy == LoadPolicy::AutoPlay {
            self.toggle_pause()?;
        }
        Ok(())
    }

    /// The one-shot "Start" button. Returns whether playback began.
    pub fn start(&mut self) -> Result<bool, PlaybackError> {
        if !self.can_start() {
            return Ok(false);
        }
        self.has_started = true;
        self.play()
    }

    /// `Stopped | Paused -> Playing`; ignored otherwise.
    ///
    /// Playing again after the end rewinds first. If that fails the
    /// source is released and the controller ends `Idle`.
    pub fn play(&mut self) -> Result<bool, PlaybackError> {
        match self.state {
            PlayState::Stopped | PlayState::Paused => {
                if self.state == PlayState::Stopped && self.backend.finished() {
                    if let Err(e) = self.backend.rewind() {
                        debug!(error = %e, "rewind before play failed");
                        self.release();
                        return Err(e);
                    }
                }
                self.backend.start();
                self.state = PlayState::Playing;
                Ok(true)
            }
            PlayState::Idle | PlayState::Playing => Ok(false),
        }
    }

    /// `Playing -> Paused`; ignored otherwise.
    pub fn pause(&mut self) -> bool {
        if self.state != PlayState::Playing {
            return false;
        }
        self.backend.pause();
        self.state = PlayState::Paused;
        true
    }

    /// The Pause/Resume button.
    pub fn toggle_pause(&mut self) -> Result<bool, PlaybackError> {
        match self.state {
            PlayState::Playing => Ok(self.pause()),
            PlayState::Paused => self.play(),
            PlayState::Idle | PlayState::Stopped => Ok(false),
        }
    }

    /// Seek to zero and play. Only when loaded and not already playing.
    ///
    /// A failed seek releases the source and leaves the controller `Idle`.
    pub fn restart(&mut self) -> Result<bool, PlaybackError> {
        if !self.can_restart() {
            return Ok(false);
        }
        if let Err(e) = self.backend.rewind() {
            self.release();
            return Err(e);
        }
        self.backend.start();
        self.state = PlayState::Playing;
        self.has_started = true;
        Ok(true)
    }

    /// Free the backend resource. Valid from every state; always ends `Idle`.
    pub fn release(&mut self) {
        self.backend.release();
        if self.current.take().is_some() {
            debug!("released");
        }
        self.state = PlayState::Idle;
        self.has_started = false;
    }

    /// Natural end of media: `Playing -> Stopped`, keeping the source.
    pub fn on_end_of_media(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Stopped;
        }
    }

    /// Check the backend for end of media. Returns true on a transition.
    pub fn poll(&mut self) -> bool {
        if self.state == PlayState::Playing && self.backend.finished() {
            self.on_end_of_media();
            return true;
        }
        false
    }
}

impl<B: PlayerBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.release();
    }
}
