use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::*;
use crate::error::PlaybackError;
use crate::library::{AudioFile, Category};

#[derive(Default)]
struct Log {
    events: Vec<String>,
    open: usize,
    max_open: usize,
    finished: bool,
    fail_open: bool,
    fail_rewind: bool,
}

/// Counts open resources and records every backend call.
#[derive(Clone, Default)]
struct FakeBackend(Rc<RefCell<Log>>);

impl FakeBackend {
    fn events(&self) -> Vec<String> {
        self.0.borrow().events.clone()
    }

    fn set_finished(&self, v: bool) {
        self.0.borrow_mut().finished = v;
    }
}

impl PlayerBackend for FakeBackend {
    fn open(&mut self, source: &MediaSource) -> Result<(), PlaybackError> {
        let mut log = self.0.borrow_mut();
        if log.fail_open {
            return Err(PlaybackError::Decode(source.label()));
        }
        log.events.push(format!("open {}", source.label()));
        log.open += 1;
        log.max_open = log.max_open.max(log.open);
        log.finished = false;
        Ok(())
    }

    fn start(&mut self) {
        self.0.borrow_mut().events.push("start".into());
    }

    fn pause(&mut self) {
        self.0.borrow_mut().events.push("pause".into());
    }

    fn rewind(&mut self) -> Result<(), PlaybackError> {
        let mut log = self.0.borrow_mut();
        if log.fail_rewind {
            return Err(PlaybackError::Decode("rewind".into()));
        }
        log.events.push("rewind".into());
        log.finished = false;
        Ok(())
    }

    fn release(&mut self) {
        let mut log = self.0.borrow_mut();
        if log.open > 0 {
            log.open -= 1;
            log.events.push("release".into());
        }
    }

    fn finished(&self) -> bool {
        self.0.borrow().finished
    }
}

fn file(name: &str) -> MediaSource {
    MediaSource::File(AudioFile::new(format!("/lib/{name}.mp3"), Category::Recorded))
}

fn controller(policy: LoadPolicy) -> (PlaybackController<FakeBackend>, FakeBackend) {
    let backend = FakeBackend::default();
    (PlaybackController::new(backend.clone(), policy), backend)
}

#[test]
fn starts_idle() {
    let (pc, _) = controller(LoadPolicy::ExplicitStart);
    assert_eq!(pc.state(), PlayState::Idle);
    assert!(pc.current().is_none());
    assert!(!pc.can_start());
    assert!(!pc.can_restart());
}

#[test]
fn explicit_start_loads_stopped_then_starts_once() {
    let (mut pc, backend) = controller(LoadPolicy::ExplicitStart);
    pc.load(file("x")).unwrap();
    assert_eq!(pc.state(), PlayState::Stopped);
    assert!(pc.can_start());

    assert!(pc.start().unwrap());
    assert_eq!(pc.state(), PlayState::Playing);
    assert!(pc.has_started());
    assert!(!pc.can_start());

    pc.pause();
    assert!(!pc.start().unwrap(), "start is one-shot once used");
    assert_eq!(pc.state(), PlayState::Paused);
    assert_eq!(backend.events(), vec!["open x.mp3", "start", "pause"]);
}

#[test]
fn explicit_start_selecting_other_item_resets_has_started() {
    let (mut pc, _) = controller(LoadPolicy::ExplicitStart);
    pc.select(file("x")).unwrap();
    pc.start().unwrap();
    pc.select(file("y")).unwrap();
    assert_eq!(pc.state(), PlayState::Stopped);
    assert!(!pc.has_started());
    assert!(pc.can_start());
}

#[test]
fn explicit_start_selecting_same_item_is_a_noop() {
    let (mut pc, backend) = controller(LoadPolicy::ExplicitStart);
    pc.select(file("x")).unwrap();
    pc.start().unwrap();
    pc.select(file("x")).unwrap();
    assert_eq!(pc.state(), PlayState::Playing);
    assert_eq!(backend.events(), vec!["open x.mp3", "start"]);
}

#[test]
fn auto_play_starts_on_new_item_and_toggles_on_same_item() {
    let (mut pc, _) = controller(LoadPolicy::AutoPlay);
    pc.select(file("x")).unwrap();
    assert_eq!(pc.state(), PlayState::Playing);

    pc.select(file("x")).unwrap();
    assert_eq!(pc.state(), PlayState::Paused);
    pc.select(file("x")).unwrap();
    assert_eq!(pc.state(), PlayState::Playing);

    pc.select(file("y")).unwrap();
    assert_eq!(pc.state(), PlayState::Playing);
    assert_eq!(pc.current(), Some(&file("y")));
}

#[test]
fn load_while_playing_releases_before_opening() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    pc.load(file("y")).unwrap();
    pc.load(file("x")).unwrap();

    assert_eq!(
        backend.events(),
        vec!["open y.mp3", "start", "release", "open x.mp3", "start"]
    );
    assert_eq!(backend.0.borrow().max_open, 1);
    assert_eq!(backend.0.borrow().open, 1);
}

#[test]
fn pause_only_from_playing() {
    let (mut pc, backend) = controller(LoadPolicy::ExplicitStart);
    assert!(!pc.pause());
    pc.load(file("x")).unwrap();
    assert!(!pc.pause());
    assert_eq!(pc.state(), PlayState::Stopped);

    pc.start().unwrap();
    assert!(pc.pause());
    assert!(!pc.pause());
    assert_eq!(pc.state(), PlayState::Paused);
    assert_eq!(
        backend.events().iter().filter(|e| *e == "pause").count(),
        1
    );
}

#[test]
fn play_from_stopped_or_paused_only() {
    let (mut pc, _) = controller(LoadPolicy::ExplicitStart);
    assert!(!pc.play().unwrap());
    assert_eq!(pc.state(), PlayState::Idle);

    pc.load(file("x")).unwrap();
    assert!(pc.play().unwrap());
    assert!(!pc.play().unwrap());
    pc.pause();
    assert!(pc.play().unwrap());
    assert_eq!(pc.state(), PlayState::Playing);
}

#[test]
fn restart_requires_loaded_and_not_playing() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    assert!(!pc.restart().unwrap());

    pc.load(file("x")).unwrap();
    assert!(!pc.restart().unwrap(), "no restart while playing");

    pc.pause();
    assert!(pc.restart().unwrap());
    assert_eq!(pc.state(), PlayState::Playing);
    assert!(backend.events().ends_with(&["rewind".to_string(), "start".to_string()]));
}

#[test]
fn end_of_media_stops_but_keeps_the_file() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    pc.load(file("x")).unwrap();

    assert!(!pc.poll());
    backend.set_finished(true);
    assert!(pc.poll());
    assert_eq!(pc.state(), PlayState::Stopped);
    assert_eq!(pc.current(), Some(&file("x")));

    assert!(pc.can_restart());
    assert!(pc.restart().unwrap());
    assert_eq!(pc.state(), PlayState::Playing);
}

#[test]
fn end_of_media_is_ignored_unless_playing() {
    let (mut pc, _) = controller(LoadPolicy::ExplicitStart);
    pc.on_end_of_media();
    assert_eq!(pc.state(), PlayState::Idle);

    pc.load(file("x")).unwrap();
    pc.start().unwrap();
    pc.pause();
    pc.on_end_of_media();
    assert_eq!(pc.state(), PlayState::Paused);
}

#[test]
fn play_after_end_rewinds_first() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    pc.load(file("x")).unwrap();
    backend.set_finished(true);
    pc.poll();

    assert!(pc.play().unwrap());
    assert!(backend.events().ends_with(&["rewind".to_string(), "start".to_string()]));
}

#[test]
fn failed_rewind_before_play_releases_the_source() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    pc.load(file("x")).unwrap();
    backend.set_finished(true);
    pc.poll();
    backend.0.borrow_mut().fail_rewind = true;

    assert!(pc.play().is_err());
    assert_eq!(pc.state(), PlayState::Idle);
    assert!(pc.current().is_none());
    assert!(!pc.can_toggle_pause());
    assert_eq!(backend.0.borrow().open, 0);
    assert!(!pc.play().unwrap(), "nothing left to play");
}

#[test]
fn release_from_any_state_ends_idle() {
    let (mut pc, backend) = controller(LoadPolicy::ExplicitStart);
    pc.release();
    assert_eq!(pc.state(), PlayState::Idle);

    pc.load(file("x")).unwrap();
    pc.release();
    assert_eq!(pc.state(), PlayState::Idle);

    pc.load(file("x")).unwrap();
    pc.start().unwrap();
    pc.release();
    assert_eq!(pc.state(), PlayState::Idle);
    assert!(pc.current().is_none());
    assert!(!pc.has_started());

    pc.load(file("x")).unwrap();
    pc.start().unwrap();
    pc.pause();
    pc.release();
    assert_eq!(pc.state(), PlayState::Idle);
    assert_eq!(backend.0.borrow().open, 0);
}

#[test]
fn drop_releases_the_backend() {
    let backend = FakeBackend::default();
    {
        let mut pc = PlaybackController::new(backend.clone(), LoadPolicy::AutoPlay);
        pc.load(file("x")).unwrap();
        assert_eq!(backend.0.borrow().open, 1);
    }
    assert_eq!(backend.0.borrow().open, 0);
}

#[test]
fn failed_open_leaves_controller_idle() {
    let (mut pc, backend) = controller(LoadPolicy::AutoPlay);
    pc.load(file("x")).unwrap();
    backend.0.borrow_mut().fail_open = true;

    assert!(pc.load(file("y")).is_err());
    assert_eq!(pc.state(), PlayState::Idle);
    assert!(pc.current().is_none());
    assert_eq!(backend.0.borrow().open, 0);
}

#[test]
fn remote_sources_compare_by_url() {
    let a = MediaSource::Remote {
        url: "https://upload.example/a/Rain.ogg".into(),
        mime: "audio/ogg".into(),
        bytes: Arc::from(vec![1u8, 2, 3]),
    };
    let b = MediaSource::Remote {
        url: "https://upload.example/a/Rain.ogg".into(),
        mime: "audio/ogg".into(),
        bytes: Arc::from(Vec::<u8>::new()),
    };
    assert_eq!(a, b);
    assert_ne!(a, file("Rain"));
    assert_eq!(a.label(), "Rain.ogg");
    assert!(a.path().is_none());
}
