use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use rodio::OutputStreamBuilder;
use tracing::{info, warn};

use crate::app::App;
use crate::library::{LibraryDirs, LibraryIndex};
use crate::logging;
use crate::merge::{FfmpegTranscoder, MergeEngine};
use crate::playback::RodioBackend;
use crate::search::SearchClient;

mod event_loop;
mod settings;

/// Leaves raw mode and the alternate screen when dropped, on every exit
/// path including panics.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen, Show);
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, fallback) = settings::load_settings();
    let log_file = logging::init(&settings.logging);
    if let Some(msg) = fallback {
        warn!("{msg}");
    }
    info!(log = ?log_file, "starting soundmix");

    let dirs = LibraryDirs::resolve(&settings.paths);
    let library = LibraryIndex::new(dirs, &settings.library);
    if let Err(e) = library.ensure_all() {
        warn!(error = %e, "cannot create library directories");
    }

    let client = SearchClient::new(&settings.search)?;
    let engine = Arc::new(MergeEngine::new(
        library.dirs().merged.clone(),
        settings.merge.codec.clone(),
        FfmpegTranscoder::new(&settings.merge.ffmpeg_path),
    ));

    // Declared before the app so every sink is gone before the stream closes.
    let mut stream = OutputStreamBuilder::open_default_stream()?;
    stream.log_on_drop(false);
    let mixer = stream.mixer().clone();

    let mut app = App::new(
        library,
        client,
        engine,
        Duration::from_millis(settings.ui.notice_ms),
        || RodioBackend::new(mixer.clone()),
    );

    let run_result = {
        enable_raw_mode()?;
        let _restore = TerminalGuard;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        event_loop::run(&mut terminal, &settings, &mut app)
    };
    app.shutdown();

    if let Err(e) = &run_result {
        warn!(error = %e, "event loop failed");
    }
    info!("exiting");
    run_result
}
