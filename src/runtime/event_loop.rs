use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Tab};
use crate::config;
use crate::merge::Transcoder;
use crate::playback::PlayerBackend;
use crate::ui;

/// Main terminal event loop: applies finished jobs, draws, then handles one
/// key. Returns `Ok(())` when quit is requested.
pub fn run<B: PlayerBackend, T: Transcoder + 'static>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<B, T>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.ui.tick_ms.max(1));
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns true when the app should quit.
fn handle_key_event<B: PlayerBackend, T: Transcoder + 'static>(key: KeyEvent, app: &mut App<B, T>) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_tab();
            return false;
        }
        KeyCode::BackTab => {
            app.prev_tab();
            return false;
        }
        _ => {}
    }

    // Typing a keyword captures every printable key.
    if app.tab() == Tab::Search && app.search.editing {
        match key.code {
            KeyCode::Enter => app.submit_search(),
            KeyCode::Esc => app.set_editing(false),
            KeyCode::Backspace => app.pop_query_char(),
            KeyCode::Char(c) if !c.is_control() => app.push_query_char(c),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Enter => app.activate(),
        KeyCode::Char('p') => app.toggle_pause(),
        KeyCode::Char('r') => app.restart(),
        KeyCode::Char(c) => match (app.tab(), c) {
            (Tab::Search, '/') => app.set_editing(true),
            (Tab::Search, 's') => app.start_preview(),
            (Tab::Search, 'd') => app.start_download(),
            (Tab::Search, 'c') => app.cancel_download(),
            (Tab::Record, ' ') => app.toggle_recording(),
            (Tab::Merge, 'a') => app.pick_source_a(),
            (Tab::Merge, 'b') => app.pick_source_b(),
            (Tab::Merge, 'm') => app.start_merge(),
            _ => {}
        },
        _ => {}
    }

    false
}
