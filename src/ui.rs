//! UI rendering for the terminal user interface.
//!
//! This module draws the `App` with `ratatui`: a tab bar, the current
//! screen, a player status line, transient notices and a controls footer.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Sparkline, Tabs, Wrap},
};

use crate::app::{App, NoticeLevel, Tab};
use crate::config::UiSettings;
use crate::library::{AudioFile, ProbeInfo};
use crate::merge::Transcoder;
use crate::playback::{PlayState, PlaybackController, PlayerBackend};
use crate::record::format_clock;

/// Key bindings shown in the footer for `tab`.
fn controls_text(tab: Tab, editing: bool) -> String {
    let keys: &[(&str, &str)] = match tab {
        Tab::Search if editing => &[("enter", "search"), ("esc", "browse results")],
        Tab::Search => &[
            ("j/k", "up/down"),
            ("enter", "preview"),
            ("s", "start"),
            ("p", "pause/resume"),
            ("r", "restart"),
            ("d", "download"),
            ("c", "cancel download"),
            ("/", "edit keyword"),
        ],
        Tab::Record => &[("space", "start/stop recording")],
        Tab::Files | Tab::Merged => &[
            ("j/k", "up/down"),
            ("enter", "play/toggle"),
            ("p", "pause/resume"),
            ("r", "restart"),
        ],
        Tab::Merge => &[
            ("j/k", "up/down"),
            ("a", "pick recording"),
            ("b", "pick download"),
            ("m", "merge"),
            ("enter", "preview"),
            ("p", "pause/resume"),
            ("r", "restart"),
        ],
    };

    keys.iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .chain(["[tab] next screen".to_string(), "[q] quit".to_string()])
        .collect::<Vec<String>>()
        .join(" | ")
}

fn state_text<B: PlayerBackend>(player: &PlaybackController<B>) -> String {
    let label = player.current().map(|s| s.label());
    match (player.state(), label) {
        (PlayState::Idle, _) | (_, None) => "Nothing loaded".to_string(),
        (PlayState::Stopped, Some(l)) if !player.has_started() => format!("Ready: {l}"),
        (PlayState::Stopped, Some(l)) => format!("Stopped: {l}"),
        (PlayState::Playing, Some(l)) => format!("Playing: {l}"),
        (PlayState::Paused, Some(l)) => format!("Paused: {l}"),
    }
}

/// `MM:SS, 1.2 MiB`, or just the size when the duration is unknown.
fn details_text(info: &ProbeInfo) -> String {
    let size = format!("{:.1} MiB", info.size_bytes as f64 / (1024.0 * 1024.0));
    match info.duration {
        Some(d) => format!("{}, {size}", format_clock(d)),
        None => size,
    }
}

/// A rectangle of the given size anchored to the bottom centre of `r`.
fn bottom_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(1)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + r.height.saturating_sub(height);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

fn file_list<'a>(
    items: &'a [AudioFile],
    marker: impl Fn(&AudioFile) -> &'static str,
    title: &'a str,
) -> List<'a> {
    let rows: Vec<ListItem> = items
        .iter()
        .map(|f| {
            ListItem::new(format!(
                "{}{:<10} {}",
                marker(f),
                f.category.label(),
                f.file_name()
            ))
        })
        .collect();
    List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ")
}

fn render_list(frame: &mut Frame, list: List, selected: usize, len: usize, area: Rect) {
    let mut state = ListState::default();
    if len > 0 {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_search<B: PlayerBackend, T: Transcoder + 'static>(frame: &mut Frame, app: &App<B, T>, area: Rect) {
    let s = &app.search;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let cursor = if s.editing { "_" } else { "" };
    let input = Paragraph::new(format!("{}{cursor}", s.query)).block(padded(" keyword "));
    frame.render_widget(input, chunks[0]);

    let title = if s.searching.is_some() {
        " results (searching…) "
    } else {
        " results "
    };
    let rows: Vec<ListItem> = s
        .results
        .items()
        .iter()
        .map(|hit| {
            let snippet = hit.plain_snippet();
            if snippet.is_empty() {
                ListItem::new(hit.title.clone())
            } else {
                ListItem::new(vec![
                    Line::from(hit.title.clone()),
                    Line::from(format!("  {snippet}")).dim(),
                ])
            }
        })
        .collect();
    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    render_list(frame, list, s.results.selected_index(), s.results.items().len(), chunks[1]);

    if let Some(d) = &s.download {
        let label = match d.progress.percent() {
            Some(p) => format!("{p}%"),
            None => format!("{} KiB", d.progress.downloaded / 1024),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" downloading "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(d.progress.fraction().unwrap_or(0.0))
            .label(label);
        frame.render_widget(gauge, chunks[2]);
    } else {
        let text = if s.resolving.is_some() {
            "Looking up file…".to_string()
        } else if s.fetching_preview {
            "Fetching preview…".to_string()
        } else if let Some(info) = &s.file_info {
            format!("{} ({})", info.url, info.mime_type)
        } else {
            "Select a result to preview it".to_string()
        };
        let info = Paragraph::new(text).block(padded(" file ")).wrap(Wrap { trim: true });
        frame.render_widget(info, chunks[2]);
    }
}

fn draw_record<B: PlayerBackend, T: Transcoder + 'static>(frame: &mut Frame, app: &App<B, T>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let status = match (&app.record.recorder, app.recording_elapsed()) {
        (Some(r), Some(elapsed)) => {
            let name = r.target().file_name().unwrap_or_default().to_string_lossy();
            format!("● Recording {name}  {}", format_clock(elapsed))
        }
        _ if app.record.encoding => "Saving recording…".to_string(),
        _ => "Not recording".to_string(),
    };
    let mut lines = vec![Line::from(status).bold()];
    if let Some(last) = &app.record.last {
        lines.push(Line::from(format!("Last saved: {}", last.file_name())));
    }
    frame.render_widget(Paragraph::new(lines).block(padded(" recorder ")), chunks[0]);

    let width = chunks[1].width.saturating_sub(2) as usize;
    let bars = app
        .record
        .meter
        .lock()
        .map(|m| m.bars(width))
        .unwrap_or_else(|_| vec![0; width]);
    let spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(" level "))
        .style(Style::default().fg(Color::Red))
        .max(100)
        .data(bars);
    frame.render_widget(spark, chunks[1]);
}

fn draw_merge<B: PlayerBackend, T: Transcoder + 'static>(frame: &mut Frame, app: &App<B, T>, area: Rect) {
    let m = &app.merge;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let marker = |f: &AudioFile| {
        if m.source_a.as_ref() == Some(f) {
            "[A] "
        } else if m.source_b.as_ref() == Some(f) {
            "[B] "
        } else {
            "    "
        }
    };
    let list = file_list(m.list.items(), marker, " recordings & downloads ");
    render_list(frame, list, m.list.selected_index(), m.list.items().len(), chunks[0]);

    let name = |f: &Option<AudioFile>| f.as_ref().map_or("-".to_string(), AudioFile::file_name);
    let mut text = format!("A: {}  +  B: {}", name(&m.source_a), name(&m.source_b));
    if m.merging {
        text.push_str("  (merging…)");
    }
    frame.render_widget(Paragraph::new(text).block(padded(" mix ")), chunks[1]);
}

/// Render the entire UI into `frame`.
pub fn draw<B: PlayerBackend, T: Transcoder + 'static>(frame: &mut Frame, app: &App<B, T>, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(app.tab().index())
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" soundmix{}", ui_settings.header_text))
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(tabs, chunks[0]);

    // Status box
    let status = match (app.player(app.tab()), app.details(app.tab())) {
        (Some(p), Some(info)) if p.current().is_some() => {
            format!("{} [{}]", state_text(p), details_text(info))
        }
        (Some(p), _) => state_text(p),
        (None, _) => format!("Saving to {}", app.library().dirs().recorded.display()),
    };
    let status_par = Paragraph::new(status)
        .block(padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Screen
    let main = chunks[2];
    match app.tab() {
        Tab::Search => draw_search(frame, app, main),
        Tab::Record => draw_record(frame, app, main),
        Tab::Files => {
            let files = &app.files;
            let playing = |f: &AudioFile| {
                if files.player.current().and_then(|s| s.path()) == Some(f.path.as_path()) {
                    "♪ "
                } else {
                    "  "
                }
            };
            let list = file_list(files.list.items(), playing, " recordings & downloads ");
            render_list(frame, list, files.list.selected_index(), files.list.items().len(), main);
        }
        Tab::Merge => draw_merge(frame, app, main),
        Tab::Merged => {
            let merged = &app.merged;
            let playing = |f: &AudioFile| {
                if merged.player.current().and_then(|s| s.path()) == Some(f.path.as_path()) {
                    "♪ "
                } else {
                    "  "
                }
            };
            let list = file_list(merged.list.items(), playing, " merged ");
            render_list(frame, list, merged.list.selected_index(), merged.list.items().len(), main);
        }
    }

    // Notices float over the bottom of the screen area
    let notices: Vec<Line> = app
        .notices
        .visible()
        .map(|n| match n.level {
            NoticeLevel::Info => Line::from(n.text.clone()),
            NoticeLevel::Error => Line::from(n.text.clone()).fg(Color::Red),
        })
        .collect();
    if !notices.is_empty() {
        let area = bottom_rect_sized(72, notices.len() as u16 + 2, main);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(notices)
                .block(padded(" notice "))
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    let footer = Paragraph::new(controls_text(app.tab(), app.search.editing))
        .block(padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
