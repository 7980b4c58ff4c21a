//! The `App` model: five screens, their players and the background jobs
//! that feed them.
//!
//! Every user action is a method here; the event loop only maps keys to
//! them. Failures become notices and never end the program.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{DownloadError, PlaybackError};
use crate::jobs::{JobEvent, Jobs};
use crate::library::{AudioFile, Category, LibraryIndex, ProbeInfo};
use crate::merge::{MergeEngine, Transcoder};
use crate::playback::{LoadPolicy, MediaSource, PlaybackController, PlayerBackend};
use crate::record::Recorder;
use crate::search::{CancelToken, Progress, SearchClient};

use super::notice::Notices;
use super::picker::Picker;
use super::screens::{ActiveDownload, ListScreen, MergeScreen, RecordScreen, SearchScreen, Tab};

pub struct App<B: PlayerBackend, T: Transcoder> {
    tab: Tab,
    pub search: SearchScreen<B>,
    pub record: RecordScreen,
    pub files: ListScreen<B>,
    pub merge: MergeScreen<B>,
    pub merged: ListScreen<B>,
    pub notices: Notices,
    library: LibraryIndex,
    client: SearchClient,
    engine: Arc<MergeEngine<T>>,
    jobs: Jobs,
}

impl<B: PlayerBackend, T: Transcoder + 'static> App<B, T> {
    /// Build the app; `make_backend` is called once per screen that plays audio.
    pub fn new(
        library: LibraryIndex,
        client: SearchClient,
        engine: Arc<MergeEngine<T>>,
        notice_ttl: Duration,
        mut make_backend: impl FnMut() -> B,
    ) -> Self {
        let mut app = Self {
            tab: Tab::Search,
            search: SearchScreen {
                query: String::new(),
                editing: true,
                searching: None,
                results: Picker::default(),
                resolving: None,
                resolved: None,
                file_info: None,
                fetching_preview: false,
                download: None,
                player: PlaybackController::new(make_backend(), LoadPolicy::ExplicitStart),
            },
            record: RecordScreen::new(),
            files: ListScreen {
                list: Picker::default(),
                details: None,
                player: PlaybackController::new(make_backend(), LoadPolicy::AutoPlay),
            },
            merge: MergeScreen {
                list: Picker::default(),
                source_a: None,
                source_b: None,
                merging: false,
                details: None,
                player: PlaybackController::new(make_backend(), LoadPolicy::AutoPlay),
            },
            merged: ListScreen {
                list: Picker::default(),
                details: None,
                player: PlaybackController::new(make_backend(), LoadPolicy::AutoPlay),
            },
            notices: Notices::new(notice_ttl),
            library,
            client,
            engine,
            jobs: Jobs::new(),
        };
        app.refresh_lists();
        app
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn library(&self) -> &LibraryIndex {
        &self.library
    }

    /// Switch screens. The screen being left is paused and the lists are
    /// re-read from disk.
    pub fn set_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        if let Some(p) = self.player_mut(self.tab) {
            p.pause();
        }
        self.tab = tab;
        self.refresh_lists();
    }

    pub fn next_tab(&mut self) {
        self.set_tab(self.tab.next());
    }

    pub fn prev_tab(&mut self) {
        self.set_tab(self.tab.prev());
    }

    pub fn player(&self, tab: Tab) -> Option<&PlaybackController<B>> {
        match tab {
            Tab::Search => Some(&self.search.player),
            Tab::Record => None,
            Tab::Files => Some(&self.files.player),
            Tab::Merge => Some(&self.merge.player),
            Tab::Merged => Some(&self.merged.player),
        }
    }

    fn player_mut(&mut self, tab: Tab) -> Option<&mut PlaybackController<B>> {
        match tab {
            Tab::Search => Some(&mut self.search.player),
            Tab::Record => None,
            Tab::Files => Some(&mut self.files.player),
            Tab::Merge => Some(&mut self.merge.player),
            Tab::Merged => Some(&mut self.merged.player),
        }
    }

    /// Re-read every library directory.
    pub fn refresh_lists(&mut self) {
        let recorded = self.library.list(Category::Recorded);
        let downloaded = self.library.list(Category::Downloaded);
        let sources: Vec<AudioFile> = recorded.into_iter().chain(downloaded).collect();

        self.files.list.set_items(sources.clone());
        self.merge.list.set_items(sources);
        self.merged.list.set_items(self.library.list(Category::Merged));

        let gone = |f: &Option<AudioFile>| f.as_ref().is_some_and(|f| !f.path.is_file());
        if gone(&self.merge.source_a) {
            self.merge.source_a = None;
        }
        if gone(&self.merge.source_b) {
            self.merge.source_b = None;
        }
    }

    pub fn move_down(&mut self) {
        match self.tab {
            Tab::Search => self.search.results.next(),
            Tab::Record => {}
            Tab::Files => self.files.list.next(),
            Tab::Merge => self.merge.list.next(),
            Tab::Merged => self.merged.list.next(),
        }
    }

    pub fn move_up(&mut self) {
        match self.tab {
            Tab::Search => self.search.results.prev(),
            Tab::Record => {}
            Tab::Files => self.files.list.prev(),
            Tab::Merge => self.merge.list.prev(),
            Tab::Merged => self.merged.list.prev(),
        }
    }

    /// Enter on the current screen.
    pub fn activate(&mut self) {
        match self.tab {
            Tab::Search if self.search.editing => self.submit_search(),
            Tab::Search => self.select_result(),
            Tab::Record => self.toggle_recording(),
            Tab::Files => {
                let item = self.files.list.selected().cloned();
                self.select_file(Tab::Files, item);
            }
            Tab::Merge => {
                let item = self.merge.list.selected().cloned();
                self.select_file(Tab::Merge, item);
            }
            Tab::Merged => {
                let item = self.merged.list.selected().cloned();
                self.select_file(Tab::Merged, item);
            }
        }
    }

    fn select_file(&mut self, tab: Tab, item: Option<AudioFile>) {
        let Some(item) = item else {
            return;
        };
        match tab {
            Tab::Files => self.files.details = None,
            Tab::Merge => self.merge.details = None,
            Tab::Merged => self.merged.details = None,
            Tab::Search | Tab::Record => return,
        }
        self.jobs.probe(item.clone());
        let result = match self.player_mut(tab) {
            Some(p) => p.select(MediaSource::File(item)),
            None => Ok(()),
        };
        self.report_playback(result);
    }

    /// Probe results for the file last selected on `tab`.
    pub fn details(&self, tab: Tab) -> Option<&ProbeInfo> {
        match tab {
            Tab::Files => self.files.details.as_ref(),
            Tab::Merge => self.merge.details.as_ref(),
            Tab::Merged => self.merged.details.as_ref(),
            Tab::Search | Tab::Record => None,
        }
    }

    /// Pause/resume on the current screen.
    pub fn toggle_pause(&mut self) {
        let result = match self.player_mut(self.tab) {
            Some(p) => p.toggle_pause().map(|_| ()),
            None => Ok(()),
        };
        self.report_playback(result);
    }

    /// Restart on the current screen.
    pub fn restart(&mut self) {
        let result = match self.player_mut(self.tab) {
            Some(p) => p.restart().map(|_| ()),
            None => Ok(()),
        };
        self.report_playback(result);
    }

    fn report_playback(&mut self, result: Result<(), PlaybackError>) {
        if let Err(e) = result {
            warn!(error = %e, "playback failed");
            self.notices.error(e.to_string());
        }
    }

    // Search screen

    pub fn set_editing(&mut self, editing: bool) {
        self.search.editing = editing;
    }

    pub fn push_query_char(&mut self, c: char) {
        if self.search.editing {
            self.search.query.push(c);
        }
    }

    pub fn pop_query_char(&mut self) {
        if self.search.editing {
            self.search.query.pop();
        }
    }

    /// Run a search for the typed keyword, dropping the previous results
    /// and preview.
    pub fn submit_search(&mut self) {
        let query = self.search.query.trim().to_string();
        self.search.editing = false;
        self.search.player.release();
        self.search.results.set_items(Vec::new());
        self.search.resolving = None;
        self.search.resolved = None;
        self.search.file_info = None;
        self.search.fetching_preview = false;

        if query.is_empty() {
            self.search.searching = None;
            self.notices.info("type a keyword to search");
            return;
        }
        self.search.searching = Some(query.clone());
        self.jobs.search(&self.client, query);
    }

    /// Look up the highlighted result; its preview loads once resolved.
    ///
    /// Picking the result whose preview is already loading or loaded
    /// leaves the session alone.
    pub fn select_result(&mut self) {
        let Some(hit) = self.search.results.selected().cloned() else {
            return;
        };
        let title = Some(hit.title.as_str());
        if self.search.resolving.as_deref() == title {
            return;
        }
        let has_preview =
            self.search.fetching_preview || self.search.player.current().is_some();
        if self.search.resolved.as_deref() == title && has_preview {
            return;
        }
        self.search.player.release();
        self.search.resolved = None;
        self.search.file_info = None;
        self.search.fetching_preview = false;
        self.search.resolving = Some(hit.title.clone());
        self.jobs.file_info(&self.client, hit.title);
    }

    /// The one-shot Start for the loaded preview.
    pub fn start_preview(&mut self) {
        let result = self.search.player.start().map(|_| ());
        self.report_playback(result);
    }

    pub fn start_download(&mut self) {
        if self.search.download.is_some() {
            self.notices.info("a download is already running");
            return;
        }
        let Some(info) = self.search.file_info.clone() else {
            self.notices.info("select a result first");
            return;
        };

        let cancel = CancelToken::new();
        self.search.download = Some(ActiveDownload {
            url: info.url.clone(),
            progress: Progress::default(),
            cancel: cancel.clone(),
        });
        let dest = self.library.dirs().downloaded.clone();
        self.jobs.download(&self.client, info.url, dest, cancel);
    }

    pub fn cancel_download(&mut self) {
        if let Some(d) = &self.search.download {
            d.cancel.cancel();
            self.notices.info("cancelling download");
        }
    }

    // Record screen

    pub fn toggle_recording(&mut self) {
        if let Some(recorder) = self.record.recorder.take() {
            match recorder.stop() {
                Ok(pending) => {
                    self.record.encoding = true;
                    self.notices.info("saving recording");
                    self.jobs.encode_recording(&self.engine, pending);
                }
                Err(e) => {
                    warn!(error = %e, "recording failed");
                    self.notices.error(e.to_string());
                }
            }
            return;
        }

        if let Ok(mut m) = self.record.meter.lock() {
            m.clear();
        }
        let dir = self.library.dirs().recorded.clone();
        match Recorder::start(&dir, self.record.meter.clone()) {
            Ok(r) => self.record.recorder = Some(r),
            Err(e) => {
                warn!(error = %e, "cannot start recording");
                self.notices.error(e.to_string());
            }
        }
    }

    pub fn recording_elapsed(&self) -> Option<Duration> {
        self.record.recorder.as_ref().map(Recorder::elapsed)
    }

    // Merge screen

    /// Use the highlighted file as source A. It must be a recording.
    pub fn pick_source_a(&mut self) {
        match self.merge.list.selected().cloned() {
            Some(f) if f.category == Category::Recorded => self.merge.source_a = Some(f),
            Some(_) => self.notices.info("source A must be a recording"),
            None => {}
        }
    }

    /// Use the highlighted file as source B. It must be a download.
    pub fn pick_source_b(&mut self) {
        match self.merge.list.selected().cloned() {
            Some(f) if f.category == Category::Downloaded => self.merge.source_b = Some(f),
            Some(_) => self.notices.info("source B must be a download"),
            None => {}
        }
    }

    pub fn start_merge(&mut self) {
        if self.merge.merging {
            self.notices.info("a merge is already running");
            return;
        }
        self.merge.merging = true;
        self.jobs.merge(
            &self.engine,
            self.merge.source_a.clone(),
            self.merge.source_b.clone(),
        );
    }

    // Background results

    pub fn handle_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Search { query, result } => {
                if self.search.searching.as_deref() != Some(query.as_str()) {
                    return;
                }
                self.search.searching = None;
                match result {
                    Ok(hits) => {
                        if hits.is_empty() {
                            self.notices.info(format!("no results for \"{query}\""));
                        }
                        self.search.results.set_items(hits);
                        self.search.results.first();
                    }
                    Err(e) => {
                        warn!(%query, error = %e, "search failed");
                        self.notices.error(format!("search failed: {e}"));
                    }
                }
            }
            JobEvent::FileInfo { title, result } => {
                if self.search.resolving.as_deref() != Some(title.as_str()) {
                    return;
                }
                self.search.resolving = None;
                match result {
                    Ok(Some(info)) => {
                        self.search.resolved = Some(title);
                        self.search.file_info = Some(info.clone());
                        self.search.fetching_preview = true;
                        self.jobs.preview(&self.client, info);
                    }
                    Ok(None) => self.notices.info(format!("no media for {title}")),
                    Err(e) => {
                        warn!(%title, error = %e, "file info lookup failed");
                        self.notices.error(format!("lookup failed: {e}"));
                    }
                }
            }
            JobEvent::Preview { info, result } => {
                if self.search.file_info.as_ref() != Some(&info) {
                    return;
                }
                self.search.fetching_preview = false;
                match result {
                    Ok(bytes) => {
                        let source = MediaSource::Remote {
                            url: info.url,
                            mime: info.mime_type,
                            bytes: bytes.into(),
                        };
                        let loaded = self.search.player.load(source);
                        if loaded.is_ok() {
                            self.notices.info("preview ready, press s to start");
                        }
                        self.report_playback(loaded);
                    }
                    Err(e) => {
                        warn!(url = %info.url, error = %e, "preview fetch failed");
                        self.notices.error(format!("preview failed: {e}"));
                    }
                }
            }
            JobEvent::DownloadProgress(p) => {
                if let Some(d) = &mut self.search.download {
                    d.progress = p;
                }
            }
            JobEvent::Download(result) => {
                self.search.download = None;
                match result {
                    Ok(file) => {
                        self.notices.info(format!("downloaded {}", file.file_name()));
                        self.refresh_lists();
                    }
                    Err(DownloadError::Cancelled) => self.notices.info("download cancelled"),
                    Err(e) => self.notices.error(format!("download failed: {e}")),
                }
            }
            JobEvent::Merge(result) => {
                self.merge.merging = false;
                match result {
                    Ok(file) => {
                        self.notices.info(format!("merged into {}", file.file_name()));
                        self.refresh_lists();
                    }
                    Err(e) => {
                        warn!(error = %e, "merge failed");
                        self.notices.error(format!("merge failed: {e}"));
                    }
                }
            }
            JobEvent::Recorded(result) => {
                self.record.encoding = false;
                match result {
                    Ok(file) => {
                        info!(path = %file.path.display(), "recording saved");
                        self.notices.info(format!("saved {}", file.file_name()));
                        self.record.last = Some(file);
                        self.refresh_lists();
                    }
                    Err(e) => {
                        warn!(error = %e, "saving recording failed");
                        self.notices.error(format!("saving recording failed: {e}"));
                    }
                }
            }
            JobEvent::Probe { file, result } => {
                let info = match result {
                    Ok(info) => info,
                    Err(e) => {
                        debug!(path = %file.path.display(), error = %e, "probe failed");
                        return;
                    }
                };
                // Only the screens still playing that file take the details.
                let source = MediaSource::File(file);
                if self.files.player.is_current(&source) {
                    self.files.details = Some(info.clone());
                }
                if self.merge.player.is_current(&source) {
                    self.merge.details = Some(info.clone());
                }
                if self.merged.player.is_current(&source) {
                    self.merged.details = Some(info);
                }
            }
        }
    }

    /// One event-loop tick: apply finished jobs, notice end of media and
    /// expire old notices.
    pub fn tick(&mut self, now: Instant) {
        for event in self.jobs.drain() {
            self.handle_event(event);
        }
        for tab in Tab::ALL {
            if let Some(p) = self.player_mut(tab) {
                p.poll();
            }
        }
        self.notices.prune(now);
    }

    /// Stop everything before exit. A recording in progress is saved.
    pub fn shutdown(&mut self) {
        if let Some(d) = &self.search.download {
            d.cancel.cancel();
        }
        if let Some(recorder) = self.record.recorder.take() {
            match recorder.stop().and_then(|p| p.encode(&self.engine)) {
                Ok(file) => info!(path = %file.path.display(), "recording saved on exit"),
                Err(e) => warn!(error = %e, "recording lost on exit"),
            }
        }
        for tab in Tab::ALL {
            if let Some(p) = self.player_mut(tab) {
                p.release();
            }
        }
    }

    #[cfg(test)]
    pub fn wait_job(&mut self, timeout: Duration) -> bool {
        match self.jobs.wait(timeout) {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }
}
