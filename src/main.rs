mod app;
mod config;
mod error;
mod jobs;
mod library;
mod logging;
mod merge;
mod playback;
mod record;
mod runtime;
mod search;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
