//! Application module: the screen models the TUI draws and the runtime
//! drives.
//!
//! `App` in `app::model` owns one playback controller per screen and routes
//! background job results back into screen state.

mod model;
mod notice;
mod picker;
mod screens;

pub use model::App;
pub use notice::{Notice, NoticeLevel, Notices};
pub use picker::Picker;
pub use screens::{ActiveDownload, ListScreen, METER_WIDTH, MergeScreen, RecordScreen, SearchScreen, Tab};
