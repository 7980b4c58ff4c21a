use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Oldest notices are dropped once this many are queued.
const MAX_NOTICES: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message, like a toast.
#[derive(Clone, Debug)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    posted: Instant,
}

#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    ttl: Duration,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text.into(), NoticeLevel::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text.into(), NoticeLevel::Error);
    }

    fn push(&mut self, text: String, level: NoticeLevel) {
        if self.items.len() == MAX_NOTICES {
            self.items.pop_front();
        }
        self.items.push_back(Notice {
            text,
            level,
            posted: Instant::now(),
        });
    }

    /// Drop notices older than the display time.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.posted) < ttl);
    }

    /// Newest last.
    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }
}
