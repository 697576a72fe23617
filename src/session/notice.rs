use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient user-visible message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    notice: Notice,
    expires_at: Instant,
}

/// Notices that clear themselves after a level-dependent delay
///
/// Expiry is evaluated lazily against the tokio clock, so tests can drive it
/// with `tokio::time::pause` / `advance`.
#[derive(Debug)]
pub struct NoticeBoard {
    entries: VecDeque<Entry>,
    next_id: u64,
    notice_ttl: Duration,
    error_ttl: Duration,
}

impl NoticeBoard {
    pub fn new(notice_ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            notice_ttl,
            error_ttl,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.post(NoticeLevel::Info, message.into())
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.post(NoticeLevel::Success, message.into())
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.post(NoticeLevel::Error, message.into())
    }

    /// Notices still visible now, oldest first
    pub fn active(&mut self) -> Vec<Notice> {
        self.prune();
        self.entries.iter().map(|e| e.notice.clone()).collect()
    }

    /// Drop a notice early (the "x" on an error banner)
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.notice.id != id);
        self.entries.len() != before
    }

    fn post(&mut self, level: NoticeLevel, message: String) -> u64 {
        self.prune();
        let ttl = match level {
            NoticeLevel::Error => self.error_ttl,
            NoticeLevel::Info | NoticeLevel::Success => self.notice_ttl,
        };
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_back(Entry {
            notice: Notice {
                id,
                level,
                message,
                posted_at: Utc::now(),
            },
            expires_at: Instant::now() + ttl,
        });
        id
    }

    fn prune(&mut self) {
        let now = Instant::now();
        self.entries.retain(|e| e.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notices_expire_by_level() {
        let mut board = NoticeBoard::new(Duration::from_secs(3), Duration::from_secs(5));
        board.info("Room created");
        board.error("Camera denied");
        assert_eq!(board.active().len(), 2);

        tokio::time::advance(Duration::from_secs(4)).await;
        let active = board.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].level, NoticeLevel::Error);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(board.active().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss() {
        let mut board = NoticeBoard::new(Duration::from_secs(3), Duration::from_secs(5));
        let id = board.error("boom");
        assert!(board.dismiss(id));
        assert!(!board.dismiss(id));
        assert!(board.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_posting_drops_expired_notices() {
        let mut board = NoticeBoard::new(Duration::from_secs(3), Duration::from_secs(5));
        for n in 0..100 {
            board.info(format!("User {} left the call", n));
            tokio::time::advance(Duration::from_secs(1)).await;
        }

        // Nobody read the board, yet only the last three seconds are kept
        assert_eq!(board.entries.len(), 3);
    }
}
