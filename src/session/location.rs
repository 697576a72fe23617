use super::room::RoomId;
use std::sync::Mutex;
use thiserror::Error;

/// Shareable location of the call page (the `?room=<id>` part of the URL)
pub trait RoomLocation: Send + Sync {
    /// Publish the current room, or clear it with `None`
    fn set_room(&mut self, room: Option<&RoomId>);

    /// Room present in the location, e.g. when the page was opened from a link
    fn room(&self) -> Option<RoomId>;

    /// Link that opens `room` for someone else
    fn link(&self, room: &RoomId) -> String;
}

/// URL-shaped location: `<origin><path>?room=<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareableLocation {
    origin: String,
    path: String,
    room: Option<RoomId>,
}

impl ShareableLocation {
    pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            path: path.into(),
            room: None,
        }
    }

    /// Parse an absolute URL such as `https://host/experts?room=room-1`
    pub fn parse(url: &str) -> Self {
        let (base, query) = match url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (url, None),
        };

        let after_scheme = base.find("://").map(|i| i + 3).unwrap_or(0);
        let (origin, path) = match base[after_scheme..].find('/') {
            Some(i) => base.split_at(after_scheme + i),
            None => (base, "/"),
        };

        let room = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "room")
                .map(|(_, value)| {
                    urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| value.to_string())
                })
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(RoomId::new)
        });

        Self {
            origin: origin.to_string(),
            path: path.to_string(),
            room,
        }
    }

    /// Current URL including the room query, if any
    pub fn href(&self) -> String {
        match &self.room {
            Some(room) => self.link(room),
            None => format!("{}{}", self.origin, self.path),
        }
    }
}

impl RoomLocation for ShareableLocation {
    fn set_room(&mut self, room: Option<&RoomId>) {
        self.room = room.cloned();
    }

    fn room(&self) -> Option<RoomId> {
        self.room.clone()
    }

    fn link(&self, room: &RoomId) -> String {
        format!(
            "{}{}?room={}",
            self.origin,
            self.path,
            urlencoding::encode(room.as_str())
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ClipboardError(pub String);

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard that keeps the last copied text in memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| ClipboardError("clipboard unavailable".to_string()))?;
        *contents = Some(text.to_string());
        Ok(())
    }
}
