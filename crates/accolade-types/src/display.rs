//! Presentation metadata for achievements.

use serde::{Deserialize, Serialize};

/// Frame (tier) drawn around an achievement icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    /// Ordinary task frame.
    #[default]
    Task,
    /// Spiked challenge frame.
    Challenge,
    /// Rounded goal frame.
    Goal,
}

/// How an achievement is presented to a client.
///
/// `x` and `y` position the node in the client's tree layout, relative to
/// its parent. Asset references (`icon`, `background`) are opaque strings;
/// resolving them is the transport's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    /// Horizontal layout position.
    pub x: f32,
    /// Vertical layout position.
    pub y: f32,
    /// Icon asset reference.
    pub icon: String,
    /// Title text.
    pub title: String,
    /// Description text.
    pub description: String,
    /// Background texture reference; only meaningful on roots.
    pub background: Option<String>,
    /// Frame classification.
    pub frame: Frame,
    /// Whether a toast pops up when the achievement completes.
    pub show_toast: bool,
    /// Whether completion is announced in chat.
    pub announce_to_chat: bool,
    /// Whether the client hides the node until it is completed.
    pub hidden: bool,
}

impl Display {
    /// Create a task-framed display with a toast and no announcement.
    pub fn new(
        x: f32,
        y: f32,
        icon: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            x,
            y,
            icon: icon.into(),
            title: title.into(),
            description: description.into(),
            background: None,
            frame: Frame::Task,
            show_toast: true,
            announce_to_chat: false,
            hidden: false,
        }
    }

    /// Set the background texture.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    /// Set the frame.
    #[must_use]
    pub const fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Enable or disable the completion toast.
    #[must_use]
    pub const fn with_toast(mut self, show_toast: bool) -> Self {
        self.show_toast = show_toast;
        self
    }

    /// Enable or disable the chat announcement.
    #[must_use]
    pub const fn with_announcement(mut self, announce_to_chat: bool) -> Self {
        self.announce_to_chat = announce_to_chat;
        self
    }

    /// Mark the node hidden until completion.
    #[must_use]
    pub const fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Return a copy shifted by `(dx, dy)`, for laying a child out
    /// relative to its parent.
    #[must_use]
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plain_task() {
        let display = Display::new(0.0, 3.0, "minecraft:grass_block", "Hello", "Join");
        assert_eq!(display.frame, Frame::Task);
        assert!(display.show_toast);
        assert!(!display.announce_to_chat);
        assert!(!display.hidden);
        assert!(display.background.is_none());
    }

    #[test]
    fn offset_keeps_everything_but_position() {
        let root = Display::new(1.0, 2.0, "icon", "Root", "r").with_frame(Frame::Goal);
        let child = root.offset(1.5, -2.0);
        assert_eq!(child.x, 2.5);
        assert_eq!(child.y, 0.0);
        assert_eq!(child.frame, Frame::Goal);
        assert_eq!(child.title, "Root");
    }

    #[test]
    fn frame_serializes_lowercase() {
        let json = serde_json::to_string(&Frame::Challenge).unwrap();
        assert_eq!(json, "\"challenge\"");
    }
}
