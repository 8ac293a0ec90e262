//! # Message Preview
//!
//! The strip shown above the composer (editing or replying) or inside a
//! bubble (quoted reply). Its subtitle is the quoted message run through the
//! sanitizer; a deleted message shows a placeholder instead.

use super::formatter::TextFormatter;
use super::fragment::Fragment;
use super::sanitizer::Sanitizer;

/// Localization key for the deleted-message placeholder.
pub const DELETED_MESSAGE_KEY: &str = "message_deleted";

/// Observed widths at or below this collapse to [`COLLAPSED_BUBBLE_WIDTH`].
const NARROW_BUBBLE_WIDTH: u16 = 100;
const COLLAPSED_BUBBLE_WIDTH: u16 = 105;
/// Moderated previews never shrink below this width.
pub const MODERATED_MIN_WIDTH: u16 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewPlacement {
    /// Above the composer, with a close button.
    Composer,
    /// Inside a message bubble, without a close button.
    Bubble,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewBody {
    Deleted,
    Subtitle(Fragment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthRule {
    Full,
    Max(u16),
    /// Fixed at [`MODERATED_MIN_WIDTH`] minus the bubble's own padding.
    ModeratedMinimum,
}

/// The message being quoted. Only what the preview needs.
#[derive(Debug, Clone, Default)]
pub struct QuotedMessage {
    pub id: String,
    pub text: String,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct MessagePreview {
    pub message_id: String,
    pub title: String,
    pub placement: PreviewPlacement,
    pub is_moderated: bool,
    pub body: PreviewBody,
}

impl MessagePreview {
    pub fn build(
        sanitizer: &Sanitizer,
        title: &str,
        message: &QuotedMessage,
        hide_close_button: bool,
        is_moderated: bool,
        formatters: &[Box<dyn TextFormatter>],
    ) -> Self {
        let body = if message.deleted {
            PreviewBody::Deleted
        } else {
            PreviewBody::Subtitle(sanitizer.rebuild(&message.text, formatters))
        };
        Self {
            message_id: message.id.clone(),
            title: title.to_string(),
            placement: if hide_close_button {
                PreviewPlacement::Bubble
            } else {
                PreviewPlacement::Composer
            },
            is_moderated,
            body,
        }
    }

    pub fn shows_close_button(&self) -> bool {
        self.placement == PreviewPlacement::Composer && self.body != PreviewBody::Deleted
    }

    /// Width constraint given the width observed for the bubble content.
    pub fn width_rule(&self, observed_width: u16) -> WidthRule {
        if self.is_moderated && observed_width < MODERATED_MIN_WIDTH {
            return WidthRule::ModeratedMinimum;
        }
        match self.placement {
            PreviewPlacement::Composer => WidthRule::Full,
            PreviewPlacement::Bubble if observed_width <= NARROW_BUBBLE_WIDTH => {
                WidthRule::Max(COLLAPSED_BUBBLE_WIDTH)
            }
            PreviewPlacement::Bubble => WidthRule::Max(observed_width),
        }
    }
}
