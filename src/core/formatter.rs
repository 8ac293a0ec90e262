//! # Text Formatters
//!
//! A formatter attaches interactive behavior to entity spans once they are
//! rendered. The sanitizer knows nothing about what a formatter does; it only
//! calls each one, in registration order, for every entity span it keeps.

use std::fmt;

use log::debug;

use super::fragment::{ClassList, Element, Listener, ListenerEvent};

/// Class carried by mention spans unless configured otherwise.
pub const DEFAULT_MENTION_CLASS: &str = "mention";

#[derive(Debug)]
pub struct FormatterError {
    pub formatter: String,
    pub message: String,
}

impl fmt::Display for FormatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formatter '{}' failed: {}", self.formatter, self.message)
    }
}

impl std::error::Error for FormatterError {}

pub trait TextFormatter {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Attach whatever listeners this formatter needs to `element`.
    ///
    /// Report problems with `Err`. The sanitizer also catches a panic here
    /// and treats it as an error, showing the message as plain text.
    fn register_event_listeners(
        &self,
        element: &mut Element,
        classes: &ClassList,
    ) -> Result<(), FormatterError>;
}

// ── Mentions ────────────────────────────────────────────────────────────────

/// Makes mention spans clickable (open the user's profile) and hoverable
/// (show the user card).
pub struct MentionsFormatter {
    class_name: String,
}

impl MentionsFormatter {
    pub const OPEN_PROFILE: &'static str = "open-profile";
    pub const SHOW_USER_CARD: &'static str = "show-user-card";

    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

impl Default for MentionsFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MENTION_CLASS)
    }
}

impl TextFormatter for MentionsFormatter {
    fn name(&self) -> &str {
        "mentions"
    }

    fn register_event_listeners(
        &self,
        element: &mut Element,
        classes: &ClassList,
    ) -> Result<(), FormatterError> {
        if !classes.contains(&self.class_name) {
            return Ok(());
        }

        let Some(uid) = element
            .attribute("data-uid")
            .or_else(|| element.attribute("data-entity-id"))
            .map(str::to_string)
        else {
            debug!("mention span without a user id, leaving it inert");
            return Ok(());
        };

        element.add_listener(Listener {
            event: ListenerEvent::Click,
            action: Self::OPEN_PROFILE.to_string(),
            entity_id: Some(uid.clone()),
        });
        element.add_listener(Listener {
            event: ListenerEvent::MouseEnter,
            action: Self::SHOW_USER_CARD.to_string(),
            entity_id: Some(uid),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(class: &str, attrs: &[(&str, &str)]) -> Element {
        let mut el = Element::span();
        el.set_attribute("class", class);
        for (name, value) in attrs {
            el.set_attribute(name, value);
        }
        el
    }

    #[test]
    fn mention_span_gets_click_and_hover() {
        let formatter = MentionsFormatter::default();
        let mut el = span("mention", &[("data-uid", "u42")]);
        let classes = el.class_list();
        formatter.register_event_listeners(&mut el, &classes).unwrap();

        assert_eq!(el.listeners.len(), 2);
        assert_eq!(el.listeners[0].event, ListenerEvent::Click);
        assert_eq!(el.listeners[0].action, MentionsFormatter::OPEN_PROFILE);
        assert_eq!(el.listeners[0].entity_id.as_deref(), Some("u42"));
        assert_eq!(el.listeners[1].event, ListenerEvent::MouseEnter);
    }

    #[test]
    fn entity_id_is_used_when_uid_missing() {
        let formatter = MentionsFormatter::default();
        let mut el = span("mention", &[("data-entity-id", "e7")]);
        let classes = el.class_list();
        formatter.register_event_listeners(&mut el, &classes).unwrap();
        assert_eq!(el.listeners[0].entity_id.as_deref(), Some("e7"));
    }

    #[test]
    fn other_classes_are_ignored() {
        let formatter = MentionsFormatter::new("cometchat-mentions");
        assert_eq!(formatter.class_name(), "cometchat-mentions");
        let mut el = span("mention", &[("data-uid", "u1")]);
        let classes = el.class_list();
        formatter.register_event_listeners(&mut el, &classes).unwrap();
        assert!(el.listeners.is_empty());
    }

    #[test]
    fn mention_without_id_stays_inert() {
        let formatter = MentionsFormatter::default();
        let mut el = span("mention", &[]);
        let classes = el.class_list();
        assert!(formatter.register_event_listeners(&mut el, &classes).is_ok());
        assert!(el.listeners.is_empty());
    }
}
