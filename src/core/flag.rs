//! # Flag Message Dialog
//!
//! State and submission flow for reporting a message. Fetching reasons and
//! submitting the report go through [`FlagService`], the chat backend's
//! moderation boundary. User-facing strings are returned as localization keys.

use std::fmt;

use log::{info, warn};
use serde::Deserialize;

/// Longest remark accepted, in characters.
pub const REMARK_CHARACTER_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlagReason {
    pub id: String,
    pub name: String,
}

impl FlagReason {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Localization key for this reason's label. Callers fall back to
    /// [`name`](Self::name) when the key has no translation.
    pub fn label_key(&self) -> String {
        format!("flag_message_reason_id_{}", self.id)
    }
}

#[derive(Debug)]
pub enum FlagError {
    /// The backend rejected or failed the request.
    Backend(String),
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagError::Backend(msg) => write!(f, "flag backend error: {msg}"),
        }
    }
}

impl std::error::Error for FlagError {}

pub trait FlagService {
    fn flag_reasons(&self) -> Result<Vec<FlagReason>, FlagError>;

    /// Returns `Ok(false)` when the backend declined the report.
    fn submit(
        &self,
        message_id: &str,
        reason_id: &str,
        remark: Option<&str>,
    ) -> Result<bool, FlagError>;
}

/// Inline message shown under the remark field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagNotice {
    CharacterLimitReached,
    SubmitFailed,
}

impl FlagNotice {
    pub fn key(self) -> &'static str {
        match self {
            FlagNotice::CharacterLimitReached => "flag_message_character_limit_reached",
            FlagNotice::SubmitFailed => "flag_message_error",
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Report accepted; the dialog should close.
    Submitted,
    /// Nothing selected; nothing sent.
    NoSelection,
    /// The backend declined the report; the dialog stays open.
    Rejected,
    /// The request failed; the error goes to the caller's error hook.
    Failed(FlagError),
}

#[derive(Debug)]
pub struct FlagDialog {
    message_id: String,
    reasons: Vec<FlagReason>,
    selected: Option<String>,
    remark: String,
    notice: Option<FlagNotice>,
    is_loading: bool,
    pub hide_remark_field: bool,
}

impl FlagDialog {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            reasons: Vec::new(),
            selected: None,
            remark: String::new(),
            notice: None,
            is_loading: false,
            hide_remark_field: false,
        }
    }

    /// Fetches the reason list. On failure the list stays empty.
    pub fn load_reasons(&mut self, service: &dyn FlagService) -> Result<(), FlagError> {
        match service.flag_reasons() {
            Ok(reasons) => {
                self.reasons = reasons;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to fetch flag reasons: {e}");
                Err(e)
            }
        }
    }

    pub fn reasons(&self) -> &[FlagReason] {
        &self.reasons
    }

    pub fn selected_reason(&self) -> Option<&FlagReason> {
        let id = self.selected.as_deref()?;
        self.reasons.iter().find(|r| r.id == id)
    }

    pub fn is_selected(&self, reason: &FlagReason) -> bool {
        self.selected.as_deref() == Some(reason.id.as_str())
    }

    /// Selects the reason with `id`. Unknown ids leave the selection alone.
    pub fn select_reason(&mut self, id: &str) -> bool {
        if !self.reasons.iter().any(|r| r.id == id) {
            return false;
        }
        self.selected = Some(id.to_string());
        self.notice = None;
        true
    }

    pub fn remark(&self) -> &str {
        &self.remark
    }

    /// Stores `value`, truncated to [`REMARK_CHARACTER_LIMIT`] characters.
    pub fn set_remark(&mut self, value: &str) {
        if value.chars().count() > REMARK_CHARACTER_LIMIT {
            self.notice = Some(FlagNotice::CharacterLimitReached);
            self.remark = value.chars().take(REMARK_CHARACTER_LIMIT).collect();
        } else {
            self.notice = None;
            self.remark = value.to_string();
        }
    }

    pub fn notice(&self) -> Option<FlagNotice> {
        self.notice
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn can_submit(&self) -> bool {
        self.selected_reason().is_some()
    }

    pub fn submit(&mut self, service: &dyn FlagService) -> SubmitOutcome {
        self.notice = None;
        let Some(reason) = self.selected_reason() else {
            return SubmitOutcome::NoSelection;
        };
        let reason_id = reason.id.clone();

        let trimmed = self.remark.trim();
        let remark = (!trimmed.is_empty()).then_some(trimmed);

        self.is_loading = true;
        let result = service.submit(&self.message_id, &reason_id, remark);
        self.is_loading = false;

        match result {
            Ok(true) => {
                info!("Flagged message {} for {}", self.message_id, reason_id);
                SubmitOutcome::Submitted
            }
            Ok(false) => {
                self.notice = Some(FlagNotice::SubmitFailed);
                SubmitOutcome::Rejected
            }
            Err(e) => {
                warn!("Flagging message {} failed: {e}", self.message_id);
                self.notice = Some(FlagNotice::SubmitFailed);
                SubmitOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubFlagService;

    fn loaded_dialog(service: &StubFlagService) -> FlagDialog {
        let mut dialog = FlagDialog::new("42");
        dialog.load_reasons(service).unwrap();
        dialog
    }

    #[test]
    fn reasons_load_from_service() {
        let service = StubFlagService::accepting();
        let dialog = loaded_dialog(&service);
        assert_eq!(dialog.reasons().len(), 2);
        assert!(!dialog.can_submit());
    }

    #[test]
    fn failed_reason_fetch_leaves_list_empty() {
        let service = StubFlagService {
            reasons: Err("offline".to_string()),
            ..StubFlagService::accepting()
        };
        let mut dialog = FlagDialog::new("42");
        assert!(dialog.load_reasons(&service).is_err());
        assert!(dialog.reasons().is_empty());
    }

    #[test]
    fn label_key_uses_reason_id() {
        assert_eq!(
            FlagReason::new("spam", "Spam").label_key(),
            "flag_message_reason_id_spam"
        );
    }

    #[test]
    fn selecting_unknown_reason_is_ignored() {
        let service = StubFlagService::accepting();
        let mut dialog = loaded_dialog(&service);
        assert!(!dialog.select_reason("nope"));
        assert!(dialog.selected_reason().is_none());
    }

    #[test]
    fn selecting_reason_clears_notice() {
        let service = StubFlagService::accepting();
        let mut dialog = loaded_dialog(&service);
        dialog.set_remark(&"x".repeat(REMARK_CHARACTER_LIMIT + 1));
        assert!(dialog.notice().is_some());
        assert!(dialog.select_reason("spam"));
        assert!(dialog.notice().is_none());
        assert!(dialog.is_selected(&dialog.reasons()[0]));
    }

    #[test]
    fn long_remark_is_truncated_with_notice() {
        let mut dialog = FlagDialog::new("42");
        dialog.set_remark(&"é".repeat(REMARK_CHARACTER_LIMIT + 20));
        assert_eq!(dialog.remark().chars().count(), REMARK_CHARACTER_LIMIT);
        assert_eq!(
            dialog.notice().map(FlagNotice::key),
            Some("flag_message_character_limit_reached")
        );

        dialog.clear_notice();
        assert!(dialog.notice().is_none());

        dialog.set_remark(&"x".repeat(REMARK_CHARACTER_LIMIT + 1));
        dialog.set_remark("short");
        assert_eq!(dialog.remark(), "short");
        assert!(dialog.notice().is_none());
    }

    #[test]
    fn submit_without_selection_sends_nothing() {
        let service = StubFlagService::accepting();
        let mut dialog = loaded_dialog(&service);
        assert!(matches!(dialog.submit(&service), SubmitOutcome::NoSelection));
        assert!(service.submissions.borrow().is_empty());
    }

    #[test]
    fn submit_trims_remark_and_omits_blank_ones() {
        let service = StubFlagService::accepting();
        let mut dialog = loaded_dialog(&service);
        dialog.select_reason("harassment");
        dialog.set_remark("   ");
        assert!(matches!(dialog.submit(&service), SubmitOutcome::Submitted));

        dialog.set_remark("  rude reply \n");
        dialog.submit(&service);

        let sent = service.submissions.borrow();
        assert_eq!(sent[0], ("42".to_string(), "harassment".to_string(), None));
        assert_eq!(sent[1].2.as_deref(), Some("rude reply"));
        assert!(!dialog.is_loading());
    }

    #[test]
    fn declined_submit_keeps_dialog_open_with_notice() {
        let service = StubFlagService {
            accept: Ok(false),
            ..StubFlagService::accepting()
        };
        let mut dialog = loaded_dialog(&service);
        dialog.select_reason("spam");
        assert!(matches!(dialog.submit(&service), SubmitOutcome::Rejected));
        assert_eq!(dialog.notice(), Some(FlagNotice::SubmitFailed));
    }

    #[test]
    fn failed_submit_surfaces_error() {
        let service = StubFlagService {
            accept: Err("timeout".to_string()),
            ..StubFlagService::accepting()
        };
        let mut dialog = loaded_dialog(&service);
        dialog.select_reason("spam");
        match dialog.submit(&service) {
            SubmitOutcome::Failed(e) => assert!(e.to_string().contains("timeout")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(dialog.notice().map(FlagNotice::key), Some("flag_message_error"));
    }
}
