//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::flag::{FlagError, FlagReason, FlagService};
use crate::core::formatter::{FormatterError, TextFormatter};
use crate::core::fragment::{ClassList, Element};

/// Records `name:classes:text` for every span it is handed.
pub struct RecordingFormatter {
    name: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingFormatter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shares `log` with other recorders so call order across them is visible.
    pub fn with_log(mut self, log: Rc<RefCell<Vec<String>>>) -> Self {
        self.log = log;
        self
    }

    pub fn shared_log(&self) -> Rc<RefCell<Vec<String>>> {
        self.log.clone()
    }
}

impl TextFormatter for RecordingFormatter {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_event_listeners(
        &self,
        element: &mut Element,
        classes: &ClassList,
    ) -> Result<(), FormatterError> {
        let classes: Vec<&str> = classes.iter().collect();
        self.log.borrow_mut().push(format!(
            "{}:{}:{}",
            self.name,
            classes.join(" "),
            element.text_content()
        ));
        Ok(())
    }
}

/// Rejects every span.
pub struct FailingFormatter;

impl TextFormatter for FailingFormatter {
    fn name(&self) -> &str {
        "failing"
    }

    fn register_event_listeners(
        &self,
        _element: &mut Element,
        _classes: &ClassList,
    ) -> Result<(), FormatterError> {
        Err(FormatterError {
            formatter: self.name().to_string(),
            message: "listener registration failed".to_string(),
        })
    }
}

/// Panics instead of returning an error.
pub struct PanickingFormatter;

impl TextFormatter for PanickingFormatter {
    fn name(&self) -> &str {
        "panicking"
    }

    fn register_event_listeners(
        &self,
        _element: &mut Element,
        _classes: &ClassList,
    ) -> Result<(), FormatterError> {
        panic!("boom")
    }
}

/// Scripted stand-in for the chat SDK's moderation endpoints.
pub struct StubFlagService {
    pub reasons: Result<Vec<FlagReason>, String>,
    pub accept: Result<bool, String>,
    pub submissions: RefCell<Vec<(String, String, Option<String>)>>,
}

impl StubFlagService {
    pub fn accepting() -> Self {
        Self {
            reasons: Ok(vec![
                FlagReason::new("spam", "Spam"),
                FlagReason::new("harassment", "Harassment"),
            ]),
            accept: Ok(true),
            submissions: RefCell::new(Vec::new()),
        }
    }
}

impl FlagService for StubFlagService {
    fn flag_reasons(&self) -> Result<Vec<FlagReason>, FlagError> {
        self.reasons.clone().map_err(FlagError::Backend)
    }

    fn submit(
        &self,
        message_id: &str,
        reason_id: &str,
        remark: Option<&str>,
    ) -> Result<bool, FlagError> {
        self.submissions.borrow_mut().push((
            message_id.to_string(),
            reason_id.to_string(),
            remark.map(str::to_string),
        ));
        self.accept.clone().map_err(FlagError::Backend)
    }
}
