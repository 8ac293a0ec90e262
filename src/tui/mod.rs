//! # TUI Adapter
//!
//! The ratatui-specific layer. Turns rebuilt fragments and assistant
//! markdown into styled terminal text.
//!
//! This is the only module that knows about ratatui.

pub mod bubble;
pub mod component;
pub mod markdown;
