//! # Core Logic
//!
//! Everything that decides what a message shows. It knows nothing about
//! any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Sanitizer (rebuild)  │
//!                    │  • Formatters (spans)   │
//!                    │  • Flag / mention /     │
//!                    │    preview models       │
//!                    │                         │
//!                    │  No terminal. No net.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    CLI     │      │  Backend   │
//!     │  Adapter   │      │  (main)    │      │ (FlagSvc)  │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sanitizer`]: raw markup → [`fragment::Fragment`], literal fallback on failure
//! - [`dom`]: html5ever parsing behind a small owned tree
//! - [`fragment`]: the rebuilt output tree
//! - [`formatter`]: per-span listener hooks, including mentions
//! - [`flag`], [`mentions`], [`preview`]: view models around messages
//! - [`config`]: file, env and CLI settings

pub mod config;
pub mod dom;
pub mod flag;
pub mod formatter;
pub mod fragment;
pub mod mentions;
pub mod preview;
pub mod sanitizer;
