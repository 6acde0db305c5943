//! Session Stream Parser
//!
//! Turns the raw byte stream of a live game session into map writes:
//! - ANSI escape removal and line segmentation
//! - The ordered complete-line classifier
//! - Haggle and login suggestions for unterminated prompt lines

pub mod ansi;
pub mod engine;
pub mod login;
pub mod negotiation;
pub mod patterns;
pub mod segmenter;
pub mod session;

// Re-exports
pub use ansi::{clean_line, strip_ansi};
pub use engine::{LineKind, StreamParser, Suggestion, SuggestionKind, DEFAULT_DEBOUNCE};
pub use login::LoginScript;
pub use negotiation::{Negotiation, TradeOperation, TradeSource};
pub use segmenter::LineSegmenter;
pub use session::SessionContext;
