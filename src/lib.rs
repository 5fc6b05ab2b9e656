//! Streaming translation front-end for hosted language models.
//!
//! Source text goes to a generative-text API together with the user's custom
//! translation rules; the translation streams back fragment by fragment into
//! the session state, and every finished translation lands in a bounded local
//! history.
//!
//! - [`mt`] - prompt composition, the `StreamingTranslator` trait, Gemini and mock providers
//! - [`orchestrator`] - the state machine driving one translation end to end
//! - [`session`] - session and view state read by front-ends
//! - [`history`] - immutable history records, capped at 50
//! - [`store`] - key-value persistence for history and rules
//! - [`language`] - the fixed language table
//! - [`config`] - provider configuration

pub mod config;
pub mod history;
pub mod language;
pub mod mt;
pub mod orchestrator;
pub mod session;
pub mod store;


// Re-export the types a front-end needs
pub use config::GeminiConfig;
pub use history::{HistoryList, HistoryRecord, MAX_HISTORY};
pub use language::{Language, LanguageError, SOURCE_LANGUAGES, TARGET_LANGUAGES};
pub use orchestrator::{IgnoreReason, Orchestrator, TranslateOutcome, user_message};
pub use session::{COPY_FEEDBACK, Pane, SessionState, TranslationPhase, ViewState};
pub use store::{FileStore, KeyValueStore, MemoryStore, Persistence};
