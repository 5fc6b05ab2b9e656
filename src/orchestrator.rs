//! Translation orchestrator
//!
//! Owns the session state, the history list and the custom rules, and is the
//! only thing that changes them. A translation runs
//! `Idle -> Requesting -> {Succeeded, Failed}`; every fragment streamed by the
//! provider replaces the displayed translation, and a finished translation is
//! recorded at the front of the history.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tsuyaku::mt::{MockMode, MockTranslator};
//! use tsuyaku::store::MemoryStore;
//! use tsuyaku::{Language, Orchestrator};
//!
//! # async fn run() {
//! let mut app = Orchestrator::new(
//!     Arc::new(MockTranslator::new(MockMode::Suffix)),
//!     Arc::new(MemoryStore::new()),
//! );
//! app.set_source_text("Hello");
//! app.set_target_language(Language::Ja).unwrap();
//! let outcome = app.translate(|state| println!("{}", state.translated_text)).await;
//! # }
//! ```

use crate::history::{HistoryList, HistoryRecord, RecordIds};
use crate::language::{DEFAULT_TARGET, Language, LanguageError};
use crate::mt::{MtError, StreamingTranslator, TranslationRequest};
use crate::session::{Pane, SessionState, TranslationPhase, ViewState};
use crate::store::{KeyValueStore, Persistence};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const GENERIC_FAILURE: &str = "An error occurred during translation.";
const MISSING_KEY: &str = "API Key is missing. Please check your environment configuration.";

/// Why a translate trigger did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Source text is empty or whitespace
    EmptyInput,
    /// A request is already running for this session
    InFlight,
}

/// Terminal result of one translate trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    Ignored(IgnoreReason),
    Succeeded(HistoryRecord),
    /// Carries the message also stored in `last_error`
    Failed(String),
}

/// Convert a provider error into the single message shown to the user.
///
/// Configuration problems are shown as-is; everything else keeps its kind prefix.
pub fn user_message(err: &MtError) -> String {
    let message = match err {
        MtError::ConfigError(msg) if msg.trim().is_empty() => MISSING_KEY.to_string(),
        MtError::ConfigError(msg) => msg.clone(),
        other => other.to_string(),
    };
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}

/// Marks the session as requesting for as long as it lives.
///
/// Dropping it without `finish` (the translate future was dropped mid-stream)
/// puts the session back to `Idle`, keeping whatever text already arrived.
struct InFlight<'a> {
    session: &'a mut SessionState,
}

impl<'a> InFlight<'a> {
    fn begin(session: &'a mut SessionState) -> Self {
        session.last_error = None;
        session.translated_text.clear();
        session.phase = TranslationPhase::Requesting;
        Self { session }
    }

    fn state(&self) -> &SessionState {
        &*self.session
    }

    fn show_fragment(&mut self, fragment: &str) {
        self.session.translated_text.clear();
        self.session.translated_text.push_str(fragment);
    }

    fn finish(self, phase: TranslationPhase, error: Option<String>) {
        self.session.phase = phase;
        self.session.last_error = error;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.phase == TranslationPhase::Requesting {
            debug!("translation abandoned before completion");
            self.session.phase = TranslationPhase::Idle;
        }
    }
}

pub struct Orchestrator {
    translator: Arc<dyn StreamingTranslator>,
    persistence: Persistence,
    session: SessionState,
    view: ViewState,
    history: HistoryList,
    rules: String,
    ids: RecordIds,
}

impl Orchestrator {
    /// Create a session, loading history and rules from `store`
    pub fn new(translator: Arc<dyn StreamingTranslator>, store: Arc<dyn KeyValueStore>) -> Self {
        let persistence = Persistence::new(store);
        let history = persistence.load_history();
        let rules = persistence.load_rules();
        debug!(
            provider = translator.provider_name(),
            history = history.len(),
            has_rules = !rules.trim().is_empty(),
            "session loaded"
        );

        Self {
            translator,
            persistence,
            session: SessionState::default(),
            view: ViewState::default(),
            ids: RecordIds::after(&history),
            history,
            rules,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    pub fn set_source_text(&mut self, text: impl Into<String>) {
        self.session.source_text = text.into();
    }

    pub fn set_source_language(&mut self, language: Language) {
        self.session.source_language = language;
    }

    pub fn set_target_language(&mut self, language: Language) -> Result<(), LanguageError> {
        if !language.is_valid_target() {
            return Err(LanguageError::AutoAsTarget);
        }
        self.session.target_language = language;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Translation
    // ---------------------------------------------------------------------

    /// Run one translation of the current source text.
    ///
    /// `on_update` sees the session after the request starts, after every
    /// fragment, and once more at the terminal state. Empty input and a
    /// request already in flight are ignored without touching the session.
    pub async fn translate<F>(&mut self, mut on_update: F) -> TranslateOutcome
    where
        F: FnMut(&SessionState) + Send,
    {
        if self.session.source_text.trim().is_empty() {
            debug!("translate ignored: empty input");
            return TranslateOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if self.session.is_translating() {
            debug!("translate ignored: request already in flight");
            return TranslateOutcome::Ignored(IgnoreReason::InFlight);
        }

        if let Err(e) = self.translator.check_ready() {
            let message = user_message(&e);
            error!(provider = self.translator.provider_name(), "translation not attempted: {}", e);
            self.session.last_error = Some(message.clone());
            self.session.phase = TranslationPhase::Failed;
            on_update(&self.session);
            return TranslateOutcome::Failed(message);
        }

        let source_language = self.session.source_language;
        let target_language = self.session.target_language;
        let original = self.session.source_text.clone();
        let request = TranslationRequest::new(&original, target_language.api_name(), &self.rules);
        let id = self.ids.next(Utc::now());

        debug!(
            id = %id,
            from = source_language.code(),
            to = target_language.code(),
            chars = original.chars().count(),
            "translation started"
        );

        let translator = &self.translator;
        let mut flight = InFlight::begin(&mut self.session);
        on_update(flight.state());

        let result = translator
            .translate(&request, &mut |fragment: &str| {
                flight.show_fragment(fragment);
                on_update(flight.state());
            })
            .await;

        match result {
            Ok(text) => {
                flight.show_fragment(&text);
                flight.finish(TranslationPhase::Succeeded, None);

                let record = HistoryRecord::new(
                    id,
                    source_language,
                    target_language,
                    original,
                    text,
                    Utc::now(),
                );
                self.history.push(record.clone());
                self.persist_history();
                info!(id = record.id(), history = self.history.len(), "translation finished");

                on_update(&self.session);
                TranslateOutcome::Succeeded(record)
            }
            Err(e) => {
                let message = user_message(&e);
                error!(provider = translator.provider_name(), "translation failed: {}", e);
                flight.finish(TranslationPhase::Failed, Some(message.clone()));

                on_update(&self.session);
                TranslateOutcome::Failed(message)
            }
        }
    }

    /// Exchange source and target.
    ///
    /// Auto-detect cannot become a target: with an auto source, the old target
    /// moves to the source slot and the target falls back to the default.
    /// When a translation is showing, the two texts are exchanged as well.
    pub fn swap_languages(&mut self) {
        let session = &mut self.session;
        if session.source_language.is_auto() {
            session.source_language = session.target_language;
            session.target_language = DEFAULT_TARGET;
        } else {
            std::mem::swap(&mut session.source_language, &mut session.target_language);
        }

        if !session.translated_text.is_empty() {
            std::mem::swap(&mut session.source_text, &mut session.translated_text);
        }
    }

    /// Reset both texts and the error; history and rules are kept
    pub fn clear_source(&mut self) {
        self.session.source_text.clear();
        self.session.translated_text.clear();
        self.session.last_error = None;
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    pub fn open_history(&mut self) {
        self.view.history_open = true;
    }

    pub fn close_history(&mut self) {
        self.view.history_open = false;
    }

    /// Load the record with `id` into the session. Returns false if there is none.
    pub fn select_history(&mut self, id: &str) -> bool {
        match self.history.get(id).cloned() {
            Some(record) => {
                self.restore(&record);
                true
            }
            None => false,
        }
    }

    /// Replace languages and texts with those of `record` and close the history view
    pub fn restore(&mut self, record: &HistoryRecord) {
        self.session.source_language = record.source_language();
        self.session.target_language = record.target_language();
        self.session.source_text = record.original().to_string();
        self.session.translated_text = record.translated().to_string();
        self.view.history_open = false;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    // ---------------------------------------------------------------------
    // Custom rules
    // ---------------------------------------------------------------------

    /// Replace the rules used by every following translation
    pub fn save_rules(&mut self, rules: impl Into<String>) {
        self.rules = rules.into();
        if let Err(e) = self.persistence.save_rules(&self.rules) {
            warn!("Failed to persist custom rules: {}", e);
        }
    }

    /// Open the editor with a draft of the saved rules
    pub fn open_rules_editor(&mut self) {
        self.view.rules_draft = Some(self.rules.clone());
    }

    /// Change the draft; ignored if the editor is closed
    pub fn edit_rules_draft(&mut self, draft: impl Into<String>) {
        if let Some(current) = self.view.rules_draft.as_mut() {
            *current = draft.into();
        }
    }

    /// Save the draft and close the editor. Returns false if it was not open.
    pub fn save_rules_draft(&mut self) -> bool {
        match self.view.rules_draft.take() {
            Some(draft) => {
                self.save_rules(draft);
                true
            }
            None => false,
        }
    }

    /// Close the editor, discarding the draft
    pub fn cancel_rules_editor(&mut self) {
        self.view.rules_draft = None;
    }

    // ---------------------------------------------------------------------
    // Copy
    // ---------------------------------------------------------------------

    /// Text to put on the clipboard for `pane`, lighting its indicator.
    ///
    /// Returns `None` (and leaves the indicator alone) when the pane is empty.
    pub fn copy(&mut self, pane: Pane, now: Instant) -> Option<String> {
        let text = match pane {
            Pane::Source => &self.session.source_text,
            Pane::Translated => &self.session.translated_text,
        };
        if text.is_empty() {
            return None;
        }
        let text = text.clone();
        self.view.copied.mark(pane, now);
        Some(text)
    }

    pub fn is_copied(&self, pane: Pane, now: Instant) -> bool {
        self.view.copied.is_active(pane, now)
    }

    fn persist_history(&self) {
        if let Err(e) = self.persistence.save_history(&self.history) {
            warn!("Failed to persist history: {}", e);
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.translator.provider_name())
            .field("session", &self.session)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::{MockMode, MockTranslator};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use std::time::Duration;

    fn orchestrator(mode: MockMode) -> Orchestrator {
        Orchestrator::new(Arc::new(MockTranslator::new(mode)), Arc::new(MemoryStore::new()))
    }

    fn record(id: &str) -> HistoryRecord {
        HistoryRecord::new(
            id,
            Language::ZhCn,
            Language::En,
            "你好",
            "Hello",
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        )
    }

    // ========== Swap ==========

    #[test]
    fn test_swap_twice_restores_pair() {
        let mut app = orchestrator(MockMode::Suffix);
        app.set_source_language(Language::Ja);
        app.set_target_language(Language::ZhTw).unwrap();
        app.swap_languages();
        assert_eq!(app.session().source_language, Language::ZhTw);
        assert_eq!(app.session().target_language, Language::Ja);
        app.swap_languages();
        assert_eq!(app.session().source_language, Language::Ja);
        assert_eq!(app.session().target_language, Language::ZhTw);
    }

    #[test]
    fn test_swap_with_auto_source() {
        let mut app = orchestrator(MockMode::Suffix);
        app.set_target_language(Language::Ja).unwrap();
        app.swap_languages();
        assert_eq!(app.session().source_language, Language::Ja);
        assert_eq!(app.session().target_language, DEFAULT_TARGET);
        assert!(!app.session().source_language.is_auto());
    }

    #[test]
    fn test_swap_exchanges_texts_only_with_result() {
        let mut app = orchestrator(MockMode::Suffix);
        app.set_source_language(Language::En);
        app.set_target_language(Language::Ja).unwrap();
        app.set_source_text("Hello");
        app.swap_languages();
        assert_eq!(app.session().source_text, "Hello");

        app.session.translated_text = "こんにちは".to_string();
        app.swap_languages();
        assert_eq!(app.session().source_text, "こんにちは");
        assert_eq!(app.session().translated_text, "Hello");
    }

    #[test]
    fn test_target_rejects_auto() {
        let mut app = orchestrator(MockMode::Suffix);
        assert_eq!(
            app.set_target_language(Language::Auto),
            Err(LanguageError::AutoAsTarget)
        );
        assert_eq!(app.session().target_language, Language::En);
    }

    // ========== Clear / history selection ==========

    #[test]
    fn test_clear_source_keeps_history_and_rules() {
        let store = MemoryStore::new();
        let mut app = Orchestrator::new(
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            Arc::new(store),
        );
        app.save_rules("rule");
        app.history.push(record("1"));
        app.set_source_text("text");
        app.session.translated_text = "訳".to_string();
        app.session.last_error = Some("boom".to_string());

        app.clear_source();
        assert_eq!(app.session().source_text, "");
        assert_eq!(app.session().translated_text, "");
        assert_eq!(app.session().last_error, None);
        assert_eq!(app.history().len(), 1);
        assert_eq!(app.rules(), "rule");
    }

    #[test]
    fn test_select_history_restores_record() {
        let mut app = orchestrator(MockMode::Suffix);
        app.history.push(record("42"));
        app.open_history();
        assert!(app.select_history("42"));

        let session = app.session();
        assert_eq!(session.source_language, Language::ZhCn);
        assert_eq!(session.target_language, Language::En);
        assert_eq!(session.source_text, "你好");
        assert_eq!(session.translated_text, "Hello");
        assert!(!app.view().history_open);
    }

    #[test]
    fn test_select_unknown_history() {
        let mut app = orchestrator(MockMode::Suffix);
        app.open_history();
        assert!(!app.select_history("nope"));
        assert!(app.view().history_open);
    }

    // ========== Rules editor ==========

    #[test]
    fn test_rules_editor_save() {
        let mut app = orchestrator(MockMode::Suffix);
        app.save_rules("old");
        app.open_rules_editor();
        assert_eq!(app.view().rules_draft.as_deref(), Some("old"));
        app.edit_rules_draft("new");
        assert_eq!(app.rules(), "old");
        assert!(app.save_rules_draft());
        assert_eq!(app.rules(), "new");
        assert!(!app.view().rules_editor_open());
    }

    #[test]
    fn test_rules_editor_cancel() {
        let mut app = orchestrator(MockMode::Suffix);
        app.save_rules("keep");
        app.open_rules_editor();
        app.edit_rules_draft("discard");
        app.cancel_rules_editor();
        assert_eq!(app.rules(), "keep");
        assert!(!app.view().rules_editor_open());
        assert!(!app.save_rules_draft());
    }

    #[test]
    fn test_edit_draft_while_closed_is_ignored() {
        let mut app = orchestrator(MockMode::Suffix);
        app.edit_rules_draft("x");
        assert_eq!(app.view().rules_draft, None);
    }

    // ========== Copy ==========

    #[test]
    fn test_copy_marks_indicator() {
        let mut app = orchestrator(MockMode::Suffix);
        let now = Instant::now();
        assert_eq!(app.copy(Pane::Source, now), None);
        assert!(!app.is_copied(Pane::Source, now));

        app.set_source_text("Hello");
        assert_eq!(app.copy(Pane::Source, now), Some("Hello".to_string()));
        assert!(app.is_copied(Pane::Source, now + Duration::from_secs(1)));
        assert!(!app.is_copied(Pane::Source, now + Duration::from_secs(2)));
        assert!(!app.is_copied(Pane::Translated, now));
    }

    // ========== Error messages ==========

    #[test]
    fn test_user_message() {
        assert_eq!(
            user_message(&MtError::ConfigError(String::new())),
            MISSING_KEY
        );
        assert_eq!(
            user_message(&MtError::ConfigError(MISSING_KEY.to_string())),
            MISSING_KEY
        );
        assert_eq!(
            user_message(&MtError::NetworkError("reset".to_string())),
            "Network error: reset"
        );
        assert_eq!(user_message(&MtError::Other(String::new())), GENERIC_FAILURE);
    }

    // ========== Guards ==========

    #[tokio::test]
    async fn test_empty_input_ignored() {
        let mut app = orchestrator(MockMode::Suffix);
        app.set_source_text("   \n");
        let mut updates = 0;
        let outcome = app.translate(|_| updates += 1).await;
        assert_eq!(outcome, TranslateOutcome::Ignored(IgnoreReason::EmptyInput));
        assert_eq!(updates, 0);
        assert_eq!(app.session().phase, TranslationPhase::Idle);
    }

    #[tokio::test]
    async fn test_in_flight_ignored() {
        let mut app = orchestrator(MockMode::Suffix);
        app.set_source_text("Hello");
        app.session.phase = TranslationPhase::Requesting;
        let outcome = app.translate(|_| {}).await;
        assert_eq!(outcome, TranslateOutcome::Ignored(IgnoreReason::InFlight));
        assert!(app.history().is_empty());
    }
}
