//! Session state: what the user is looking at right now.
//!
//! Everything in here is mutated only through the orchestrator; front-ends
//! read it to render.

use crate::language::{DEFAULT_TARGET, Language};
use std::time::{Duration, Instant};

/// How long a pane shows its "copied" confirmation
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Lifecycle of the most recent translation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationPhase {
    #[default]
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub source_text: String,
    /// Cleared when a request starts, then the latest cumulative fragment
    pub translated_text: String,
    pub source_language: Language,
    /// Never [`Language::Auto`]
    pub target_language: Language,
    pub phase: TranslationPhase,
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            source_text: String::new(),
            translated_text: String::new(),
            source_language: Language::Auto,
            target_language: DEFAULT_TARGET,
            phase: TranslationPhase::Idle,
            last_error: None,
        }
    }
}

impl SessionState {
    pub fn is_translating(&self) -> bool {
        self.phase == TranslationPhase::Requesting
    }

    /// Whether a translate trigger would currently be accepted
    pub fn can_translate(&self) -> bool {
        !self.is_translating() && !self.source_text.trim().is_empty()
    }
}

/// The two text panes that offer a copy control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Source,
    Translated,
}

/// Per-pane "copied" confirmation with a fixed display window
#[derive(Debug, Clone, Default)]
pub struct CopyIndicators {
    source: Option<Instant>,
    translated: Option<Instant>,
}

impl CopyIndicators {
    pub fn mark(&mut self, pane: Pane, now: Instant) {
        *self.slot(pane) = Some(now);
    }

    /// True for [`COPY_FEEDBACK`] after the last `mark` of `pane`
    pub fn is_active(&self, pane: Pane, now: Instant) -> bool {
        let marked = match pane {
            Pane::Source => self.source,
            Pane::Translated => self.translated,
        };
        marked.is_some_and(|at| now.saturating_duration_since(at) < COPY_FEEDBACK)
    }

    fn slot(&mut self, pane: Pane) -> &mut Option<Instant> {
        match pane {
            Pane::Source => &mut self.source,
            Pane::Translated => &mut self.translated,
        }
    }
}

/// Open panels and transient indicators
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub history_open: bool,
    /// `Some(draft)` while the rules editor is open
    pub rules_draft: Option<String>,
    pub copied: CopyIndicators,
}

impl ViewState {
    pub fn rules_editor_open(&self) -> bool {
        self.rules_draft.is_some()
    }
}
