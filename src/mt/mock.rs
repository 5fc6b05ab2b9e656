//! Mock streaming translator for testing
//!
//! This module provides a deterministic, API-free translator for exercising
//! the orchestrator without API keys or network access. It is also what the
//! CLI uses with `--mock`.
//!
//! # Example
//!
//! ```ignore
//! use tsuyaku::mt::{MockMode, MockTranslator, StreamingTranslator, TranslationRequest};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let request = TranslationRequest::new("hello", "French", "");
//!     let result = mock.translate(&request, &mut |_| {}).await.unwrap();
//!     assert_eq!(result, "hello_French");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::prompt::TranslationRequest;
use crate::mt::translator::{StreamingTranslator, TextStream};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock streaming modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Stream the input back word by word, then `_<target language>`:
    /// "hello world" → "hello world_Japanese"
    Suffix,

    /// Stream exactly these chunks, whatever the request
    Chunks(Vec<String>),

    /// Stream these chunks, then fail with a network error carrying the message
    FailAfter(Vec<String>, String),

    /// Simulate a missing credential: `check_ready` fails
    Unconfigured,
}

/// Mock translator that simulates a streaming provider
///
/// Counts opened streams and remembers the last request so tests can check
/// what would have gone over the wire.
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated delay before each chunk (in milliseconds)
    delay_ms: u64,
    requests: AtomicUsize,
    last_request: Mutex<Option<TranslationRequest>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockTranslator that waits `delay_ms` before each chunk
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            requests: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Shorthand for [`MockMode::Chunks`]
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockMode::Chunks(chunks.into_iter().map(Into::into).collect()))
    }

    /// Number of streams opened so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TranslationRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn script(&self, request: &TranslationRequest) -> Vec<MtResult<String>> {
        match &self.mode {
            MockMode::Suffix => {
                let mut items: Vec<MtResult<String>> = request
                    .text
                    .split_inclusive(' ')
                    .map(|word| Ok(word.to_string()))
                    .collect();
                items.push(Ok(format!("_{}", request.target_language)));
                items
            }
            MockMode::Chunks(chunks) => chunks.iter().cloned().map(Ok).collect(),
            MockMode::FailAfter(chunks, message) => {
                let mut items: Vec<MtResult<String>> = chunks.iter().cloned().map(Ok).collect();
                items.push(Err(MtError::NetworkError(message.clone())));
                items
            }
            MockMode::Unconfigured => Vec::new(),
        }
    }
}

#[async_trait]
impl StreamingTranslator for MockTranslator {
    fn check_ready(&self) -> MtResult<()> {
        match self.mode {
            MockMode::Unconfigured => Err(MtError::ConfigError(
                "mock translator has no API key".to_string(),
            )),
            _ => Ok(()),
        }
    }

    async fn open_stream(&self, request: &TranslationRequest) -> MtResult<TextStream> {
        self.check_ready()?;
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let delay = Duration::from_millis(self.delay_ms);
        let chunks = stream::iter(self.script(request)).then(move |item| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(chunks))
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
