//! Streaming translator trait
//!
//! This module defines the `StreamingTranslator` trait for provider abstraction,
//! so the orchestrator can run against Gemini or the mock without knowing which.
//!
//! # Example
//!
//! ```ignore
//! use tsuyaku::mt::{GeminiProvider, StreamingTranslator, TranslationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GeminiProvider::from_env()?;
//!     let request = TranslationRequest::new("Hello", "Japanese", "");
//!
//!     let text = provider
//!         .translate(&request, &mut |so_far| println!("{}", so_far))
//!         .await?;
//!     println!("final: {}", text);
//!     Ok(())
//! }
//! ```

use crate::mt::error::MtResult;
use crate::mt::prompt::TranslationRequest;
use crate::mt::sse::accumulate;
use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;

/// Lazy, finite stream of text chunks as they arrive from a provider.
///
/// Each item is the new text only. It cannot be restarted; a new request
/// has to be opened for another attempt.
pub type TextStream = Pin<Box<dyn Stream<Item = MtResult<String>> + Send>>;

/// Callback receiving the cumulative translation after every fragment
pub type FragmentCallback<'a> = dyn FnMut(&str) + Send + 'a;

/// Generic trait for streaming translation providers
///
/// Implementations only open the chunk stream; accumulation and fragment
/// delivery are shared through the provided [`StreamingTranslator::translate`].
#[async_trait]
pub trait StreamingTranslator: Send + Sync {
    /// Fail fast when the provider cannot make a request at all, e.g. a
    /// missing credential. Called before any network activity.
    fn check_ready(&self) -> MtResult<()> {
        Ok(())
    }

    /// Send the request and return the response as a chunk stream
    async fn open_stream(&self, request: &TranslationRequest) -> MtResult<TextStream>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;

    /// Translate `request`, calling `on_fragment` with the cumulative text
    /// after each chunk, and return the full text when the stream ends.
    ///
    /// Fragments already delivered are not retracted when the stream fails
    /// part way through.
    async fn translate(
        &self,
        request: &TranslationRequest,
        on_fragment: &mut FragmentCallback<'_>,
    ) -> MtResult<String> {
        self.check_ready()?;

        let chunks = self.open_stream(request).await?;
        let mut fragments = std::pin::pin!(accumulate(chunks));
        let mut latest = String::new();
        let mut count = 0usize;

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            count += 1;
            on_fragment(&fragment);
            latest = fragment;
        }

        tracing::debug!(
            provider = self.provider_name(),
            fragments = count,
            chars = latest.chars().count(),
            "stream finished"
        );
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::MtError;
    use futures_util::stream;

    struct Scripted(Vec<MtResult<String>>);

    #[async_trait]
    impl StreamingTranslator for Scripted {
        async fn open_stream(&self, _request: &TranslationRequest) -> MtResult<TextStream> {
            Ok(Box::pin(stream::iter(self.0.clone())))
        }

        fn provider_name(&self) -> &str {
            "Scripted"
        }
    }

    struct NotReady;

    #[async_trait]
    impl StreamingTranslator for NotReady {
        fn check_ready(&self) -> MtResult<()> {
            Err(MtError::ConfigError("no key".to_string()))
        }

        async fn open_stream(&self, _request: &TranslationRequest) -> MtResult<TextStream> {
            panic!("open_stream must not be called when not ready");
        }

        fn provider_name(&self) -> &str {
            "NotReady"
        }
    }

    fn request() -> TranslationRequest {
        TranslationRequest::new("Hello", "Japanese", "")
    }

    #[tokio::test]
    async fn test_translate_delivers_cumulative_fragments() {
        let provider = Scripted(vec![Ok("こ".to_string()), Ok("んにちは".to_string())]);
        let mut seen = Vec::new();
        let result = provider
            .translate(&request(), &mut |f| seen.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(result, "こんにちは");
        assert_eq!(seen, vec!["こ", "こんにちは"]);
    }

    #[tokio::test]
    async fn test_translate_empty_stream() {
        let provider = Scripted(vec![]);
        let mut calls = 0;
        let result = provider
            .translate(&request(), &mut |_| calls += 1)
            .await
            .unwrap();
        assert_eq!(result, "");
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_translate_keeps_partial_fragments_on_error() {
        let provider = Scripted(vec![
            Ok("Hel".to_string()),
            Err(MtError::NetworkError("reset".to_string())),
        ]);
        let mut seen = Vec::new();
        let result = provider
            .translate(&request(), &mut |f| seen.push(f.to_string()))
            .await;
        assert_eq!(result, Err(MtError::NetworkError("reset".to_string())));
        assert_eq!(seen, vec!["Hel"]);
    }

    #[tokio::test]
    async fn test_translate_checks_readiness_first() {
        let result = NotReady.translate(&request(), &mut |_| {}).await;
        assert!(matches!(result, Err(MtError::ConfigError(_))));
    }
}
