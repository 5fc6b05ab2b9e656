/// Remote Translation Module
///
/// This module wraps the call to a hosted language model that streams a
/// translation back. It builds the prompt from the source text, the target
/// language and the user's custom rules, opens the response stream, and hands
/// every cumulative fragment to a callback as it arrives.
///
/// # Overview
///
/// 1. **Prompt** - Rules block, translation instruction and the fixed system persona
/// 2. **Translator Trait** - `StreamingTranslator`, with shared fragment accumulation
/// 3. **SSE Decoding** - `text/event-stream` bodies to text chunks to cumulative fragments
/// 4. **Providers** - Gemini over HTTP, and a deterministic mock
///
/// # Example
///
/// ```ignore
/// use tsuyaku::mt::{GeminiProvider, StreamingTranslator, TranslationRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = GeminiProvider::from_env()?;
///     let request = TranslationRequest::new("Hello", "Japanese", "Use polite form");
///
///     let text = provider
///         .translate(&request, &mut |so_far| eprint!("\r{}", so_far))
///         .await?;
///     println!("{}", text);
///     Ok(())
/// }
/// ```
pub mod error;
pub mod gemini;
pub mod mock;
pub mod prompt;
pub mod sse;
pub mod translator;

pub use error::{MtError, MtResult};
pub use gemini::GeminiProvider;
pub use mock::{MockMode, MockTranslator};
pub use prompt::{SYSTEM_INSTRUCTION, TranslationRequest, build_prompt};
pub use sse::{accumulate, text_chunks};
pub use translator::{FragmentCallback, StreamingTranslator, TextStream};
