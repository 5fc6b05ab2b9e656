//! Prompt composition for the translation request

/// Persona sent as the system instruction with every request.
///
/// Asks for a faithful, literal translation that keeps register and
/// terminology, with no commentary around the result.
pub const SYSTEM_INSTRUCTION: &str = "あなたはプロの翻訳家です。与えられたテキストを、文脈やニュアンスを正確に維持したまま指定の言語に翻訳してください。
不自然な意訳は避け、原文の構造や表現をできるだけ尊重すること。
専門用語や固有名詞は一貫性を保つこと。
出力は翻訳結果のみを返し、余計な解説は含めないこと。";

const RULES_HEADER: &str =
    "[IMPORTANT INSTRUCTIONS & TERMINOLOGY]\nFollow these specific rules provided by the user:\n";

const RULES_SEPARATOR: &str = "--------------------------------";

/// One translation request as handed to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    /// Prompt name of the target language, e.g. "Japanese"
    pub target_language: String,
    /// User rules, included verbatim when not blank
    pub custom_rules: String,
}

impl TranslationRequest {
    pub fn new(text: &str, target_language: &str, custom_rules: &str) -> Self {
        Self {
            text: text.to_string(),
            target_language: target_language.to_string(),
            custom_rules: custom_rules.to_string(),
        }
    }

    /// The user-role prompt for this request
    pub fn prompt(&self) -> String {
        build_prompt(&self.text, &self.target_language, &self.custom_rules)
    }
}

/// Build the user prompt: an optional rules block, then the translation instruction.
pub fn build_prompt(text: &str, target_language: &str, custom_rules: &str) -> String {
    let mut prompt = String::new();

    if !custom_rules.trim().is_empty() {
        prompt.push_str(RULES_HEADER);
        prompt.push_str(custom_rules);
        prompt.push_str("\n\n");
        prompt.push_str(RULES_SEPARATOR);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "Translate the following text into {}:\n\n{}",
        target_language, text
    ));
    prompt
}
