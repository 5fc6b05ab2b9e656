//! The closed table of languages offered by the translator.
//!
//! Auto-detect is only meaningful on the source side; every other entry can
//! be used on both sides.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    Auto,
    En,
    Ja,
    ZhCn,
    ZhTw,
}

/// Fallback target used when a swap moves the old target into the source slot.
pub const DEFAULT_TARGET: Language = Language::En;

/// Languages offered in the source picker, in display order.
pub const SOURCE_LANGUAGES: [Language; 5] = [
    Language::Auto,
    Language::En,
    Language::Ja,
    Language::ZhCn,
    Language::ZhTw,
];

/// Languages offered in the target picker, in display order.
pub const TARGET_LANGUAGES: [Language; 4] =
    [Language::En, Language::Ja, Language::ZhCn, Language::ZhTw];

impl Language {
    /// Stable code used in storage
    pub fn code(self) -> &'static str {
        match self {
            Language::Auto => "AUTO",
            Language::En => "EN",
            Language::Ja => "JA",
            Language::ZhCn => "ZH_CN",
            Language::ZhTw => "ZH_TW",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::Auto => "Detect Language",
            Language::En => "English",
            Language::Ja => "Japanese",
            Language::ZhCn => "Chinese (Simplified)",
            Language::ZhTw => "Chinese (Traditional)",
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Language::Auto => "✨",
            Language::En => "🇺🇸",
            Language::Ja => "🇯🇵",
            Language::ZhCn => "🇨🇳",
            Language::ZhTw => "🇹🇼",
        }
    }

    /// Name of the language as written into the prompt
    pub fn api_name(self) -> &'static str {
        match self {
            Language::Auto => "the detected language",
            Language::En => "English",
            Language::Ja => "Japanese",
            Language::ZhCn => "Simplified Chinese",
            Language::ZhTw => "Traditional Chinese",
        }
    }

    pub fn is_auto(self) -> bool {
        self == Language::Auto
    }

    pub fn is_valid_target(self) -> bool {
        !self.is_auto()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    /// No entry in the table matches the given name
    Unknown(String),
    /// Auto-detect was requested as the translation target
    AutoAsTarget,
}

impl std::fmt::Display for LanguageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageError::Unknown(name) => write!(f, "Unknown language: {}", name),
            LanguageError::AutoAsTarget => {
                write!(f, "Auto-detect cannot be used as the target language")
            }
        }
    }
}

impl std::error::Error for LanguageError {}

impl FromStr for Language {
    type Err = LanguageError;

    /// Accepts the storage code, the display label or a short alias, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('-', "_");
        let alias = match needle.as_str() {
            "auto" | "detect" => Some(Language::Auto),
            "en" | "english" => Some(Language::En),
            "ja" | "jp" | "japanese" => Some(Language::Ja),
            "zh" | "zh_cn" | "zh_hans" => Some(Language::ZhCn),
            "zh_tw" | "zh_hant" => Some(Language::ZhTw),
            _ => None,
        };
        if let Some(language) = alias {
            return Ok(language);
        }

        SOURCE_LANGUAGES
            .into_iter()
            .find(|l| l.label().to_lowercase() == s.trim().to_lowercase())
            .ok_or_else(|| LanguageError::Unknown(s.to_string()))
    }
}
