//! Translation targets and the translator seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Please enter text to translate")]
    EmptyText,
    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),
}

/// Target languages. Source text is always English.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    Fr,
    De,
    Ja,
    Zh,
    Ko,
    Pt,
    Ru,
    Ar,
    Hi,
}

impl Language {
    pub const SOURCE_NAME: &'static str = "English";

    pub const ALL: [Language; 10] = [
        Language::Es,
        Language::Fr,
        Language::De,
        Language::Ja,
        Language::Zh,
        Language::Ko,
        Language::Pt,
        Language::Ru,
        Language::Ar,
        Language::Hi,
    ];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Ja => "ja",
            Language::Zh => "zh",
            Language::Ko => "ko",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Ar => "ar",
            Language::Hi => "hi",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::Ja => "Japanese",
            Language::Zh => "Chinese",
            Language::Ko => "Korean",
            Language::Pt => "Portuguese",
            Language::Ru => "Russian",
            Language::Ar => "Arabic",
            Language::Hi => "Hindi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Accepts a code or an English name, any case.
impl FromStr for Language {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(needle) || l.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TranslateError::UnknownLanguage(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub target: Language,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<Translation, TranslateError>;
}

/// Stand-in translator: tags the text with the target code after a delay.
#[derive(Debug, Clone, Copy)]
pub struct PreviewTranslator {
    latency: Duration,
}

impl PreviewTranslator {
    pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for PreviewTranslator {
    fn default() -> Self {
        Self::with_latency(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Translator for PreviewTranslator {
    #[tracing::instrument(name = "linguaframe.translate", skip(self, text), fields(target = %target), err)]
    async fn translate(&self, text: &str, target: Language) -> Result<Translation, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        tokio::time::sleep(self.latency).await;
        Ok(Translation {
            text: format!("[{}] {}", target.code().to_uppercase(), text),
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("es".parse::<Language>().unwrap(), Language::Es);
        assert_eq!("JA".parse::<Language>().unwrap(), Language::Ja);
        assert_eq!("portuguese".parse::<Language>().unwrap(), Language::Pt);
        assert_eq!(
            "xx".parse::<Language>(),
            Err(TranslateError::UnknownLanguage("xx".into()))
        );
    }

    #[test]
    fn test_all_languages_have_distinct_codes() {
        let mut codes: Vec<_> = Language::ALL.iter().map(Language::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 10);
        assert_eq!(Language::Hi.name(), "Hindi");
    }

    #[tokio::test]
    async fn test_preview_translation() {
        let translator = PreviewTranslator::with_latency(Duration::ZERO);
        let translation = translator.translate("hello", Language::Es).await.unwrap();
        assert_eq!(translation.text, "[ES] hello");
        assert_eq!(translation.target, Language::Es);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let translator = PreviewTranslator::with_latency(Duration::ZERO);
        assert_eq!(
            translator.translate("   ", Language::Fr).await,
            Err(TranslateError::EmptyText)
        );
    }
}
