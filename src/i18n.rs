//! User-facing message lookup.
//!
//! Lookups go through the [`Translator`] trait so a remote translation
//! service can be plugged in; [`localize`] bounds every lookup with a timeout
//! and falls back to the built-in English text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Supported display locales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Vi,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Vi => f.write_str("vi"),
        }
    }
}

/// Messages shown to the user by the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    MissingSelections,
    InvalidSelection,
    CatalogLoadFailed,
    CatalogIncomplete,
    EstimateReady,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, key: MessageKey, locale: Locale) -> Option<String>;
}

/// Built-in message tables
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTranslator;

impl StaticTranslator {
    pub fn lookup(key: MessageKey, locale: Locale) -> &'static str {
        match (locale, key) {
            (Locale::En, MessageKey::MissingSelections) => "Please complete all selections.",
            (Locale::En, MessageKey::InvalidSelection) => {
                "One of your selections is no longer available. Please choose again."
            }
            (Locale::En, MessageKey::CatalogLoadFailed) => {
                "Failed to load pricing data. Please reload the page."
            }
            (Locale::En, MessageKey::CatalogIncomplete) => {
                "Pricing is not configured yet. Please check back later."
            }
            (Locale::En, MessageKey::EstimateReady) => "Your estimate is ready.",
            (Locale::Vi, MessageKey::MissingSelections) => "Vui lòng hoàn thành tất cả các lựa chọn.",
            (Locale::Vi, MessageKey::InvalidSelection) => {
                "Một lựa chọn của bạn không còn khả dụng. Vui lòng chọn lại."
            }
            (Locale::Vi, MessageKey::CatalogLoadFailed) => {
                "Không thể tải dữ liệu báo giá. Vui lòng tải lại trang."
            }
            (Locale::Vi, MessageKey::CatalogIncomplete) => {
                "Bảng giá chưa được cấu hình. Vui lòng quay lại sau."
            }
            (Locale::Vi, MessageKey::EstimateReady) => "Báo giá dự kiến của bạn đã sẵn sàng.",
        }
    }
}

#[async_trait]
impl Translator for StaticTranslator {
    async fn translate(&self, key: MessageKey, locale: Locale) -> Option<String> {
        Some(Self::lookup(key, locale).to_string())
    }
}

/// Translate `key`, falling back to English on a miss or when `timeout` elapses
pub async fn localize(
    translator: &dyn Translator,
    key: MessageKey,
    locale: Locale,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, translator.translate(key, locale)).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            warn!(key = ?key, locale = %locale, "No translation found, using fallback");
            StaticTranslator::lookup(key, Locale::En).to_string()
        }
        Err(_) => {
            warn!(key = ?key, locale = %locale, timeout = ?timeout, "Translation lookup timed out");
            StaticTranslator::lookup(key, Locale::En).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowTranslator;

    #[async_trait]
    impl Translator for SlowTranslator {
        async fn translate(&self, _key: MessageKey, _locale: Locale) -> Option<String> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Some("late".to_string())
        }
    }

    struct EmptyTranslator;

    #[async_trait]
    impl Translator for EmptyTranslator {
        async fn translate(&self, _key: MessageKey, _locale: Locale) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_localize_static() {
        let text = localize(
            &StaticTranslator,
            MessageKey::MissingSelections,
            Locale::Vi,
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(text, "Vui lòng hoàn thành tất cả các lựa chọn.");
    }

    #[tokio::test]
    async fn test_localize_times_out_to_english() {
        let text = localize(
            &SlowTranslator,
            MessageKey::EstimateReady,
            Locale::Vi,
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(text, "Your estimate is ready.");
    }

    #[tokio::test]
    async fn test_localize_miss_falls_back() {
        let text = localize(
            &EmptyTranslator,
            MessageKey::CatalogIncomplete,
            Locale::Vi,
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(text, "Pricing is not configured yet. Please check back later.");
    }

    #[test]
    fn test_locale_serde() {
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
        assert_eq!(Locale::default().to_string(), "vi");
    }
}
