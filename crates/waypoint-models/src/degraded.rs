// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection of "service busy" notices returned in place of a real answer.
//!
//! Some upstream hubs answer an overloaded request with HTTP 200 and a short
//! apology instead of an error status. The gateway treats such text as a failed call.

use std::sync::LazyLock;

use regex::Regex;

/// Longer output is assumed to be a real answer that merely mentions load.
const MAX_NOTICE_CHARS: usize = 120;

/// Which busy pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradedNotice {
    /// Locale tag of the matching pattern.
    pub language: &'static str,
    pub label: &'static str,
}

struct BusyPattern {
    notice: DegradedNotice,
    regex: Regex,
}

fn busy(language: &'static str, label: &'static str, pattern: &str) -> BusyPattern {
    BusyPattern {
        notice: DegradedNotice { language, label },
        regex: Regex::new(pattern).unwrap(),
    }
}

/// Evaluated in order; the first match is reported.
static BUSY_PATTERNS: LazyLock<Vec<BusyPattern>> = LazyLock::new(|| {
    vec![
        busy(
            "en",
            "system_busy",
            r"(?i)\b(?:system|service|server|model)s?\s+(?:is|are)\s+(?:currently\s+)?(?:busy|overloaded|unavailable)\b",
        ),
        busy(
            "en",
            "rate_limited",
            r"(?i)\b(?:too many requests|rate limit(?:ed| exceeded)?)\b",
        ),
        busy(
            "zh-TW",
            "system_busy",
            r"(?:系統|服務|伺服器)(?:目前)?(?:繁忙|忙碌|暫時無法使用)",
        ),
        busy(
            "zh",
            "system_busy",
            r"(?:系统|服务|服务器)(?:目前)?(?:繁忙|忙碌|暂时无法使用)",
        ),
        busy(
            "ja",
            "system_busy",
            r"(?:システム|サーバー|サービス)(?:が|は)?(?:混み合って|混雑して|ビジー|ご利用いただけません)",
        ),
    ]
});

/// Returns the first busy pattern matching `text`, if `text` is short enough to be a notice.
pub fn detect_degraded(text: &str) -> Option<DegradedNotice> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > MAX_NOTICE_CHARS {
        return None;
    }
    BUSY_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn language_of(text: &str) -> Option<&'static str> {
        detect_degraded(text).map(|n| n.language)
    }

    #[test]
    fn english_busy_notices() {
        assert_eq!(
            language_of("Sorry, the system is busy. Please try again later."),
            Some("en")
        );
        assert_eq!(language_of("The server is currently overloaded."), Some("en"));
        assert_eq!(
            detect_degraded("Error: too many requests").map(|n| n.label),
            Some("rate_limited")
        );
    }

    #[test]
    fn traditional_chinese_busy_notice() {
        assert_eq!(language_of("抱歉，目前系統繁忙，請稍後再試。"), Some("zh-TW"));
        assert_eq!(language_of("伺服器暫時無法使用"), Some("zh-TW"));
    }

    #[test]
    fn simplified_chinese_busy_notice() {
        assert_eq!(language_of("抱歉，目前系统繁忙，请稍后再试。"), Some("zh"));
        assert_eq!(language_of("服务器暂时无法使用"), Some("zh"));
    }

    #[test]
    fn japanese_busy_notice() {
        assert_eq!(
            language_of("申し訳ありません。システムが混み合っています。"),
            Some("ja")
        );
        assert_eq!(language_of("サーバーが混雑しています"), Some("ja"));
    }

    #[test]
    fn first_pattern_in_list_order_wins() {
        let notice = detect_degraded("Too many requests: the server is busy").unwrap();
        assert_eq!(notice.label, "system_busy");
        assert_eq!(notice.language, "en");

        let mixed = detect_degraded("系統繁忙 / システムが混み合っています").unwrap();
        assert_eq!(mixed.language, "zh-TW");
    }

    #[test]
    fn real_answers_are_not_flagged() {
        assert!(detect_degraded("Take the Yamanote line to Shibuya, about 12 minutes.").is_none());
        assert!(detect_degraded("從台北車站搭乘板南線到市政府站，約 10 分鐘。").is_none());
        assert!(detect_degraded("").is_none());
    }

    #[test]
    fn long_answers_that_mention_load_are_not_flagged() {
        let long = format!(
            "{} Note: the station server is busy on weekends, so buy tickets early.",
            "Take the Keisei Skyliner from Narita to Ueno. ".repeat(3)
        );
        assert!(long.chars().count() > MAX_NOTICE_CHARS);
        assert!(detect_degraded(&long).is_none());
    }
}
