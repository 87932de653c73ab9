// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static text shown when no tier could answer.

use waypoint_core::Locale;

/// The "system busy" message for `locale`.
pub fn fallback_message(locale: Locale) -> &'static str {
    match locale {
        Locale::ZhTw => "抱歉，目前系統繁忙，請稍後再試。",
        Locale::Zh => "抱歉，目前系统繁忙，请稍后再试。",
        Locale::En => "Sorry, the system is busy. Please try again later.",
        Locale::Ja => "申し訳ありません。システムが混み合っています。しばらくしてから再度お試しください。",
        Locale::Ar => "عذرًا، النظام مشغول حاليًا. يرجى المحاولة لاحقًا.",
    }
}
