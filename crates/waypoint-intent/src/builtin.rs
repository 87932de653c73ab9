// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in template set: greetings, live-status help and fare lookups.

use serde_json::json;
use waypoint_core::{Locale, WaypointError};

use crate::template::{Captures, MatchResponse, Template};

/// Trailing whitespace (including the ideographic space) and punctuation allowed after a greeting.
const TRAILER: &str = r"(?:[\s\x{3000}]*[!！。．.、，,？?]*)?$";

/// Builds the default template set shipped with the binary.
pub fn default_templates() -> Result<Vec<Template>, WaypointError> {
    Ok(vec![greeting()?, live_status_help()?, fare_query()?])
}

fn greeting() -> Result<Template, WaypointError> {
    Template::builder("greeting", 100)
        .keywords([
            "你好",
            "您好",
            "hello",
            "hi",
            "hey",
            "安安",
            "哈囉",
            "早安",
            "午安",
            "晚安",
            "こんにちは",
            "こんばんは",
            "おはよう",
            "おはようございます",
            "はじめまして",
            "よろしく",
            "よろしくお願いします",
            "もしもし",
        ])
        .pattern(format!(r"(?i)^(你好|您好|hello|hi|hey|安安|哈囉){TRAILER}"))
        .pattern(format!(r"(?i)^(早上好|午安|晚安|早安){TRAILER}"))
        .pattern(format!(
            r"^(こんにちは|こんばんは|おはようございます|おはよう|はじめまして|よろしくお願いします|よろしく|もしもし){TRAILER}"
        ))
        .text(
            Locale::ZhTw,
            "你好！我是 Waypoint，你的東京交通導航助手。想去哪裡，或有任何交通問題都可以問我！",
        )
        .text(
            Locale::Zh,
            "你好！我是 Waypoint，你的东京交通导航助手。想去哪里，或有任何交通问题都可以问我！",
        )
        .text(
            Locale::En,
            "Hello! I'm Waypoint, your Tokyo transit assistant. Where would you like to go today?",
        )
        .text(
            Locale::Ja,
            "こんにちは！Waypoint です。東京の交通案内をお手伝いします。どちらへ行かれますか？",
        )
        .text(
            Locale::Ar,
            "مرحباً! أنا Waypoint، مساعدك للمواصلات في طوكيو. إلى أين تريد الذهاب اليوم؟",
        )
        .build()
}

fn live_status_help() -> Result<Template, WaypointError> {
    Template::builder("live-status-help", 92)
        .pattern(r"(?:延誤|誤點|停駛|停運|運行狀態|運行|運轉|狀態|異常|停電)")
        .pattern(r"(?:遅延|運休|運行状況|運転見合わせ)")
        .pattern(r"(?i)\b(?:delay|delayed|disruption|suspend|suspended|status|power outage|blackout)\b")
        .text(
            Locale::ZhTw,
            "我可以查詢即時運行狀態。請告訴我你目前所在的車站（或在地圖上選擇車站、開啟定位），我會用即時資料回覆延誤原因與替代方案。",
        )
        .text(
            Locale::Zh,
            "我可以查询实时运行状态。请告诉我你目前所在的车站（或在地图上选择车站、开启定位），我会用实时数据回复延误原因与替代方案。",
        )
        .text(
            Locale::En,
            "I can check live service status. Tell me which station you're at (or pick one on the map or enable location) and I'll reply with the cause and an alternative.",
        )
        .text(
            Locale::Ja,
            "運行状況を確認できます。今いる駅（または地図で駅を選ぶか位置情報を有効に）を教えてください。遅延の理由と代替ルートをお伝えします。",
        )
        .text(
            Locale::Ar,
            "يمكنني التحقق من حالة التشغيل المباشرة. أخبرني بمحطتك الحالية (أو اختر محطة على الخريطة أو فعّل الموقع) وسأرد بالسبب وبديل مناسب.",
        )
        .build()
}

fn fare_action(content: String, caps: &Captures) -> MatchResponse {
    let target = caps.group_or_whole(1);
    MatchResponse::action(content, json!({ "action": "query_fare", "target": target }))
}

fn fare_query() -> Result<Template, WaypointError> {
    Template::builder("fare-query-basic", 90)
        .pattern(r"(?i)(?:多少錢|票價|車資|運賃|fare).*?(?:到|至|まで|\bto\b)\s*([^?？\s]+)")
        .pattern(r"(?i)([^?？\s]+?)(?:的)?(?:票價|車資|運賃|\s*fare\b)")
        .computed(Locale::ZhTw, |caps| {
            fare_action(format!("正在為您查詢前往 {} 的票價...", caps.group_or_whole(1)), caps)
        })
        .computed(Locale::Zh, |caps| {
            fare_action(format!("正在为您查询前往 {} 的票价...", caps.group_or_whole(1)), caps)
        })
        .computed(Locale::En, |caps| {
            fare_action(format!("Looking up the fare to {}...", caps.group_or_whole(1)), caps)
        })
        .computed(Locale::Ja, |caps| {
            fare_action(format!("{} までの運賃を調べています...", caps.group_or_whole(1)), caps)
        })
        .computed(Locale::Ar, |caps| {
            fare_action(
                format!("جاري الاستعلام عن الأجرة إلى {}...", caps.group_or_whole(1)),
                caps,
            )
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::IntentMatcher;
    use crate::template::ResponseKind;

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(default_templates().unwrap(), Locale::En).unwrap()
    }

    #[test]
    fn every_template_covers_every_locale() {
        for template in default_templates().unwrap() {
            for locale in Locale::ALL {
                assert!(template.has_locale(locale), "{} lacks {locale}", template.id());
            }
        }
    }

    #[test]
    fn greeting_by_keyword_and_pattern() {
        let m = matcher();
        assert_eq!(m.match_intent("hello", Locale::En).unwrap().template_id, "greeting");
        assert_eq!(m.match_intent("Hello!!", Locale::En).unwrap().template_id, "greeting");
        assert_eq!(m.match_intent("你好！", Locale::ZhTw).unwrap().template_id, "greeting");
        assert_eq!(
            m.match_intent("こんにちは\u{3000}", Locale::Ja).unwrap().template_id,
            "greeting"
        );
        assert_eq!(m.match_intent("早上好。", Locale::Zh).unwrap().template_id, "greeting");
    }

    #[test]
    fn greeting_with_request_is_not_a_greeting() {
        let m = matcher();
        assert!(m.match_intent("hello, I want to go to the airport", Locale::En).is_none());
        assert!(m.match_intent("hi there", Locale::En).is_none());
    }

    #[test]
    fn live_status_patterns() {
        let m = matcher();
        for input in ["銀座線延誤了嗎", "山手線は遅延していますか", "Is the Ginza line delayed?"] {
            assert_eq!(
                m.match_intent(input, Locale::En).unwrap().template_id,
                "live-status-help",
                "{input}"
            );
        }
        assert!(m.match_intent("statusbar", Locale::En).is_none());
    }

    #[test]
    fn fare_query_extracts_target() {
        let m = matcher();
        let hit = m.match_intent("fare to Tokyo", Locale::En).unwrap();
        assert_eq!(hit.template_id, "fare-query-basic");
        assert_eq!(hit.response.kind, ResponseKind::Action);
        assert_eq!(
            hit.response.data,
            Some(json!({ "action": "query_fare", "target": "Tokyo" }))
        );
        assert_eq!(hit.response.content, "Looking up the fare to Tokyo...");

        let hit = m.match_intent("新宿的票價", Locale::ZhTw).unwrap();
        assert_eq!(
            hit.response.data,
            Some(json!({ "action": "query_fare", "target": "新宿" }))
        );

        let hit = m.match_intent("票價到上野", Locale::Ja).unwrap();
        assert_eq!(hit.response.content, "上野 までの運賃を調べています...");
    }

    #[test]
    fn status_outranks_fare() {
        let hit = matcher()
            .match_intent("fare to Ueno during the delay", Locale::En)
            .unwrap();
        assert_eq!(hit.template_id, "live-status-help");
    }
}
