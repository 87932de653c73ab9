// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword rule groups for the decision classifier.
//!
//! Each group carries a specificity. When several groups match one input the
//! most specific wins, so a concrete request ("go to Haneda") outranks a
//! social signal ("hello") wherever each appears in the text.

use regex::Regex;
use waypoint_core::{DecisionLevel, WaypointError};

/// Social signals: greetings, thanks, farewells, yes/no.
const SOCIAL: u8 = 1;
/// Single-fact questions answerable without computation.
const INFO: u8 = 2;
/// Concrete transit requests that need a lookup or algorithm.
const ACTION: u8 = 3;
/// Multi-stop or multi-day planning.
const PLANNING: u8 = 4;

struct GroupSpec {
    name: &'static str,
    specificity: u8,
    level: DecisionLevel,
    confidence: f32,
    keywords: &'static [&'static str],
}

const GROUPS: &[GroupSpec] = &[
    GroupSpec {
        name: "greeting",
        specificity: SOCIAL,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "你好", "您好", "hello", "hi", "hey", "嗨", "安安", "哈囉", "哈喽",
            "こんにちは", "こんばんは", "おはよう", "はじめまして", "よろしく",
            "もしもし", "早安", "午安", "晚安", "早上好", "晚上好", "good morning",
            "good afternoon", "good evening", "初次見面", "請多指教", "yo",
        ],
    },
    GroupSpec {
        name: "thanks",
        specificity: SOCIAL,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "謝謝", "感謝", "感激", "感恩", "thank", "thanks", "thank you",
            "appreciate", "阿里嘎多", "ありがとう", "谢谢", "شكرا",
        ],
    },
    GroupSpec {
        name: "farewell",
        specificity: SOCIAL,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "再見", "再会", "掰掰", "再聊", "拜拜", "bye", "goodbye", "sorry",
            "對不起", "抱歉", "不好意思", "辛苦了", "下次見", "さようなら",
        ],
    },
    GroupSpec {
        name: "affirmative",
        specificity: SOCIAL,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "好", "可以", "沒問題", "好的", "不用", "不要", "不用了", "ok", "okay",
            "sure", "yes", "no", "はい", "いいえ",
        ],
    },
    GroupSpec {
        name: "basic_info",
        specificity: INFO,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "天氣", "weather", "現在幾點", "現在時間", "現在日期", "匯率",
            "exchange rate", "日期", "today", "今天日期", "今日", "星期幾",
            "禮拜幾", "天気",
        ],
    },
    GroupSpec {
        name: "simple_faq",
        specificity: INFO,
        level: DecisionLevel::Simple,
        confidence: 0.95,
        keywords: &[
            "怎麼買票", "ic卡", "suica", "pasmo", "icoca", "kitaca", "manaca",
            "nimoca", "sugoca", "哪裡買", "如何充值", "在哪裡", "營業時間",
            "opening hours", "定期券", "月票", "回數券", "一日券", "購票", "買票",
            "售票", "售票處", "充值", "加值", "儲值", "營業", "開門", "關門",
        ],
    },
    GroupSpec {
        name: "route",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "到", "去", "怎麼去", "如何去", "轉乘", "乗換", "乗り換え", "行き方",
            "如何換車", "路線", "前往", "走法", "怎麼走", "最近路線", "怎麼搭",
            "搭乘", "乘坐", "坐車", "換車", "轉車", "轉站", "從", "出發", "起點",
            "終點", "途經", "經過", "route", "routes", "directions", "direction",
            "go to", "get to", "way to", "head to", "travel to", "take me to",
            "how do i get", "transfer",
        ],
    },
    GroupSpec {
        name: "fare",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "多少錢", "票價", "車資", "運費", "運賃", "多少", "費用", "花費",
            "多少円", "多少日幣", "多少日元", "總共", "總價", "合計", "ic卡價",
            "現金價", "fare", "fares", "price", "cost", "how much",
        ],
    },
    GroupSpec {
        name: "timetable",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "時刻表", "時間表", "首班車", "末班車", "首班车", "末班车", "班次",
            "發車", "到站時間", "列車時間", "發車時間", "行駛時間", "待ち時間",
            "等候時間", "需要多久", "幾分鐘", "多久", "需要多少時間", "終電",
            "始発", "timetable", "schedule", "first train", "last train",
        ],
    },
    GroupSpec {
        name: "station_info",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "電梯", "電扶梯", "出口", "入口", "位置", "洗手間", "廁所", "月台",
            "剪票口", "驗票口", "閘門", "閘口", "無障礙", "殘障", "輪椅", "嬰兒車",
            "寄物櫃", "置物櫃", "行李寄放", "便利商店", "觀光案內", "旅遊中心",
            "服務台", "詢問處", "案内所", "コインロッカー", "エレベーター",
            "toilet", "elevator", "locker", "exit", "platform", "information",
        ],
    },
    GroupSpec {
        name: "nearby",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "附近", "周邊", "周圍", "旁邊", "周遭", "有什麼", "推薦", "景點",
            "觀光景點", "旅遊景點", "好玩", "美食", "餐廳", "小吃", "購物", "商場",
            "免稅店", "近く", "nearby", "near", "around here", "outlet",
        ],
    },
    GroupSpec {
        name: "operation_status",
        specificity: ACTION,
        level: DecisionLevel::Medium,
        confidence: 0.90,
        keywords: &[
            "營運", "運行", "行駛", "停駛", "停開", "延誤", "誤點", "晚點", "遅延",
            "遅れ", "運行状況", "運行狀況", "運転状況", "平常運転", "平時運行",
            "運転見合わせ", "見合わせ", "運休", "ダイヤ", "運転間隔", "正常", "狀態",
            "停運", "停行", "不通", "不通區間", "delay", "delayed", "status",
            "suspended", "disruption",
        ],
    },
    GroupSpec {
        name: "trip_planning",
        specificity: PLANNING,
        level: DecisionLevel::DeepReasoning,
        confidence: 0.85,
        keywords: &[
            "行程", "行程規劃", "規劃行程", "幫我規劃", "安排行程", "一日遊",
            "兩天一夜", "多站", "順路", "旅遊計畫", "旅程", "観光プラン",
            "モデルコース", "itinerary", "day trip", "plan a trip", "plan my",
            "multi-stop", "multiple stops",
        ],
    },
];

/// A compiled keyword group.
#[derive(Debug)]
pub struct RuleGroup {
    pub name: &'static str,
    pub specificity: u8,
    pub level: DecisionLevel,
    pub confidence: f32,
    matcher: Regex,
}

impl RuleGroup {
    pub fn is_match(&self, normalized: &str) -> bool {
        self.matcher.is_match(normalized)
    }
}

/// The ordered rule groups.
#[derive(Debug)]
pub struct RuleSet {
    groups: Vec<RuleGroup>,
}

impl RuleSet {
    /// Compiles the built-in groups.
    pub fn builtin() -> Result<Self, WaypointError> {
        let groups = GROUPS
            .iter()
            .map(|def| {
                Ok(RuleGroup {
                    name: def.name,
                    specificity: def.specificity,
                    level: def.level,
                    confidence: def.confidence,
                    matcher: keyword_regex(def.keywords).map_err(|e| {
                        WaypointError::Internal(format!("rule group `{}`: {e}", def.name))
                    })?,
                })
            })
            .collect::<Result<Vec<_>, WaypointError>>()?;
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// Returns the most specific matching group.
    ///
    /// Equal specificity resolves to the group listed first.
    pub fn best_match(&self, normalized: &str) -> Option<&RuleGroup> {
        let mut best: Option<&RuleGroup> = None;
        for group in &self.groups {
            if !group.is_match(normalized) {
                continue;
            }
            if best.is_none_or(|b| group.specificity > b.specificity) {
                best = Some(group);
            }
        }
        best
    }
}

/// ASCII keywords match on word boundaries; other scripts match as substrings.
fn keyword_regex(keywords: &[&str]) -> Result<Regex, regex::Error> {
    let alternation = keywords
        .iter()
        .map(|kw| {
            let escaped = regex::escape(kw);
            if kw.is_ascii() {
                format!(r"\b{escaped}\b")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternation})"))
}
