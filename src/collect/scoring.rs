//! Heuristic scoring for collected entries: AI relevance gate, keyword
//! extraction, importance (1 to 10) and a coarse sentiment label.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::item::Sentiment;

const BASE_SCORE: f64 = 4.0;

/// Head AI companies and products. Only the best match counts.
const TIER1: &[(&str, f64)] = &[
    ("openai", 1.5),
    ("chatgpt", 1.5),
    ("gpt-4", 1.5),
    ("gpt-5", 2.0),
    ("anthropic", 1.3),
    ("claude", 1.3),
    ("gemini", 1.2),
    ("deepmind", 1.2),
    ("sora", 1.5),
    ("dall-e", 1.2),
];

const TIER2: &[(&str, f64)] = &[
    ("google", 0.8),
    ("meta", 0.8),
    ("microsoft", 0.8),
    ("nvidia", 0.8),
    ("apple", 0.8),
    ("amazon", 0.6),
    ("tesla", 0.6),
    ("hugging face", 0.7),
    ("mistral", 0.8),
    ("llama", 0.8),
    ("copilot", 0.7),
];

const TIER3: &[(&str, f64)] = &[
    ("funding", 1.0),
    ("valuation", 1.0),
    ("agi", 1.2),
    ("regulation", 0.8),
    ("safety", 0.7),
    ("open source", 0.8),
    ("融资", 1.0),
    ("估值", 1.0),
    ("通用人工智能", 1.2),
    ("法规", 0.8),
    ("安全", 0.7),
    ("开源", 0.8),
];

/// Event words, matched against the title only.
const EVENTS: &[(&str, f64)] = &[
    ("release", 1.0),
    ("launch", 1.0),
    ("announce", 0.8),
    ("breakthrough", 1.2),
    ("first", 0.8),
    ("acquisition", 1.0),
    ("merger", 0.8),
    ("发布", 1.0),
    ("推出", 1.0),
    ("突破", 1.2),
    ("首次", 1.0),
    ("收购", 1.0),
    ("合并", 0.8),
];

const AI_PHRASES: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "chatgpt",
    "openai",
    "人工智能",
    "机器学习",
    "深度学习",
    "神经网络",
];

const AI_WORDS: &[&str] = &["ai", "ml", "gpt"];

/// Terms reported as keywords, in report order.
const KEYWORD_TERMS: &[&str] = &[
    "GPT",
    "ChatGPT",
    "OpenAI",
    "DeepMind",
    "Anthropic",
    "Claude",
    "Google AI",
    "Meta AI",
    "Microsoft AI",
    "NVIDIA",
    "Tesla",
    "machine learning",
    "deep learning",
    "neural network",
    "artificial intelligence",
    "AI",
    "ML",
    "LLM",
    "transformer",
    "大语言模型",
    "生成式AI",
    "计算机视觉",
    "自然语言处理",
];

pub const MAX_KEYWORDS: usize = 5;

const POSITIVE: &[&str] = &["breakthrough", "success", "innovation", "突破", "进展", "成功", "创新", "提升"];
const NEGATIVE: &[&str] = &["problem", "failure", "error", "controversy", "问题", "失败", "错误", "批评", "争议"];

static RE_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[\d.]+[BMK]|\d+%|\d+x").expect("static regex"));

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

/// Short ASCII terms match whole words; longer terms match as substrings.
fn mentions(text_lower: &str, term: &str) -> bool {
    let t = term.to_lowercase();
    if t.len() <= 3 && t.is_ascii() {
        has_word(text_lower, &t)
    } else {
        text_lower.contains(&t)
    }
}

fn best(text_lower: &str, table: &[(&str, f64)]) -> f64 {
    table
        .iter()
        .filter(|(k, _)| text_lower.contains(k))
        .map(|(_, v)| *v)
        .fold(0.0, f64::max)
}

pub fn is_ai_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    AI_PHRASES.iter().any(|p| lower.contains(p)) || AI_WORDS.iter().any(|w| has_word(&lower, w))
}

pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORD_TERMS
        .iter()
        .filter(|t| mentions(&lower, t))
        .take(MAX_KEYWORDS)
        .map(|t| t.to_string())
        .collect()
}

/// Importance in [1, 10] before the source bonus.
pub fn importance(
    title: &str,
    summary: &str,
    keywords: &[String],
    published: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let text = format!("{title} {summary}").to_lowercase();
    let title_lower = title.to_lowercase();

    let mut score = BASE_SCORE;
    score += best(&text, TIER1) + best(&text, TIER2) + best(&text, TIER3);
    score += best(&title_lower, EVENTS);
    score += (keywords.len() as f64 * 0.2).min(1.0);

    if let Some(ts) = published {
        let hours = now.signed_duration_since(ts).num_minutes() as f64 / 60.0;
        score += if hours < 6.0 {
            1.5
        } else if hours < 24.0 {
            1.0
        } else if hours < 48.0 {
            0.5
        } else {
            0.0
        };
    }

    let title_len = title.chars().count();
    if (15..=80).contains(&title_len) {
        score += 0.2;
    }
    if RE_FIGURE.is_match(title) {
        score += 0.5;
    }

    score.clamp(1.0, 10.0)
}

pub fn with_source_bonus(score: f64, bonus: f64) -> f64 {
    (score + bonus).min(10.0)
}

pub fn sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let pos = POSITIVE.iter().filter(|w| lower.contains(*w)).count();
    let neg = NEGATIVE.iter().filter(|w| lower.contains(*w)).count();
    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}
