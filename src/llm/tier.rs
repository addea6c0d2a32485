//! Complexity-tier classification for requests that do not name a tier.

use super::catalog::ComplexityTier;
use super::types::Message;

const COMPLEX_WORD_THRESHOLD: usize = 500;
const STANDARD_WORD_THRESHOLD: usize = 100;

const COMPLEX_KEYWORDS: &[&str] = &[
    "analyze", "analysis", "architecture", "design", "optimize", "optimization",
    "comprehensive", "in-depth", "evaluate", "compare", "strategy", "research",
    "분석", "설계", "아키텍처", "최적화", "종합", "심층", "평가", "비교", "전략", "연구",
];

const GENERATION_KEYWORDS: &[&str] = &[
    "write", "generate", "create", "summarize", "summary", "explain", "draft", "translate",
    "작성", "생성", "만들", "요약", "설명", "초안", "번역",
];

/// Classify from the concatenated user-role text: long or complexity-flavoured
/// requests are complex, medium or generation-flavoured ones standard.
pub fn classify_messages(messages: &[Message]) -> ComplexityTier {
    let text = messages.iter()
        .filter(|m| m.is_user())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    classify_text(&text)
}

pub fn classify_text(text: &str) -> ComplexityTier {
    let lower = text.to_lowercase();
    let words = lower.split_whitespace().count();

    if words > COMPLEX_WORD_THRESHOLD || contains_any(&lower, COMPLEX_KEYWORDS) {
        ComplexityTier::Complex
    } else if words > STANDARD_WORD_THRESHOLD || contains_any(&lower, GENERATION_KEYWORDS) {
        ComplexityTier::Standard
    } else {
        ComplexityTier::Simple
    }
}

/// Tier hint carried by an agent's model identifier.
pub fn tier_for_model_name(model: &str) -> ComplexityTier {
    let lower = model.to_lowercase();
    if lower.contains("mini") || lower.contains("haiku") {
        ComplexityTier::Simple
    } else if lower.contains("opus") {
        ComplexityTier::Complex
    } else {
        ComplexityTier::Standard
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_plain_text_is_simple() {
        assert_eq!(classify_text("hello there"), ComplexityTier::Simple);
    }

    #[test]
    fn test_complex_keyword() {
        assert_eq!(classify_text("Please ANALYZE the logs"), ComplexityTier::Complex);
        assert_eq!(classify_text("시스템 아키텍처를 검토"), ComplexityTier::Complex);
    }

    #[test]
    fn test_generation_keyword() {
        assert_eq!(classify_text("Write a haiku"), ComplexityTier::Standard);
        assert_eq!(classify_text("이 글을 요약해줘"), ComplexityTier::Standard);
    }

    #[test]
    fn test_word_count_thresholds() {
        let medium = vec!["word"; 150].join(" ");
        assert_eq!(classify_text(&medium), ComplexityTier::Standard);
        let long = vec!["word"; 600].join(" ");
        assert_eq!(classify_text(&long), ComplexityTier::Complex);
    }

    #[test]
    fn test_only_user_messages_count() {
        let messages = vec![
            Message::system("analyze everything comprehensively"),
            Message::user("hi"),
        ];
        assert_eq!(classify_messages(&messages), ComplexityTier::Simple);
    }

    #[test]
    fn test_tier_for_model_name() {
        assert_eq!(tier_for_model_name("gpt-4o-mini"), ComplexityTier::Simple);
        assert_eq!(tier_for_model_name("claude-3-5-haiku"), ComplexityTier::Simple);
        assert_eq!(tier_for_model_name("claude-opus-4"), ComplexityTier::Complex);
        assert_eq!(tier_for_model_name("gpt-4o"), ComplexityTier::Standard);
    }
}
