//! CJK+ASCII segmentation in jieba's search mode, with stopword and
//! punctuation filtering. Pure: output depends only on the input text
//! and the fixed stopword set.

use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use std::collections::HashSet;

// The dictionary load is expensive; every caller shares one instance.
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "之", "与", "及", "等",
        "或", "吗", "呢", "吧", "啊", "呀",
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "of", "for", "with",
        "by", "from",
    ]
    .into_iter()
    .collect()
});

/// Raw search-mode segmentation, no filtering. Ambiguous compounds are
/// exhaustively sub-segmented, so "红烧肉" also yields "红烧" and "烧肉".
pub fn segment(text: &str) -> Vec<String> {
    JIEBA
        .cut_for_search(text, true)
        .into_iter()
        .map(|w| w.to_string())
        .collect()
}

/// Content terms of `text`: segmented, trimmed, with stopwords, short
/// fragments and punctuation-only pieces removed.
pub fn tokenize(text: &str) -> Vec<String> {
    JIEBA
        .cut_for_search(text, true)
        .into_iter()
        .filter_map(|word| {
            let word = word.trim();
            if word.chars().count() < 2 {
                return None;
            }
            if STOPWORDS.contains(word) {
                return None;
            }
            if !has_content_char(word) {
                return None;
            }
            Some(word.to_string())
        })
        .collect()
}

// A term survives if any code point is a letter, digit or CJK ideograph;
// a term of nothing but punctuation does not.
fn has_content_char(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_and_single_chars_are_dropped() {
        let terms = tokenize("我想做红烧肉");
        assert!(!terms.iter().any(|t| t == "我"));
        assert!(!terms.iter().any(|t| t == "的"));
        assert!(terms.concat().contains("红烧"));
    }

    #[test]
    fn punctuation_only_terms_are_dropped() {
        let terms = tokenize("！！ ……");
        assert!(terms.is_empty());
    }

    #[test]
    fn mixed_punctuation_terms_survive() {
        assert!(has_content_char("a-b"));
        assert!(has_content_char("红烧。"));
        assert!(!has_content_char("——"));
    }

    #[test]
    fn tokenization_is_deterministic() {
        let a = tokenize("有什么简单的川菜，又辣又下饭？");
        let b = tokenize("有什么简单的川菜，又辣又下饭？");
        assert_eq!(a, b);
    }
}
