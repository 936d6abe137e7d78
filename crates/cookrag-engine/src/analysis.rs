//! Query-feature analysis feeding strategy selection. Every feature is a
//! pure function of the query text, so for a fixed configuration the
//! analysis is deterministic.

use once_cell::sync::Lazy;
use regex::Regex;

use cookrag_core::config::RouterConfig;
use cookrag_core::types::{QueryAnalysis, Strategy};

static SPECIAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[？?！!，,、;；]").unwrap());
// Entity-like spans: 2-4 CJK ideographs or latin words of 3+ letters.
static ENTITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{4e00}-\u{9fa5}]{2,4}|[A-Za-z]{3,}").unwrap());

const LOGIC_WORDS: &[&str] = &[
    "和", "或", "但是", "因为", "所以", "如果", "那么", "and", "or", "but", "because",
];

const RELATION_WORDS: &[&str] = &[
    "关联", "关系", "联系", "依赖", "相关", "连接",
    "related", "relationship", "connection", "link", "associate",
];

const HIERARCHY_WORDS: &[&str] = &[
    "包含", "属于", "部分", "子类", "父类", "contain", "include", "part of", "subclass",
    "parent",
];

/// Analyze a query and recommend a strategy. `graph_available` reflects
/// whether a graph retriever is actually wired in; without one the graph
/// arm is never recommended regardless of configuration.
pub fn analyze(query: &str, config: &RouterConfig, graph_available: bool) -> QueryAnalysis {
    let complexity = complexity(query);
    let relationship_intensity = relationship_intensity(query);
    let confidence = confidence(complexity, relationship_intensity);

    let recommended_strategy = if config.enable_graph_rag
        && graph_available
        && relationship_intensity > 0.6
    {
        Strategy::Graph
    } else if config.enable_hybrid && complexity > config.complexity_threshold {
        Strategy::Hybrid
    } else if complexity > 0.3 {
        Strategy::Vector
    } else {
        Strategy::Bm25
    };

    QueryAnalysis {
        query: query.to_string(),
        complexity,
        relationship_intensity,
        confidence,
        recommended_strategy,
    }
}

fn complexity(query: &str) -> f64 {
    let mut complexity = 0.0;

    let length_score = (query.len() as f64 / 100.0).min(1.0);
    complexity += length_score * 0.2;

    // whitespace fields; an unspaced CJK query counts as one word
    let word_count = query.split_whitespace().count();
    let word_score = (word_count as f64 / 20.0).min(1.0);
    complexity += word_score * 0.3;

    let special_count = SPECIAL_CHARS.find_iter(query).count();
    let special_score = (special_count as f64 / 5.0).min(1.0);
    complexity += special_score * 0.2;

    let lowered = query.to_lowercase();
    for word in LOGIC_WORDS {
        if lowered.contains(word) {
            complexity += 0.1;
        }
    }

    complexity.min(1.0)
}

fn relationship_intensity(query: &str) -> f64 {
    let mut intensity = 0.0;
    let lowered = query.to_lowercase();

    for word in RELATION_WORDS {
        if lowered.contains(word) {
            intensity += 0.3;
        }
    }

    let entity_count = ENTITY_PATTERN.find_iter(query).count();
    let entity_score = (entity_count as f64 / 5.0).min(1.0);
    intensity += entity_score * 0.5;

    for word in HIERARCHY_WORDS {
        if lowered.contains(word) {
            intensity += 0.2;
        }
    }

    intensity.min(1.0)
}

fn confidence(complexity: f64, relationship_intensity: f64) -> f64 {
    let mut confidence: f64 = 0.7;
    if complexity > 0.7 {
        confidence += 0.1;
    }
    if relationship_intensity > 0.6 {
        confidence += 0.1;
    }
    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> RouterConfig {
        RouterConfig::default()
    }

    #[test]
    fn simple_query_routes_to_bm25() {
        let analysis = analyze("红烧肉", &default_config(), true);
        assert!(analysis.complexity <= 0.3, "complexity {}", analysis.complexity);
        assert_eq!(analysis.recommended_strategy, Strategy::Bm25);
    }

    #[test]
    fn relational_vocabulary_routes_to_graph() {
        let analysis = analyze("西红柿和鸡蛋有什么关联关系？", &default_config(), true);
        assert!(
            analysis.relationship_intensity > 0.6,
            "intensity {}",
            analysis.relationship_intensity
        );
        assert_eq!(analysis.recommended_strategy, Strategy::Graph);
    }

    // Multi-entity questions without the enumerated relation vocabulary
    // stay below the graph threshold: entity density alone caps the
    // intensity at 0.5.
    #[test]
    fn multi_entity_question_alone_does_not_reach_graph() {
        let analysis = analyze("西红柿和鸡蛋能做哪些菜？", &default_config(), true);
        assert!(
            analysis.relationship_intensity <= 0.6,
            "intensity {}",
            analysis.relationship_intensity
        );
        assert_ne!(analysis.recommended_strategy, Strategy::Graph);
    }

    #[test]
    fn relational_query_without_graph_falls_through() {
        let analysis = analyze("西红柿和鸡蛋有什么关联关系？", &default_config(), false);
        assert_ne!(analysis.recommended_strategy, Strategy::Graph);
    }

    #[test]
    fn complex_query_routes_to_hybrid() {
        let analysis = analyze(
            "如果家里只有西红柿和鸡蛋，但是不想吃辣，那么有什么简单的菜？因为晚上要快点做好，所以最好十分钟能完成！",
            &default_config(),
            true,
        );
        assert!(analysis.complexity > 0.5, "complexity {}", analysis.complexity);
        assert!(
            analysis.relationship_intensity <= 0.6,
            "intensity {}",
            analysis.relationship_intensity
        );
        assert_eq!(analysis.recommended_strategy, Strategy::Hybrid);
    }

    #[test]
    fn medium_complexity_routes_to_vector() {
        let analysis =
            analyze("如果家里没有酱油，可以用什么调料来代替？", &default_config(), true);
        assert!(
            analysis.complexity > 0.3 && analysis.complexity <= 0.5,
            "complexity {}",
            analysis.complexity
        );
        assert_eq!(analysis.recommended_strategy, Strategy::Vector);
    }

    #[test]
    fn analysis_is_deterministic() {
        let config = default_config();
        let first = analyze("西红柿和鸡蛋有什么关联关系？", &config, true);
        let second = analyze("西红柿和鸡蛋有什么关联关系？", &config, true);
        assert_eq!(first.complexity, second.complexity);
        assert_eq!(first.relationship_intensity, second.relationship_intensity);
        assert_eq!(first.recommended_strategy, second.recommended_strategy);
    }

    #[test]
    fn confidence_rises_with_strong_features() {
        let simple = analyze("红烧肉", &default_config(), true);
        assert!((simple.confidence - 0.7).abs() < 1e-9);

        let relational = analyze("西红柿和鸡蛋有什么关联关系？", &default_config(), true);
        assert!(relational.confidence >= 0.8);
    }
}
