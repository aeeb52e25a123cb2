//! Shapes exchanged with the external search executor.

use serde::{Deserialize, Serialize};

/// How a physical index is queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Nearest neighbours by embedding similarity
    #[default]
    NearestNeighbor,
    /// Term-based (BM25-style) matching
    Lexical,
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchType::NearestNeighbor => write!(f, "nearest_neighbor"),
            SearchType::Lexical => write!(f, "lexical"),
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest_neighbor" | "near_text" | "vector" | "semantic" => {
                Ok(SearchType::NearestNeighbor)
            }
            "lexical" | "bm25" | "keyword" => Ok(SearchType::Lexical),
            _ => Err(format!(
                "Unknown search type '{}'. Use nearest_neighbor or lexical.",
                s
            )),
        }
    }
}

/// One result returned by the search executor. Contents are never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub score: f32,
}

impl SearchHit {
    /// Hit with the given content and score.
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_aliases() {
        assert_eq!("bm25".parse::<SearchType>().unwrap(), SearchType::Lexical);
        assert_eq!(
            "near_text".parse::<SearchType>().unwrap(),
            SearchType::NearestNeighbor
        );
        assert!("hybrid".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_default_is_nearest_neighbor() {
        assert_eq!(SearchType::default(), SearchType::NearestNeighbor);
    }
}
