use super::text::words;
use super::{TextAnalyzer, TextSimilarity};
use std::collections::HashSet;

/// Word-overlap analyzer.
///
/// Similarity is the Jaccard index of the lower-cased word sets. Needs no
/// model and gives the same answer on every machine.
#[derive(Debug, Clone, Default)]
pub struct LexicalAnalyzer;

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl TextSimilarity for LexicalAnalyzer {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        let set_a: HashSet<String> = words(a).map(str::to_lowercase).collect();
        let set_b: HashSet<String> = words(b).map(str::to_lowercase).collect();
        if set_a.is_empty() || set_b.is_empty() {
            return 0.0;
        }
        let shared = set_a.intersection(&set_b).count();
        let total = set_a.union(&set_b).count();
        shared as f32 / total as f32
    }
}

impl TextAnalyzer for LexicalAnalyzer {
    fn name(&self) -> &'static str {
        "lexical"
    }
}
