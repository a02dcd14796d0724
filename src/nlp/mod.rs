//! Text analysis collaborators
//!
//! The checker and the manuscript pipeline only see the `TextSimilarity` /
//! `TextAnalyzer` traits. A concrete analyzer is built once at startup from
//! config and shared read-only afterwards.

pub mod embedding;
pub mod lexical;
pub mod manuscript;
pub mod text;

pub use embedding::EmbeddingAnalyzer;
pub use lexical::LexicalAnalyzer;
pub use manuscript::{analyze_manuscript, ManuscriptReport};
pub use text::{analyze_text, detect_character_mentions, split_sentences, Mention, TextReport};

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Similarity between two short texts, in `[0, 1]`.
pub trait TextSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f32;
}

/// A named span found in a text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Full text analysis collaborator.
pub trait TextAnalyzer: TextSimilarity {
    /// Backend name, for logs and health output.
    fn name(&self) -> &'static str;

    /// Named spans in `text`.
    ///
    /// The default picks runs of capitalized words, skipping a lone
    /// capitalized word that merely opens a sentence.
    fn extract_entities(&self, text: &str) -> Vec<Entity> {
        capitalized_spans(text)
    }
}

/// How much text analysis to attach to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Fast,
    Detailed,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Fast => "fast",
            AnalysisMode::Detailed => "detailed",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(AnalysisMode::Fast),
            "detailed" | "full" => Ok(AnalysisMode::Detailed),
            _ => Err(Error::InvalidInput(format!("Unknown analysis mode: {}", s))),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which analyzer to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NlpBackend {
    /// Word-overlap similarity, no model download
    #[default]
    Lexical,
    /// Local sentence embeddings (all-MiniLM-L6-v2)
    Embedding,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    pub backend: NlpBackend,
}

/// Build the analyzer selected in config.
pub fn build_analyzer(config: &NlpConfig) -> Result<Arc<dyn TextAnalyzer>> {
    let analyzer: Arc<dyn TextAnalyzer> = match config.backend {
        NlpBackend::Lexical => Arc::new(LexicalAnalyzer::new()),
        NlpBackend::Embedding => Arc::new(EmbeddingAnalyzer::new()?),
    };
    tracing::info!("Text analyzer ready: {}", analyzer.name());
    Ok(analyzer)
}

fn capitalized_span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\p{Lu}[\p{L}'’-]*(?:[ \t]+\p{Lu}[\p{L}'’-]*)*").expect("static regex")
    })
}

pub(crate) fn capitalized_spans(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for sentence in split_sentences(text) {
        for m in capitalized_span_regex().find_iter(sentence.text) {
            let opens_sentence = !sentence.text[..m.start()].chars().any(char::is_alphanumeric);
            let single_word = !m.as_str().contains(char::is_whitespace);
            if opens_sentence && single_word {
                continue;
            }
            entities.push(Entity {
                text: m.as_str().to_string(),
                label: "MISC".to_string(),
                start: sentence.start + m.start(),
                end: sentence.start + m.end(),
            });
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("FAST".parse::<AnalysisMode>().unwrap(), AnalysisMode::Fast);
        assert_eq!("detailed".parse::<AnalysisMode>().unwrap(), AnalysisMode::Detailed);
        assert!("deep".parse::<AnalysisMode>().is_err());
    }

    #[test]
    fn test_capitalized_spans() {
        let text = "The rain fell on Paris. Jean Dupont waited near Notre Dame. She left.";
        let found: Vec<String> = capitalized_spans(text).into_iter().map(|e| e.text).collect();
        assert_eq!(found, vec!["Paris", "Jean Dupont", "Notre Dame"]);
    }

    #[test]
    fn test_capitalized_span_offsets() {
        let text = "We met Anna at dawn.";
        let entities = capitalized_spans(text);
        assert_eq!(entities.len(), 1);
        assert_eq!(&text[entities[0].start..entities[0].end], "Anna");
    }

    #[test]
    fn test_build_lexical_analyzer() {
        let analyzer = build_analyzer(&NlpConfig::default()).unwrap();
        assert_eq!(analyzer.name(), "lexical");
    }
}
