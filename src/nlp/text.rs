//! Manuscript text statistics
//!
//! Sentence splitting and word counting are heuristic: prose is
//! split on terminal punctuation followed by whitespace.

use super::{AnalysisMode, Entity, TextAnalyzer};
use crate::model::Character;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

const TEMPORAL_MARKERS: &[&str] = &[
    "suddenly", "then", "later", "finally", "meanwhile", "afterwards", "soudain", "puis", "ensuite",
];

/// A sentence slice of a larger text. Offsets are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub char_count: usize,
    pub unique_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleStats {
    /// Words per sentence
    pub avg_sentence_length: f64,
    /// Characters per word
    pub avg_word_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureStats {
    /// Sentences containing a time transition ("then", "suddenly"...)
    pub temporal_transitions: usize,
    pub paragraph_estimate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceReport {
    pub index: usize,
    pub text: String,
    /// Entity offsets relative to the sentence
    pub entities: Vec<Entity>,
}

/// Analysis of a piece of prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextReport {
    pub entities: Vec<Entity>,
    pub stats: TextStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<SentenceReport>>,
}

/// How often a character is named in a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub character_id: i64,
    pub name: String,
    pub count: usize,
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").expect("static regex"))
}

/// Words of a text, punctuation dropped.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    word_regex().find_iter(text).map(|m| m.as_str())
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closer(c: char) -> bool {
    is_terminator(c) || matches!(c, '"' | '\'' | '»' | '”' | ')')
}

/// Split prose into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_closer(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        if chars.peek().is_none_or(|&(_, next)| next.is_whitespace()) {
            push_sentence(text, start, end, &mut sentences);
            start = end;
        }
    }
    push_sentence(text, start, text.len(), &mut sentences);

    sentences
}

fn push_sentence<'a>(text: &'a str, start: usize, end: usize, out: &mut Vec<Sentence<'a>>) {
    let raw = &text[start..end];
    let trimmed_start = raw.trim_start();
    let trimmed = trimmed_start.trim_end();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - trimmed_start.len());
    out.push(Sentence {
        text: trimmed,
        start: offset,
        end: offset + trimmed.len(),
    });
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Analyze prose. `Detailed` adds style, structure, dialogue and per-sentence output.
pub fn analyze_text(text: &str, mode: AnalysisMode, analyzer: &dyn TextAnalyzer) -> TextReport {
    let sentences = split_sentences(text);
    let all_words: Vec<&str> = words(text).collect();
    let unique: HashSet<String> = all_words
        .iter()
        .filter(|w| w.chars().any(char::is_alphabetic))
        .map(|w| w.to_lowercase())
        .collect();

    let entities = analyzer.extract_entities(text);
    let stats = TextStats {
        word_count: all_words.len(),
        sentence_count: sentences.len(),
        char_count: text.chars().count(),
        unique_words: unique.len(),
    };

    let mut report = TextReport {
        entities,
        stats,
        style: None,
        structure: None,
        dialogue_ratio: None,
        sentences: None,
    };

    if mode == AnalysisMode::Detailed {
        report.style = Some(style_stats(&sentences, &all_words));
        report.structure = Some(structure_stats(text, &sentences));
        report.dialogue_ratio = Some(dialogue_ratio(text));
        report.sentences = Some(sentence_reports(&sentences, &report.entities));
    }

    report
}

fn style_stats(sentences: &[Sentence<'_>], all_words: &[&str]) -> StyleStats {
    let avg_sentence_length = if sentences.is_empty() {
        0.0
    } else {
        all_words.len() as f64 / sentences.len() as f64
    };
    let avg_word_length = if all_words.is_empty() {
        0.0
    } else {
        all_words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / all_words.len() as f64
    };
    StyleStats {
        avg_sentence_length: round2(avg_sentence_length),
        avg_word_length: round2(avg_word_length),
    }
}

fn structure_stats(text: &str, sentences: &[Sentence<'_>]) -> StructureStats {
    let temporal_transitions = sentences
        .iter()
        .filter(|s| {
            words(s.text).any(|w| {
                let w = w.to_lowercase();
                TEMPORAL_MARKERS.contains(&w.as_str())
            })
        })
        .count();
    StructureStats {
        temporal_transitions,
        paragraph_estimate: text.matches("\n\n").count() + 1,
    }
}

/// Rough share of the text spent in dialogue, from quote marks and dialogue dashes.
fn dialogue_ratio(text: &str) -> f64 {
    let quote_marks = text.chars().filter(|c| matches!(c, '«' | '»' | '"' | '“' | '”')).count();
    let dash_lines = text.lines().filter(|l| l.trim_start().starts_with('—')).count();
    let total = text.chars().count().max(1);
    round2(((quote_marks + dash_lines * 20) as f64 / total as f64).min(1.0))
}

fn sentence_reports(sentences: &[Sentence<'_>], entities: &[Entity]) -> Vec<SentenceReport> {
    sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| SentenceReport {
            index,
            text: sentence.text.to_string(),
            entities: entities
                .iter()
                .filter(|e| e.start >= sentence.start && e.end <= sentence.end)
                .map(|e| Entity {
                    start: e.start - sentence.start,
                    end: e.end - sentence.start,
                    ..e.clone()
                })
                .collect(),
        })
        .collect()
}

/// Lowercased word with any possessive suffix removed.
fn mention_token(word: &str) -> String {
    let lower = word.to_lowercase();
    match lower.strip_suffix("'s").or_else(|| lower.strip_suffix("’s")) {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Count case-insensitive whole-word occurrences of each character's name
/// and nickname.
pub fn detect_character_mentions(text: &str, characters: &[Character]) -> Vec<Mention> {
    let tokens: Vec<String> = words(text).map(mention_token).collect();
    let count = |name: &str| -> usize {
        let needle: Vec<String> = words(name).map(mention_token).collect();
        if needle.is_empty() || needle.len() > tokens.len() {
            return 0;
        }
        tokens.windows(needle.len()).filter(|window| *window == needle.as_slice()).count()
    };

    characters
        .iter()
        .filter_map(|character| {
            let total = count(&character.name)
                + character.nickname.as_deref().map(count).unwrap_or(0);
            (total > 0).then(|| Mention {
                character_id: character.id,
                name: character.name.clone(),
                count: total,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::LexicalAnalyzer;

    #[test]
    fn test_split_sentences() {
        let text = "It rained. Did it stop?  No!\n\"Never,\" she said... The end";
        let texts: Vec<&str> = split_sentences(text).iter().map(|s| s.text).collect();
        assert_eq!(
            texts,
            vec!["It rained.", "Did it stop?", "No!", "\"Never,\" she said...", "The end"]
        );
    }

    #[test]
    fn test_sentence_offsets_point_into_text() {
        let text = "  One.   Two three.  ";
        for sentence in split_sentences(text) {
            assert_eq!(&text[sentence.start..sentence.end], sentence.text);
        }
    }

    #[test]
    fn test_decimal_does_not_split() {
        let texts: Vec<&str> = split_sentences("It cost 3.5 coins. Fine.").iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["It cost 3.5 coins.", "Fine."]);
    }

    #[test]
    fn test_fast_analysis() {
        let text = "Anna walked to the harbor. Then she met Tom Smith at the harbor.";
        let report = analyze_text(text, AnalysisMode::Fast, &LexicalAnalyzer::new());

        assert_eq!(report.stats.sentence_count, 2);
        assert_eq!(report.stats.word_count, 13);
        assert_eq!(report.stats.char_count, text.chars().count());
        assert_eq!(report.stats.unique_words, 11);
        assert!(report.style.is_none());
        assert!(report.sentences.is_none());
        assert!(report.entities.iter().any(|e| e.text == "Tom Smith"));
    }

    #[test]
    fn test_detailed_analysis() {
        let text = "Anna waited.\n\nTom Smith then arrived. “Hello,” he said.";
        let report = analyze_text(text, AnalysisMode::Detailed, &LexicalAnalyzer::new());

        let structure = report.structure.unwrap();
        assert_eq!(structure.temporal_transitions, 1);
        assert_eq!(structure.paragraph_estimate, 2);
        assert!(report.dialogue_ratio.unwrap() > 0.0);

        let sentences = report.sentences.unwrap();
        assert_eq!(sentences.len(), 3);
        let entity = &sentences[1].entities[0];
        assert_eq!(entity.text, "Tom Smith");
        assert_eq!(&sentences[1].text[entity.start..entity.end], "Tom Smith");
    }

    #[test]
    fn test_character_mentions() {
        let characters = vec![
            Character {
                id: 1,
                name: "Anna".to_string(),
                nickname: Some("Annie".to_string()),
                ..Default::default()
            },
            Character {
                id: 2,
                name: "Tom".to_string(),
                ..Default::default()
            },
            Character {
                id: 3,
                name: "Zoe".to_string(),
                ..Default::default()
            },
        ];

        let mentions = detect_character_mentions("ANNA saw Tom. Tom waved at annie.", &characters);
        assert_eq!(
            mentions,
            vec![
                Mention { character_id: 1, name: "Anna".to_string(), count: 2 },
                Mention { character_id: 2, name: "Tom".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_character_mentions_match_whole_words() {
        let characters = vec![
            Character {
                id: 1,
                name: "Ann".to_string(),
                ..Default::default()
            },
            Character {
                id: 2,
                name: "Tom".to_string(),
                ..Default::default()
            },
            Character {
                id: 3,
                name: "Jean Dupont".to_string(),
                ..Default::default()
            },
        ];

        let text = "Anna sails tomorrow. Jean Dupont's ship waits; Dupont and Jean argue.";
        let mentions = detect_character_mentions(text, &characters);
        assert_eq!(
            mentions,
            vec![Mention { character_id: 3, name: "Jean Dupont".to_string(), count: 1 }]
        );
    }
}
