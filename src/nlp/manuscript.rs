//! Manuscript analysis: prose statistics, character mentions and the
//! timeline conflicts of the characters a chapter names.

use super::text::{analyze_text, detect_character_mentions, Mention, TextReport};
use super::{AnalysisMode, TextAnalyzer};
use crate::consistency::{Conflict, ConsistencyChecker};
use crate::model::{Character, Manuscript, TimelineEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManuscriptReport {
    pub id: i64,
    pub title: String,
    pub chapter: u32,
    pub status: String,
    pub mode: AnalysisMode,
    /// Length in characters
    pub text_length: usize,
    pub analysis: TextReport,
    pub mentions: Vec<Mention>,
    pub conflicts: Vec<Conflict>,
}

/// Analyze a chapter against the story's characters and timeline.
///
/// `mode` only controls how much of the prose analysis is attached; the
/// conflicts are the same in both modes.
pub fn analyze_manuscript(
    manuscript: &Manuscript,
    characters: &[Character],
    events: &[TimelineEvent],
    mode: AnalysisMode,
    analyzer: &dyn TextAnalyzer,
    checker: &ConsistencyChecker,
) -> ManuscriptReport {
    let text = manuscript.text.as_deref().unwrap_or_default();

    let mut analysis = analyze_text(text, mode, analyzer);
    label_characters(&mut analysis, characters);

    let mentions = detect_character_mentions(text, characters);
    let mentioned: HashSet<i64> = mentions.iter().map(|m| m.character_id).collect();

    let cast: Vec<Character> = characters
        .iter()
        .filter(|c| mentioned.contains(&c.id))
        .cloned()
        .collect();
    let scenes: Vec<TimelineEvent> = events
        .iter()
        .filter(|e| e.character_ids.iter().any(|id| mentioned.contains(id)))
        .cloned()
        .collect();
    let conflicts = checker.check_timeline_consistency(&scenes, &cast);

    tracing::debug!(
        "Manuscript {} ({} mode): {} entities, {} mentions, {} conflicts",
        manuscript.id,
        mode,
        analysis.entities.len(),
        mentions.len(),
        conflicts.len()
    );

    ManuscriptReport {
        id: manuscript.id,
        title: manuscript.title.clone(),
        chapter: manuscript.chapter,
        status: manuscript.status.clone(),
        mode,
        text_length: text.chars().count(),
        analysis,
        mentions,
        conflicts,
    }
}

/// Mark entities that name a known character as persons.
fn label_characters(analysis: &mut TextReport, characters: &[Character]) {
    let is_character = |span: &str| {
        characters.iter().any(|c| {
            c.name.eq_ignore_ascii_case(span)
                || c.name.split_whitespace().any(|part| part.eq_ignore_ascii_case(span))
        })
    };

    for entity in &mut analysis.entities {
        if is_character(&entity.text) {
            entity.label = "PER".to_string();
        }
    }
    if let Some(sentences) = analysis.sentences.as_mut() {
        for entity in sentences.iter_mut().flat_map(|s| s.entities.iter_mut()) {
            if is_character(&entity.text) {
                entity.label = "PER".to_string();
            }
        }
    }
}
