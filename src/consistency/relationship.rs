//! Relationship suggestions
//!
//! Each unordered pair of characters runs through four independent rules.
//! Suggestions are advisory: nothing here ever writes a relationship back.

use super::CheckerConfig;
use crate::model::{has_text, Character};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const FAMILY_CONFIDENCE: f64 = 0.8;
const PROFESSIONAL_CONFIDENCE: f64 = 0.7;
const PEER_CONFIDENCE: f64 = 0.6;
const SOCIAL_CONFIDENCE: f64 = 0.5;

/// Kinds of suggested relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Family,
    Peer,
    Professional,
    Social,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Family => "family",
            RelationshipKind::Peer => "peer",
            RelationshipKind::Professional => "professional",
            RelationshipKind::Social => "social",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A possible relationship between two characters.
///
/// The pair is always ordered by ascending character id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSuggestion {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub character_ids: [i64; 2],
    pub characters: [String; 2],
    pub confidence: f64,
    pub reason: String,
}

/// Evaluate every pair of characters once.
pub fn suggest_relationships(
    characters: &[Character],
    config: &CheckerConfig,
) -> Vec<RelationshipSuggestion> {
    let mut suggestions = Vec::new();

    for (i, a) in characters.iter().enumerate() {
        for b in &characters[i + 1..] {
            let (first, second) = if b.id < a.id { (b, a) } else { (a, b) };
            evaluate_pair(first, second, config, &mut suggestions);
        }
    }

    suggestions
}

fn evaluate_pair(
    first: &Character,
    second: &Character,
    config: &CheckerConfig,
    out: &mut Vec<RelationshipSuggestion>,
) {
    let suggest = |kind, confidence, reason: String| RelationshipSuggestion {
        kind,
        character_ids: [first.id, second.id],
        characters: [first.name.clone(), second.name.clone()],
        confidence,
        reason,
    };

    if let Some(family) = shared_family_name(&first.name, &second.name) {
        out.push(suggest(
            RelationshipKind::Family,
            FAMILY_CONFIDENCE,
            format!("Same family name ({}) suggests a family tie", family),
        ));
    }

    if let (Some(age_a), Some(age_b)) = (first.age, second.age) {
        if age_a.abs_diff(age_b) <= config.peer_age_gap {
            out.push(suggest(
                RelationshipKind::Peer,
                PEER_CONFIDENCE,
                format!("Close ages ({} and {})", age_a, age_b),
            ));
        }
    }

    if let (Some(occ_a), Some(occ_b)) = (first.occupation.as_deref(), second.occupation.as_deref()) {
        let shared = shared_words(occ_a, occ_b);
        if !shared.is_empty() {
            out.push(suggest(
                RelationshipKind::Professional,
                PROFESSIONAL_CONFIDENCE,
                format!(
                    "Similar occupations ({} / {}), sharing: {}",
                    occ_a,
                    occ_b,
                    shared.into_iter().collect::<Vec<_>>().join(", ")
                ),
            ));
        }
    }

    if has_text(&first.social_class) && first.social_class == second.social_class {
        out.push(suggest(
            RelationshipKind::Social,
            SOCIAL_CONFIDENCE,
            format!("Same social class: {}", first.social_class.as_deref().unwrap_or_default()),
        ));
    }
}

/// Last name shared by two multi-word names, compared case-insensitively.
fn shared_family_name(name_a: &str, name_b: &str) -> Option<String> {
    let last_a = last_of_several(name_a)?;
    let last_b = last_of_several(name_b)?;
    let last_a_lower = last_a.to_lowercase();
    (last_a_lower == last_b.to_lowercase()).then_some(last_a_lower)
}

fn last_of_several(name: &str) -> Option<&str> {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() >= 2 { words.last().copied() } else { None }
}

/// Lower-cased words two occupations have in common, sorted.
fn shared_words(a: &str, b: &str) -> BTreeSet<String> {
    let words_a: BTreeSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let words_b: BTreeSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    words_a.intersection(&words_b).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: i64, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn suggest(characters: &[Character]) -> Vec<RelationshipSuggestion> {
        suggest_relationships(characters, &CheckerConfig::default())
    }

    #[test]
    fn test_family_without_peer_when_age_missing() {
        let anna = character(1, "Anna Smith");
        let mut tom = character(2, "Tom Smith");
        tom.age = Some(30);

        let suggestions = suggest(&[anna, tom]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, RelationshipKind::Family);
        assert_eq!(suggestions[0].character_ids, [1, 2]);
        assert_eq!(suggestions[0].confidence, 0.8);
    }

    #[test]
    fn test_family_is_case_insensitive() {
        let suggestions = suggest(&[character(1, "Anna SMITH"), character(2, "tom smith")]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, RelationshipKind::Family);
    }

    #[test]
    fn test_single_word_names_are_not_family() {
        assert!(suggest(&[character(1, "Smith"), character(2, "Anna Smith")]).is_empty());
        assert!(suggest(&[character(1, "Smith"), character(2, "Smith")]).is_empty());
    }

    #[test]
    fn test_peer_rule() {
        let mut a = character(1, "Ann");
        a.age = Some(25);
        let mut b = character(2, "Bea");
        b.age = Some(30);
        let mut c = character(3, "Cal");
        c.age = Some(31);

        let suggestions = suggest(&[a, b, c]);
        let pairs: Vec<[i64; 2]> = suggestions
            .iter()
            .filter(|s| s.kind == RelationshipKind::Peer)
            .map(|s| s.character_ids)
            .collect();
        assert_eq!(pairs, vec![[1, 2], [2, 3]]);
        assert!(suggestions.iter().all(|s| s.confidence == 0.6));
    }

    #[test]
    fn test_professional_rule() {
        let mut a = character(1, "Ann");
        a.occupation = Some("Emergency Doctor".to_string());
        let mut b = character(2, "Bea");
        b.occupation = Some("family doctor".to_string());
        let mut c = character(3, "Cal");
        c.occupation = Some("baker".to_string());
        let mut d = character(4, "Dan");
        d.occupation = Some(String::new());

        let suggestions = suggest(&[a, b, c, d]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, RelationshipKind::Professional);
        assert_eq!(suggestions[0].confidence, 0.7);
        assert!(suggestions[0].reason.contains("doctor"));
    }

    #[test]
    fn test_social_rule_is_exact() {
        let mut a = character(1, "Ann");
        a.social_class = Some("Nobility".to_string());
        let mut b = character(2, "Bea");
        b.social_class = Some("Nobility".to_string());
        let mut c = character(3, "Cal");
        c.social_class = Some("nobility".to_string());
        let mut d = character(4, "Dan");
        d.social_class = Some(String::new());
        let mut e = character(5, "Eve");
        e.social_class = Some(String::new());

        let suggestions = suggest(&[a, b, c, d, e]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind, RelationshipKind::Social);
        assert_eq!(suggestions[0].character_ids, [1, 2]);
        assert_eq!(suggestions[0].confidence, 0.5);
    }

    #[test]
    fn test_rules_are_independent() {
        let mut a = character(1, "Ann Martin");
        a.age = Some(40);
        a.occupation = Some("court musician".to_string());
        a.social_class = Some("bourgeois".to_string());
        let mut b = character(2, "Luc Martin");
        b.age = Some(42);
        b.occupation = Some("musician".to_string());
        b.social_class = Some("bourgeois".to_string());

        let kinds: Vec<RelationshipKind> = suggest(&[a, b]).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RelationshipKind::Family,
                RelationshipKind::Peer,
                RelationshipKind::Professional,
                RelationshipKind::Social
            ]
        );
    }

    #[test]
    fn test_commutative() {
        let mut a = character(1, "Ann Martin");
        a.age = Some(40);
        a.occupation = Some("sailor".to_string());
        let mut b = character(2, "Luc Martin");
        b.age = Some(38);
        b.occupation = Some("old sailor".to_string());

        let forward = suggest(&[a.clone(), b.clone()]);
        let backward = suggest(&[b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_each_pair_once() {
        let people: Vec<Character> = (1..=4)
            .map(|id| {
                let mut c = character(id, &format!("Person{} Doe", id));
                c.age = Some(20);
                c
            })
            .collect();

        let suggestions = suggest(&people);
        // 6 pairs, each family + peer
        assert_eq!(suggestions.len(), 12);
    }

    #[test]
    fn test_peer_gap_is_configurable() {
        let mut a = character(1, "Ann");
        a.age = Some(20);
        let mut b = character(2, "Bea");
        b.age = Some(28);

        let wide = CheckerConfig {
            peer_age_gap: 10,
            ..Default::default()
        };
        assert_eq!(suggest_relationships(&[a.clone(), b.clone()], &wide).len(), 1);
        assert!(suggest(&[a, b]).is_empty());
    }
}
