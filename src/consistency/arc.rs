//! Character arc coherence

use super::{CheckerConfig, Severity};
use crate::model::{has_text, Character};
use crate::nlp::TextSimilarity;
use serde::{Deserialize, Serialize};

const MISSING_FIELD_PENALTY: i32 = 10;
const SIMILAR_TRAITS_PENALTY: i32 = 5;
const COMPLETE_SCORE: i32 = 80;

/// A problem found on a character sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// Completeness score for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcReport {
    /// 0-100
    pub score: u32,
    pub issues: Vec<ArcIssue>,
    pub complete: bool,
}

/// Area a development hint is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintCategory {
    Arc,
    Relationship,
    Development,
    Conflict,
}

impl HintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintCategory::Arc => "arc",
            HintCategory::Relationship => "relationship",
            HintCategory::Development => "development",
            HintCategory::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for HintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentHint {
    pub category: HintCategory,
    pub suggestion: String,
}

/// Score the arc of a character.
///
/// Starts at 100 and loses points for every missing essential field and for
/// strengths that read like the weaknesses.
pub fn analyze_arc<S: TextSimilarity + ?Sized>(
    character: &Character,
    similarity: &S,
    config: &CheckerConfig,
) -> ArcReport {
    let essentials: [(&str, &Option<String>, &str); 5] = [
        ("desires", &character.desires, "Character desires are missing"),
        ("fears", &character.fears, "Character fears are missing"),
        ("internal_conflict", &character.internal_conflict, "Internal conflict is missing"),
        ("personality", &character.personality, "Personality traits are missing"),
        ("backstory", &character.backstory, "Backstory is missing"),
    ];

    let mut score: i32 = 100;
    let mut issues = Vec::new();

    for (field, value, message) in essentials {
        if !has_text(value) {
            issues.push(ArcIssue {
                severity: Severity::Warning,
                field: field.to_string(),
                message: message.to_string(),
            });
            score -= MISSING_FIELD_PENALTY;
        }
    }

    if let (Some(strengths), Some(weaknesses)) = (
        character.strengths.as_deref().filter(|s| !s.trim().is_empty()),
        character.weaknesses.as_deref().filter(|s| !s.trim().is_empty()),
    ) {
        let score_between = similarity.similarity(strengths, weaknesses);
        tracing::debug!("Strengths/weaknesses similarity for {}: {:.3}", character.name, score_between);
        if score_between > config.similarity_threshold {
            issues.push(ArcIssue {
                severity: Severity::Warning,
                field: "strengths_weaknesses".to_string(),
                message: "Strengths and weaknesses look similar".to_string(),
            });
            score -= SIMILAR_TRAITS_PENALTY;
        }
    }

    if character.importance.is_some_and(|i| i >= config.major_importance)
        && character.role.as_deref() == Some("minor")
    {
        issues.push(ArcIssue {
            severity: Severity::Info,
            field: "role".to_string(),
            message: "High importance but minor role - possible inconsistency".to_string(),
        });
    }

    let score = score.max(0);
    ArcReport {
        score: score as u32,
        issues,
        complete: score >= COMPLETE_SCORE,
    }
}

/// Development directions based on archetype and missing material.
pub fn suggest_development(character: &Character) -> Vec<DevelopmentHint> {
    let mut hints = Vec::new();

    match character.archetype.as_deref() {
        Some("hero") => hints.push(DevelopmentHint {
            category: HintCategory::Arc,
            suggestion: "Consider a classic hero's journey: ordinary world, call, refusal, mentor, trials, transformation".to_string(),
        }),
        Some("mentor") => hints.push(DevelopmentHint {
            category: HintCategory::Relationship,
            suggestion: "Develop the mentor/student bond and the moment the mentor lets the hero go".to_string(),
        }),
        _ => {}
    }

    if !has_text(&character.backstory) {
        hints.push(DevelopmentHint {
            category: HintCategory::Development,
            suggestion: "Create a formative or traumatic past event that explains current fears and desires".to_string(),
        });
    }

    if !has_text(&character.internal_conflict) {
        if let (Some(desires), Some(fears)) = (
            character.desires.as_deref().filter(|s| !s.trim().is_empty()),
            character.fears.as_deref().filter(|s| !s.trim().is_empty()),
        ) {
            hints.push(DevelopmentHint {
                category: HintCategory::Conflict,
                suggestion: format!(
                    "Build a conflict between the desire ({}...) and the fear ({}...)",
                    preview(desires),
                    preview(fears)
                ),
            });
        }
    }

    hints
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl TextSimilarity for Fixed {
        fn similarity(&self, _a: &str, _b: &str) -> f32 {
            self.0
        }
    }

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn rounded() -> Character {
        Character {
            id: 1,
            name: "Elena".to_string(),
            desires: text("To be free"),
            fears: text("Losing her sister"),
            internal_conflict: text("Duty against freedom"),
            personality: text("Stubborn, witty"),
            backstory: text("Raised in a lighthouse"),
            ..Default::default()
        }
    }

    fn analyze(character: &Character, similarity: f32) -> ArcReport {
        analyze_arc(character, &Fixed(similarity), &CheckerConfig::default())
    }

    #[test]
    fn test_all_essentials_missing() {
        let report = analyze(&Character::default(), 0.0);
        assert_eq!(report.score, 50);
        assert!(!report.complete);
        assert_eq!(report.issues.len(), 5);
        assert!(report.issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn test_complete_character() {
        let report = analyze(&rounded(), 0.0);
        assert_eq!(report.score, 100);
        assert!(report.complete);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let mut character = rounded();
        character.fears = text("   ");
        let report = analyze(&character, 0.0);
        assert_eq!(report.score, 90);
        assert_eq!(report.issues[0].field, "fears");
    }

    #[test]
    fn test_similar_strengths_and_weaknesses() {
        let mut character = rounded();
        character.strengths = text("brave and loyal");
        character.weaknesses = text("brave and loyal to a fault");

        let flagged = analyze(&character, 0.9);
        assert_eq!(flagged.score, 95);
        assert_eq!(flagged.issues.len(), 1);
        assert_eq!(flagged.issues[0].field, "strengths_weaknesses");

        // Threshold is strict
        let at_threshold = analyze(&character, 0.7);
        assert_eq!(at_threshold.score, 100);
    }

    #[test]
    fn test_similarity_skipped_when_one_side_missing() {
        let mut character = rounded();
        character.strengths = text("brave");
        let report = analyze(&character, 1.0);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn test_important_minor_role_is_info_only() {
        let mut character = rounded();
        character.importance = Some(9);
        character.role = text("minor");

        let report = analyze(&character, 0.0);
        assert_eq!(report.score, 100);
        assert!(report.complete);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Info);
        assert_eq!(report.issues[0].field, "role");

        character.importance = Some(7);
        assert!(analyze(&character, 0.0).issues.is_empty());
    }

    #[test]
    fn test_score_complete_boundary() {
        let mut character = rounded();
        character.desires = None;
        character.fears = None;
        let report = analyze(&character, 0.0);
        assert_eq!(report.score, 80);
        assert!(report.complete);

        character.strengths = text("x");
        character.weaknesses = text("x");
        let report = analyze(&character, 1.0);
        assert_eq!(report.score, 75);
        assert!(!report.complete);
    }

    #[test]
    fn test_development_hints() {
        let character = Character {
            archetype: text("hero"),
            desires: text("To rule the seas"),
            fears: text("Drowning"),
            ..Default::default()
        };

        let categories: Vec<HintCategory> =
            suggest_development(&character).iter().map(|h| h.category).collect();
        assert_eq!(
            categories,
            vec![HintCategory::Arc, HintCategory::Development, HintCategory::Conflict]
        );
    }

    #[test]
    fn test_development_hint_preview_is_truncated() {
        let long = "a".repeat(120);
        let character = Character {
            archetype: text("mentor"),
            backstory: text("Known"),
            desires: Some(long.clone()),
            fears: Some(long),
            ..Default::default()
        };

        let hints = suggest_development(&character);
        assert_eq!(hints[0].category, HintCategory::Relationship);
        assert_eq!(hints[1].category, HintCategory::Conflict);
        assert!(hints[1].suggestion.contains(&format!("({}...)", "a".repeat(50))));
        assert!(!hints[1].suggestion.contains(&"a".repeat(51)));
    }
}
