use crate::consistency::{Conflict, RelationshipSuggestion};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct ConflictRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Character")]
    character: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Characters")]
    characters: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn conflicts_table(conflicts: &[Conflict]) -> String {
    if conflicts.is_empty() {
        return String::new();
    }
    let rows: Vec<ConflictRow> = conflicts
        .iter()
        .map(|c| ConflictRow {
            severity: c.severity.to_string(),
            kind: c.kind.to_string(),
            event: c.event_title.clone().unwrap_or_default(),
            character: c.character_name.clone().unwrap_or_default(),
            message: c.message.clone(),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

pub fn suggestions_table(suggestions: &[RelationshipSuggestion]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let rows: Vec<SuggestionRow> = suggestions
        .iter()
        .map(|s| SuggestionRow {
            kind: s.kind.to_string(),
            characters: s.characters.join(" & "),
            confidence: format!("{:.0}%", s.confidence * 100.0),
            reason: s.reason.clone(),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyChecker;
    use crate::model::Character;

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(TableBuilder::new().build().is_empty());
        assert!(conflicts_table(&[]).is_empty());
    }

    #[test]
    fn test_suggestions_table() {
        let characters = vec![
            Character {
                id: 1,
                name: "Anna Smith".to_string(),
                ..Default::default()
            },
            Character {
                id: 2,
                name: "Tom Smith".to_string(),
                ..Default::default()
            },
        ];
        let suggestions = ConsistencyChecker::default().suggest_relationships(&characters);
        let table = suggestions_table(&suggestions);
        assert!(table.contains("Anna Smith & Tom Smith"));
        assert!(table.contains("80%"));
    }
}
