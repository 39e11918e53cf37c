use std::fmt::Write as _;

use serde::Serialize;
use sokogen_core::{encode, QualityMetrics};
use sokogen_generator::Level;

/// Presentation view of an accepted level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct LevelReport {
    pub(crate) grid: Vec<String>,
    pub(crate) keeper: [u32; 2],
    pub(crate) entities: usize,
    pub(crate) path: String,
    pub(crate) metrics: QualityMetrics,
    pub(crate) seed: u64,
    pub(crate) attempts: u32,
    pub(crate) elapsed_ms: u128,
}

impl From<&Level> for LevelReport {
    fn from(level: &Level) -> Self {
        Self {
            grid: encode(level.grid()).lines().map(str::to_owned).collect(),
            keeper: [level.keeper().row(), level.keeper().column()],
            entities: level.entities(),
            path: level.path().run_length_encoded(),
            metrics: level.metrics(),
            seed: level.seed(),
            attempts: level.attempts(),
            elapsed_ms: level.elapsed().as_millis(),
        }
    }
}

impl LevelReport {
    /// Human-readable rendering: the grid followed by one labelled line per field.
    pub(crate) fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.grid {
            text.push_str(line);
            text.push('\n');
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "KEEPER: ({}, {})", self.keeper[0], self.keeper[1]);
        let _ = writeln!(text, "ENTITIES: {}", self.entities);
        let _ = writeln!(text, "PATH: {}", self.path.trim_end());
        let _ = writeln!(text, "{}", self.metrics);
        let _ = writeln!(
            text,
            "SEED: {} | ATTEMPTS: {} | ELAPSED: {} ms",
            self.seed, self.attempts, self.elapsed_ms
        );
        text
    }

    pub(crate) fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> LevelReport {
        LevelReport {
            grid: vec!["#####".to_owned(), "#@$.#".to_owned(), "#####".to_owned()],
            keeper: [1, 1],
            entities: 1,
            path: "1R ".to_owned(),
            metrics: QualityMetrics {
                moves: 1,
                pushes: 1,
                directional_pushes: 1,
                reverse_pushes: 0,
                box_changes: 0,
                corner_goals: 1,
            },
            seed: 42,
            attempts: 3,
            elapsed_ms: 17,
        }
    }

    #[test]
    fn text_lists_every_field() {
        let text = report().to_text();
        assert!(text.starts_with("#####\n#@$.#\n#####\n\n"));
        assert!(text.contains("KEEPER: (1, 1)\n"));
        assert!(text.contains("ENTITIES: 1\n"));
        assert!(text.contains("PATH: 1R\n"));
        assert!(text.contains(
            "MOVES: 1 | PUSHES: 1 | DIR PUSHES: 1 | REV PUSHES: 0 | BOX CHANGES: 0 | CORNER GOALS: 1\n"
        ));
        assert!(text.ends_with("SEED: 42 | ATTEMPTS: 3 | ELAPSED: 17 ms\n"));
    }

    #[test]
    fn json_carries_the_six_counters() {
        let json = report().to_json().expect("report serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["entities"], 1);
        assert_eq!(value["keeper"][1], 1);
        assert_eq!(value["metrics"]["corner_goals"], 1);
        assert_eq!(value["metrics"]["directional_pushes"], 1);
        assert_eq!(value["grid"][1], "#@$.#");
        assert_eq!(value["path"], "1R ");
    }
}
