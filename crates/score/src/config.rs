use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::matcher::Metric;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One study: every model × context window × novel combination is a run.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    pub name: String,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub alignment: Alignment,
    /// Context window sizes, in sentences per side.
    pub contexts: Vec<u32>,
    /// Prediction file template, e.g. `context{context}/{model}/{novel}.csv`.
    pub predictions: String,
    pub novels: Vec<NovelConfig>,
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NovelConfig {
    pub name: String,
    pub quotations: String,
    pub characters: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Display name for reports. Defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
}

impl ModelConfig {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// What to do when quotation and prediction tables differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Cut both tables to the shorter length and log a warning.
    #[default]
    Truncate,
    /// Refuse to score.
    Strict,
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncate => write!(f, "truncate"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "truncate" => Ok(Self::Truncate),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown alignment '{other}' (expected truncate or strict)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names of the input tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub character_name: String,
    pub aliases: String,
    pub speaker: String,
    pub category: String,
    pub spans: String,
    pub prediction: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            character_name: "Main Name".into(),
            aliases: "Aliases".into(),
            speaker: "speaker".into(),
            category: "quoteType".into(),
            spans: "quoteByteSpans".into(),
            prediction: "inferred_speaker".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction path template
// ---------------------------------------------------------------------------

const PLACEHOLDERS: [&str; 3] = ["context", "model", "novel"];

/// Placeholder names used in a template, in order of appearance.
fn template_placeholders(template: &str) -> Result<Vec<&str>, ScoreError> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(ScoreError::ConfigValidation(format!(
                "predictions template '{template}': unmatched '}}'"
            )));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ScoreError::ConfigValidation(format!("predictions template '{template}': unclosed '{{'"))
        })?;
        let name = &after[..close];
        if !PLACEHOLDERS.contains(&name) {
            return Err(ScoreError::ConfigValidation(format!(
                "predictions template '{template}': unknown placeholder '{{{name}}}'"
            )));
        }
        found.push(name);
        rest = &after[close + 1..];
    }
    Ok(found)
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl StudyConfig {
    pub fn from_toml(input: &str) -> Result<Self, ScoreError> {
        let config: StudyConfig =
            toml::from_str(input).map_err(|e| ScoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.novels.is_empty() {
            return Err(ScoreError::ConfigValidation("at least one novel is required".into()));
        }
        if self.models.is_empty() {
            return Err(ScoreError::ConfigValidation("at least one model is required".into()));
        }
        if self.contexts.is_empty() {
            return Err(ScoreError::ConfigValidation(
                "at least one context window is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for novel in &self.novels {
            if !seen.insert(novel.name.as_str()) {
                return Err(ScoreError::ConfigValidation(format!(
                    "duplicate novel '{}'",
                    novel.name
                )));
            }
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(ScoreError::ConfigValidation(format!(
                    "duplicate model '{}'",
                    model.name
                )));
            }
        }
        let mut seen = HashSet::new();
        for context in &self.contexts {
            if !seen.insert(*context) {
                return Err(ScoreError::ConfigValidation(format!(
                    "duplicate context window {context}"
                )));
            }
        }

        // Every dimension that varies must appear in the template, or two runs
        // would read the same prediction file.
        let used = template_placeholders(&self.predictions)?;
        let dims = [
            ("context", self.contexts.len()),
            ("model", self.models.len()),
            ("novel", self.novels.len()),
        ];
        for (name, len) in dims {
            if len > 1 && !used.contains(&name) {
                return Err(ScoreError::ConfigValidation(format!(
                    "predictions template '{}' must contain '{{{name}}}' ({len} {name} values)",
                    self.predictions
                )));
            }
        }

        Ok(())
    }

    /// Relative path of one run's prediction table.
    pub fn prediction_path(&self, context: u32, model: &ModelConfig, novel: &NovelConfig) -> String {
        let mut out = String::with_capacity(self.predictions.len());
        let mut rest = self.predictions.as_str();
        // Single pass: substituted names are never scanned again.
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            out.push_str(&rest[..open]);
            match &after[..close] {
                "context" => out.push_str(&context.to_string()),
                "model" => out.push_str(&model.name),
                "novel" => out.push_str(&novel.name),
                other => {
                    out.push('{');
                    out.push_str(other);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Context study"
metric = "strong"
contexts = [0, 1, 2, 4, 8, 16]
predictions = "context{context}/{model}/{novel}.csv"

[[novels]]
name = "PrideAndPrejudice"
quotations = "PrideAndPrejudice/quotation_info.csv"
characters = "PrideAndPrejudice/character_info.csv"

[[novels]]
name = "Emma"
quotations = "Emma/quotation_info.csv"
characters = "Emma/character_info.csv"

[[models]]
name = "Mistral 7b INST"

[[models]]
name = "Llama 13b"
label = "Llama 2 13B"
"#;

    #[test]
    fn parse_valid() {
        let config = StudyConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Context study");
        assert_eq!(config.metric, Metric::Strong);
        assert_eq!(config.alignment, Alignment::Truncate);
        assert_eq!(config.contexts, [0, 1, 2, 4, 8, 16]);
        assert_eq!(config.novels.len(), 2);
        assert_eq!(config.models[0].display_name(), "Mistral 7b INST");
        assert_eq!(config.models[1].display_name(), "Llama 2 13B");
        assert_eq!(config.columns.aliases, "Aliases");
        assert_eq!(config.columns.prediction, "inferred_speaker");
    }

    #[test]
    fn prediction_path_fills_template() {
        let config = StudyConfig::from_toml(VALID).unwrap();
        let path = config.prediction_path(8, &config.models[1], &config.novels[1]);
        assert_eq!(path, "context8/Llama 13b/Emma.csv");
    }

    #[test]
    fn partial_column_override_keeps_defaults() {
        let input = format!(
            r#"{VALID}
[columns]
prediction = "answer"
"#
        );
        let config = StudyConfig::from_toml(&input).unwrap();
        assert_eq!(config.columns.prediction, "answer");
        assert_eq!(config.columns.speaker, "speaker");
    }

    #[test]
    fn parse_weak_strict() {
        let input = VALID
            .replace("metric = \"strong\"", "metric = \"weak\"\nalignment = \"strict\"");
        let config = StudyConfig::from_toml(&input).unwrap();
        assert_eq!(config.metric, Metric::Weak);
        assert_eq!(config.alignment, Alignment::Strict);
    }

    #[test]
    fn reject_unknown_metric() {
        let input = VALID.replace("metric = \"strong\"", "metric = \"medium\"");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ScoreError::ConfigParse(_)));
    }

    #[test]
    fn reject_template_missing_varying_dimension() {
        let input = VALID.replace("context{context}/{model}/{novel}.csv", "{model}/{novel}.csv");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("{context}"), "{err}");
    }

    #[test]
    fn template_may_omit_single_valued_dimension() {
        let input = VALID
            .replace("contexts = [0, 1, 2, 4, 8, 16]", "contexts = [4]")
            .replace("context{context}/{model}/{novel}.csv", "{model}/{novel}.csv");
        let config = StudyConfig::from_toml(&input).unwrap();
        let path = config.prediction_path(4, &config.models[0], &config.novels[0]);
        assert_eq!(path, "Mistral 7b INST/PrideAndPrejudice.csv");
    }

    #[test]
    fn reject_unknown_placeholder() {
        let input = VALID.replace("{novel}.csv", "{novel}-{seed}.csv");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("{seed}"), "{err}");
    }

    #[test]
    fn reject_unbalanced_braces() {
        let input = VALID.replace("{novel}.csv", "{novel.csv");
        assert!(StudyConfig::from_toml(&input).is_err());
        let input = VALID.replace("{novel}.csv", "{novel}}.csv");
        assert!(StudyConfig::from_toml(&input).is_err());
    }

    #[test]
    fn reject_duplicate_model() {
        let input = VALID.replace("name = \"Llama 13b\"", "name = \"Mistral 7b INST\"");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("duplicate model"));
    }

    #[test]
    fn reject_duplicate_context() {
        let input = VALID.replace("[0, 1, 2, 4, 8, 16]", "[0, 1, 1]");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("duplicate context window 1"));
    }

    #[test]
    fn reject_empty_grid() {
        let input = VALID.replace("[0, 1, 2, 4, 8, 16]", "[]");
        let err = StudyConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("context window"));
    }

    #[test]
    fn prediction_path_does_not_expand_names() {
        let input = VALID.replace("name = \"Llama 13b\"", "name = \"odd{novel}{context}\"");
        let config = StudyConfig::from_toml(&input).unwrap();
        let path = config.prediction_path(2, &config.models[1], &config.novels[0]);
        assert_eq!(path, "context2/odd{novel}{context}/PrideAndPrejudice.csv");
    }
}
