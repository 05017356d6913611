//! `quoteval score` and `quoteval explain`: single-run scoring without a study config.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use quoteval_score::config::ColumnMapping;
use quoteval_score::engine::{run, RunInput, RunOutcome};
use quoteval_score::loader::{load_characters, load_predictions, load_quotations};
use quoteval_score::matcher::{infer_speaker, strong_match, weak_match, AliasHit};
use quoteval_score::report::render_tally;
use quoteval_score::{Alignment, CharacterSet, Metric, QuotationRecord, QuoteCategory, ScoreError};

use crate::{read_file, CliError};

#[derive(Args)]
pub struct ScoreArgs {
    /// Character table (Main Name, Aliases)
    #[arg(long)]
    characters: PathBuf,

    /// Quotation table (speaker, quoteType)
    #[arg(long)]
    quotations: PathBuf,

    /// Prediction table (inferred_speaker), row-aligned with the quotations
    #[arg(long)]
    predictions: PathBuf,

    /// Scoring metric (strong or weak)
    #[arg(long, default_value = "strong")]
    metric: Metric,

    /// Row-count mismatch policy (truncate or strict)
    #[arg(long, default_value = "truncate")]
    alignment: Alignment,

    /// Output JSON to stdout instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Character table (Main Name, Aliases)
    #[arg(long)]
    characters: PathBuf,

    /// Free-text prediction to resolve
    #[arg(long)]
    prediction: String,

    /// True speaker; when given, both metric verdicts are shown
    #[arg(long)]
    speaker: Option<String>,

    /// Output JSON to stdout
    #[arg(long)]
    json: bool,
}

/// Read one table and parse it, naming the file in any error.
fn load_table<T>(
    path: &Path,
    parse: impl FnOnce(&str, &ColumnMapping) -> Result<T, ScoreError>,
) -> Result<T, CliError> {
    let data = read_file(path)?;
    parse(&data, &ColumnMapping::default()).map_err(|e| {
        CliError::from(ScoreError::Table {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    metric: Metric,
    alignment: Alignment,
    #[serde(flatten)]
    outcome: &'a RunOutcome,
}

pub fn cmd_score(args: ScoreArgs) -> Result<(), CliError> {
    let characters = load_table(&args.characters, load_characters)?;
    let quotations = load_table(&args.quotations, load_quotations)?;
    let predictions = load_table(&args.predictions, load_predictions)?;

    let outcome = run(
        RunInput {
            characters: &characters,
            quotations: &quotations,
            predictions,
        },
        args.metric,
        args.alignment,
    )?;

    if args.json {
        let report = ScoreReport {
            metric: args.metric,
            alignment: args.alignment,
            outcome: &outcome,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render_tally(&outcome.tally));
    }

    if outcome.dropped_rows > 0 {
        eprintln!(
            "warning: {} quotation row(s) vs {} prediction row(s); scored {}",
            outcome.quotation_rows,
            outcome.prediction_rows,
            outcome.tally.total()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct Explanation<'a> {
    inferred: Option<AliasHit<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strong: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weak: Option<bool>,
}

fn explain<'a>(characters: &'a CharacterSet, prediction: &str, speaker: Option<&'a str>) -> Explanation<'a> {
    let inferred = infer_speaker(characters, prediction);
    let verdicts = speaker.map(|name| {
        if characters.get(name).is_none() {
            tracing::warn!("speaker '{name}' is not in the character table");
        }
        // Category does not affect either verdict.
        let record = QuotationRecord::new(Some(name), QuoteCategory::Explicit, Some(prediction));
        (strong_match(characters, &record), weak_match(characters, &record))
    });

    Explanation {
        inferred,
        speaker,
        strong: verdicts.map(|v| v.0),
        weak: verdicts.map(|v| v.1),
    }
}

fn verdict(correct: bool) -> &'static str {
    if correct {
        "correct"
    } else {
        "incorrect"
    }
}

pub fn cmd_explain(args: ExplainArgs) -> Result<(), CliError> {
    let characters = load_table(&args.characters, load_characters)?;
    if characters.is_empty() {
        return Err(CliError::args("character table has no rows")
            .with_hint(format!("check {}", args.characters.display())));
    }

    let explanation = explain(&characters, &args.prediction, args.speaker.as_deref());

    if args.json {
        let json_str = serde_json::to_string_pretty(&explanation)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    match explanation.inferred {
        Some(hit) => println!(
            "inferred: {} (alias '{}' at byte {})",
            hit.character, hit.alias, hit.offset
        ),
        None => println!("inferred: (none, no alias occurs in the prediction)"),
    }
    if let (Some(strong), Some(weak)) = (explanation.strong, explanation.weak) {
        println!("strong:   {}", verdict(strong));
        println!("weak:     {}", verdict(weak));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoteval_score::model::Character;

    fn pride() -> CharacterSet {
        CharacterSet::new(vec![
            Character::new("Elizabeth", ["Elizabeth", "Lizzy"]),
            Character::new("Darcy", ["Darcy", "Mr. Darcy"]),
        ])
        .unwrap()
    }

    #[test]
    fn explain_with_speaker() {
        let chars = pride();
        let e = explain(&chars, "I think Mr. Darcy and Lizzy both spoke", Some("Elizabeth"));
        let hit = e.inferred.unwrap();
        assert_eq!(hit.character, "Darcy");
        assert_eq!(hit.alias, "Mr. Darcy");
        assert_eq!(e.strong, Some(false));
        assert_eq!(e.weak, Some(true));
    }

    #[test]
    fn explain_without_speaker_has_no_verdicts() {
        let chars = pride();
        let e = explain(&chars, "nobody", None);
        assert!(e.inferred.is_none());
        assert!(e.strong.is_none());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json, serde_json::json!({ "inferred": null }));
    }
}
