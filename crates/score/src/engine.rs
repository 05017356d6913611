use serde::Serialize;

use crate::aggregate::score;
use crate::config::Alignment;
use crate::error::ScoreError;
use crate::loader::QuotationMeta;
use crate::matcher::Metric;
use crate::model::{CharacterSet, QuotationRecord, ScoreTally};

/// Pre-loaded tables for one (novel, model, context window) run.
pub struct RunInput<'a> {
    pub characters: &'a CharacterSet,
    pub quotations: &'a [QuotationMeta],
    pub predictions: Vec<Option<String>>,
}

/// Tally for one run plus how the two tables lined up.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub tally: ScoreTally,
    pub quotation_rows: usize,
    pub prediction_rows: usize,
    /// Rows cut from the longer table under `Alignment::Truncate`.
    pub dropped_rows: usize,
}

/// Join quotation rows with prediction rows by position.
///
/// Under `Truncate` the longer table is cut to the shorter one's length and a
/// warning is logged; under `Strict` unequal lengths are an error.
pub fn align(
    quotations: &[QuotationMeta],
    predictions: Vec<Option<String>>,
    alignment: Alignment,
) -> Result<Vec<QuotationRecord>, ScoreError> {
    if quotations.len() != predictions.len() {
        match alignment {
            Alignment::Strict => {
                return Err(ScoreError::AlignmentMismatch {
                    quotations: quotations.len(),
                    predictions: predictions.len(),
                });
            }
            Alignment::Truncate => {
                log::warn!(
                    "truncating to {} row(s): {} quotation row(s) vs {} prediction row(s)",
                    quotations.len().min(predictions.len()),
                    quotations.len(),
                    predictions.len()
                );
            }
        }
    }

    Ok(quotations
        .iter()
        .zip(predictions)
        .map(|(q, predicted_speaker)| QuotationRecord {
            true_speaker: q.speaker.clone(),
            category: q.category,
            predicted_speaker,
        })
        .collect())
}

/// Align the tables of one run and score them.
pub fn run(input: RunInput<'_>, metric: Metric, alignment: Alignment) -> Result<RunOutcome, ScoreError> {
    let quotation_rows = input.quotations.len();
    let prediction_rows = input.predictions.len();

    let records = align(input.quotations, input.predictions, alignment)?;
    let tally = score(input.characters, &records, metric);

    Ok(RunOutcome {
        tally,
        quotation_rows,
        prediction_rows,
        dropped_rows: quotation_rows.max(prediction_rows) - records.len(),
    })
}
