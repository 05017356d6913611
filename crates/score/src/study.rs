//! Study runner: every model × context window × novel in one config.
//!
//! Novel tables (characters, quotations) are loaded once; each run then reads
//! only its prediction table. Tallies of all novels in a (model, context)
//! cell are pooled before any percentage is computed.

use serde::Serialize;

use crate::config::{Alignment, ModelConfig, NovelConfig, StudyConfig};
use crate::engine::{run, RunInput, RunOutcome};
use crate::error::ScoreError;
use crate::loader::{load_characters, load_predictions, load_quotations, QuotationMeta};
use crate::matcher::Metric;
use crate::model::{CharacterSet, ScoreTally};

/// Where the study's tables come from. Paths are exactly as written in the config.
pub trait TableSource {
    fn read_table(&self, path: &str) -> Result<String, ScoreError>;
}

impl<F> TableSource for F
where
    F: Fn(&str) -> Result<String, ScoreError>,
{
    fn read_table(&self, path: &str) -> Result<String, ScoreError> {
        self(path)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StudyResult {
    pub meta: StudyMeta,
    pub models: Vec<ModelReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyMeta {
    pub study_name: String,
    pub metric: Metric,
    pub alignment: Alignment,
    pub engine_version: String,
    pub run_at: String,
}

/// All context windows for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub label: String,
    pub contexts: Vec<ContextCell>,
}

/// One (model, context) cell: pooled tally plus the per-novel runs behind it.
#[derive(Debug, Clone, Serialize)]
pub struct ContextCell {
    pub context: u32,
    pub pooled: ScoreTally,
    pub novels: Vec<NovelRun>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NovelRun {
    pub novel: String,
    pub predictions: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

struct LoadedNovel<'c> {
    config: &'c NovelConfig,
    characters: CharacterSet,
    quotations: Vec<QuotationMeta>,
}

/// Run a whole study, using `metric` in place of the config's when given.
///
/// The first failing run aborts the study; no partial result is returned.
pub fn run_study(
    config: &StudyConfig,
    source: &dyn TableSource,
    metric: Option<Metric>,
) -> Result<StudyResult, ScoreError> {
    let metric = metric.unwrap_or(config.metric);

    let novels = config
        .novels
        .iter()
        .map(|novel| load_novel(config, novel, source))
        .collect::<Result<Vec<_>, _>>()?;

    let mut models = Vec::with_capacity(config.models.len());
    for model in &config.models {
        let mut contexts = Vec::with_capacity(config.contexts.len());
        for &context in &config.contexts {
            contexts.push(run_cell(config, model, context, &novels, source, metric)?);
        }
        models.push(ModelReport {
            model: model.name.clone(),
            label: model.display_name().to_string(),
            contexts,
        });
    }

    Ok(StudyResult {
        meta: StudyMeta {
            study_name: config.name.clone(),
            metric,
            alignment: config.alignment,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        models,
    })
}

fn load_novel<'c>(
    config: &StudyConfig,
    novel: &'c NovelConfig,
    source: &dyn TableSource,
) -> Result<LoadedNovel<'c>, ScoreError> {
    let characters = source
        .read_table(&novel.characters)
        .and_then(|data| load_characters(&data, &config.columns))
        .map_err(|e| ScoreError::in_table(&novel.characters, e))?;
    let quotations = source
        .read_table(&novel.quotations)
        .and_then(|data| load_quotations(&data, &config.columns))
        .map_err(|e| ScoreError::in_table(&novel.quotations, e))?;
    log::info!(
        "novel '{}': {} character(s), {} quotation(s)",
        novel.name,
        characters.len(),
        quotations.len()
    );

    Ok(LoadedNovel {
        config: novel,
        characters,
        quotations,
    })
}

fn run_cell(
    config: &StudyConfig,
    model: &ModelConfig,
    context: u32,
    novels: &[LoadedNovel<'_>],
    source: &dyn TableSource,
    metric: Metric,
) -> Result<ContextCell, ScoreError> {
    let mut runs = Vec::with_capacity(novels.len());

    for novel in novels {
        let predictions_path = config.prediction_path(context, model, novel.config);
        let outcome = (|| -> Result<RunOutcome, ScoreError> {
            let predictions = source
                .read_table(&predictions_path)
                .and_then(|data| load_predictions(&data, &config.columns))
                .map_err(|e| ScoreError::in_table(&predictions_path, e))?;
            run(
                RunInput {
                    characters: &novel.characters,
                    quotations: &novel.quotations,
                    predictions,
                },
                metric,
                config.alignment,
            )
        })()
        .map_err(|e| ScoreError::Run {
            novel: novel.config.name.clone(),
            model: model.name.clone(),
            context,
            source: Box::new(e),
        })?;

        log::debug!(
            "model '{}' context {} novel '{}': {}/{}",
            model.name,
            context,
            novel.config.name,
            outcome.tally.correct(),
            outcome.tally.total()
        );

        runs.push(NovelRun {
            novel: novel.config.name.clone(),
            predictions: predictions_path,
            outcome,
        });
    }

    Ok(ContextCell {
        context,
        pooled: runs.iter().map(|r| &r.outcome.tally).sum(),
        novels: runs,
    })
}
