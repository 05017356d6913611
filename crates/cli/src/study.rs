//! `quoteval study`: config-driven scoring over models × context windows × novels.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use quoteval_score::report::{counts_line, latex_block, render_table};
use quoteval_score::study::ContextCell;
use quoteval_score::{run_study, Metric, ScoreError, StudyConfig, StudyResult};

use crate::{read_file, CliError};

#[derive(Subcommand)]
pub enum StudyCommands {
    /// Run a study from a TOML config file
    #[command(after_help = "\
Prints four LaTeX rows per model (overall, anaphoric, implicit, explicit), one
column per context window. Per-novel counts and a readable table go to stderr.

Examples:
  quoteval study run context.study.toml
  quoteval study run context.study.toml --metric weak
  quoteval study run context.study.toml --json
  quoteval study run context.study.toml --output result.json")]
    Run {
        /// Path to the .study.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of LaTeX rows
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override the config's metric (strong or weak)
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Validate a study config without running
    #[command(after_help = "\
Examples:
  quoteval study validate context.study.toml")]
    Validate {
        /// Path to the .study.toml config file
        config: PathBuf,
    },
}

pub fn cmd_study(cmd: StudyCommands) -> Result<(), CliError> {
    match cmd {
        StudyCommands::Run { config, json, output, metric } => cmd_study_run(&config, json, output, metric),
        StudyCommands::Validate { config } => cmd_study_validate(&config),
    }
}

fn load_config(path: &Path) -> Result<StudyConfig, CliError> {
    let config_str = read_file(path)?;
    StudyConfig::from_toml(&config_str).map_err(|e| {
        CliError::from(e).with_hint(format!("check {}", path.display()))
    })
}

fn cmd_study_validate(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    eprintln!(
        "{}: ok ({} model(s) × {} context window(s) × {} novel(s) = {} runs)",
        config.name,
        config.models.len(),
        config.contexts.len(),
        config.novels.len(),
        config.models.len() * config.contexts.len() * config.novels.len(),
    );
    Ok(())
}

fn cmd_study_run(
    config_path: &Path,
    json_output: bool,
    output_file: Option<PathBuf>,
    metric: Option<Metric>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    // Table paths are relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let source = |path: &str| -> Result<String, ScoreError> {
        let full = base_dir.join(path);
        std::fs::read_to_string(&full).map_err(|e| ScoreError::Io(format!("cannot read {}: {e}", full.display())))
    };

    let result = run_study(&config, &source, metric)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print_latex(&result);
    }

    print_summary(&result);
    Ok(())
}

fn print_latex(result: &StudyResult) {
    for model in &result.models {
        println!("% {}", model.label);
        for row in latex_block(model) {
            println!("{row}");
        }
        println!();
    }
}

/// Per-novel counts of one cell, one line per novel.
fn cell_counts(cell: &ContextCell) -> Vec<String> {
    cell.novels.iter().map(|run| counts_line(&run.novel, &run.outcome.tally)).collect()
}

/// Human summary to stderr: per-novel counts and one table per model.
///
/// Counts are printed for the first cell; truncating alignment can shorten
/// other cells, and any cell whose counts differ is listed on its own.
fn print_summary(result: &StudyResult) {
    let cells = result
        .models
        .iter()
        .flat_map(|m| m.contexts.iter().map(move |c| (m, c)));
    let mut baseline: Option<Vec<String>> = None;
    for (model, cell) in cells {
        let counts = cell_counts(cell);
        match &baseline {
            None => {
                for line in &counts {
                    eprintln!("{line}");
                }
                baseline = Some(counts);
            }
            Some(first) if *first != counts => {
                eprintln!("model '{}' context {}:", model.model, cell.context);
                for line in &counts {
                    eprintln!("  {line}");
                }
            }
            Some(_) => {}
        }
    }

    let dropped: usize = result
        .models
        .iter()
        .flat_map(|m| &m.contexts)
        .flat_map(|c| &c.novels)
        .map(|r| r.outcome.dropped_rows)
        .sum();
    if dropped > 0 {
        eprintln!("warning: {dropped} row(s) dropped by truncating alignment");
    }

    eprintln!(
        "study '{}': {} metric, {} model(s)",
        result.meta.study_name,
        result.meta.metric,
        result.models.len()
    );
    for model in &result.models {
        eprint!("{}", render_table(model));
    }
}
