// quoteval CLI - scores speaker-attribution predictions against annotated novels

mod dataset;
mod exit_codes;
mod score;
mod study;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{score_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use quoteval_score::ScoreError;

#[derive(Parser)]
#[command(name = "quoteval")]
#[command(about = "Score LLM speaker attributions for quotations in novels")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or validate a study (models × context windows × novels)
    Study {
        #[command(subcommand)]
        command: study::StudyCommands,
    },

    /// Score a single prediction table against one novel's annotations
    #[command(after_help = "\
Examples:
  quoteval score --characters Emma/character_info.csv \\
      --quotations Emma/quotation_info.csv --predictions context4/mistral/Emma.csv
  quoteval score --characters chars.csv --quotations quotes.csv \\
      --predictions preds.csv --metric weak --alignment strict --json")]
    Score(score::ScoreArgs),

    /// Show how one prediction resolves to a speaker
    #[command(after_help = "\
Examples:
  quoteval explain --characters chars.csv --prediction 'I think Mr. Darcy spoke'
  quoteval explain --characters chars.csv --prediction 'Lizzy' --speaker 'Elizabeth Bennet'")]
    Explain(score::ExplainArgs),

    /// Build model-input datasets (quotation text, context windows) from a novel
    Dataset {
        #[command(subcommand)]
        command: dataset::DatasetCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("QUOTEVAL_COMMIT"), ")",
        "\nengine:  quoteval-score ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("QUOTEVAL_PROFILE"),
        "\ntarget:  ", env!("QUOTEVAL_TARGET"),
    )
}

/// Diagnostics go to stderr; `QUOTEVAL_LOG` takes the usual filter syntax.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("QUOTEVAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Study { command } => study::cmd_study(command),
        Commands::Score(args) => score::cmd_score(args),
        Commands::Explain(args) => score::cmd_explain(args),
        Commands::Dataset { command } => dataset::cmd_dataset(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ScoreError> for CliError {
    fn from(err: ScoreError) -> Self {
        let hint = match err.root() {
            ScoreError::AlignmentMismatch { .. } => {
                Some("use alignment \"truncate\" to score the common prefix".to_string())
            }
            ScoreError::MissingColumn { .. } => {
                Some("column names can be overridden under [columns] in the study config".to_string())
            }
            _ => None,
        };
        Self {
            code: score_exit_code(err.root()),
            message: err.to_string(),
            hint,
        }
    }
}

/// Read a whole file, mapping failures to the I/O exit code.
pub fn read_file(path: &std::path::Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}
