//! `quoteval dataset`: cut quotation text and context windows out of a novel.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use quoteval_score::config::ColumnMapping;
use quoteval_score::dataset::{write_contexts, write_quotes, NovelText};

use crate::{read_file, CliError};

#[derive(Subcommand)]
pub enum DatasetCommands {
    /// Write the text of every quotation (quote marks included) as a `quoteText` CSV
    #[command(after_help = "\
Examples:
  quoteval dataset quotes --quotations Emma/quotation_info.csv \\
      --novel Emma/novel_text.txt --output Emma/quotes.csv")]
    Quotes {
        /// Quotation table with a quoteByteSpans column
        #[arg(long)]
        quotations: PathBuf,

        /// Full novel text
        #[arg(long)]
        novel: PathBuf,

        /// Output CSV file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Write up to N sentences either side of every quotation as a
    /// `left_context,right_context` CSV
    #[command(after_help = "\
Examples:
  quoteval dataset context --quotations Emma/quotation_info.csv \\
      --novel Emma/novel_text.txt --window 4 --output Emma/context4.csv")]
    Context {
        /// Quotation table with a quoteByteSpans column
        #[arg(long)]
        quotations: PathBuf,

        /// Full novel text
        #[arg(long)]
        novel: PathBuf,

        /// Sentences per side
        #[arg(long)]
        window: usize,

        /// Output CSV file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

pub fn cmd_dataset(cmd: DatasetCommands) -> Result<(), CliError> {
    // Rendered in memory so a failed row leaves any existing output untouched.
    let mut buf = Vec::new();
    match cmd {
        DatasetCommands::Quotes { quotations, novel, output } => {
            let (quotations_csv, novel) = load_inputs(&quotations, &novel)?;
            let rows = write_quotes(&quotations_csv, &novel, &ColumnMapping::default(), &mut buf)?;
            save(&output, &buf)?;
            eprintln!("wrote {} ({rows} quotation(s))", output.display());
        }
        DatasetCommands::Context { quotations, novel, window, output } => {
            let (quotations_csv, novel) = load_inputs(&quotations, &novel)?;
            let rows = write_contexts(&quotations_csv, &novel, &ColumnMapping::default(), window, &mut buf)?;
            save(&output, &buf)?;
            eprintln!("wrote {} ({rows} row(s), window {window})", output.display());
        }
    }
    Ok(())
}

fn load_inputs(quotations: &Path, novel: &Path) -> Result<(String, NovelText), CliError> {
    let quotations_csv = read_file(quotations)?;
    let novel = NovelText::new(&read_file(novel)?);
    tracing::debug!("novel text: {} character(s)", novel.char_len());
    Ok((quotations_csv, novel))
}

fn save(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}
