use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty grid, bad template, duplicate names).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in an input table.
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: String, column: String },
    /// A cell that cannot be parsed into the expected shape.
    #[error("{table}, row {row}, column '{column}': {reason} (value: {value:?})")]
    MalformedCell {
        table: String,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
    /// A table the CSV parser rejects as a whole (ragged rows, invalid UTF-8).
    #[error("{table}: malformed table: {reason}")]
    MalformedTable { table: String, reason: String },
    /// A quotation category outside Explicit / Anaphoric / Implicit.
    #[error("unknown quotation category '{0}'")]
    UnknownCategory(String),
    /// The same canonical name appears twice in one character table.
    #[error("duplicate character '{0}'")]
    DuplicateCharacter(String),
    /// Quotation and prediction tables differ in length under strict alignment.
    #[error("row count mismatch: {quotations} quotation row(s) vs {predictions} prediction row(s)")]
    AlignmentMismatch { quotations: usize, predictions: usize },
    /// A quotation span that falls outside the novel text.
    #[error("quotation {row}: span {start}..{end} outside text of {len} characters")]
    SpanOutOfRange {
        row: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    /// A run of a study failed; wraps the underlying error with its coordinates.
    #[error("run novel='{novel}' model='{model}' context={context}: {source}")]
    Run {
        novel: String,
        model: String,
        context: u32,
        #[source]
        source: Box<ScoreError>,
    },
    /// An error while reading one input table; names the table's path.
    #[error("{path}: {source}")]
    Table {
        path: String,
        #[source]
        source: Box<ScoreError>,
    },
    /// IO error (file read, CSV read/write, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl ScoreError {
    pub(crate) fn malformed(
        table: &str,
        row: usize,
        column: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedCell {
            table: table.into(),
            row,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_table(path: &str, source: ScoreError) -> Self {
        Self::Table {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Strip `Run` / `Table` wrappers to reach the error that actually occurred.
    pub fn root(&self) -> &ScoreError {
        match self {
            Self::Run { source, .. } | Self::Table { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<csv::Error> for ScoreError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<std::io::Error> for ScoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
