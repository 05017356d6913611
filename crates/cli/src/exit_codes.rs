//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | scoring          | Study config, input tables, alignment    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `score_exit_code` or the relevant command

use quoteval_score::ScoreError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Scoring (60-69)
// =============================================================================

/// Study config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// An input table is malformed (ragged rows, missing column, bad alias list,
/// unknown category, duplicate character, span outside the novel).
pub const EXIT_MALFORMED_INPUT: u8 = 61;

/// Quotation and prediction row counts differ under strict alignment.
pub const EXIT_ALIGNMENT: u8 = 62;

/// A file could not be read or written.
pub const EXIT_IO: u8 = 63;

/// Map a library error to its exit code. Pass `err.root()` for wrapped errors.
pub fn score_exit_code(err: &ScoreError) -> u8 {
    match err {
        ScoreError::ConfigParse(_) | ScoreError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ScoreError::MissingColumn { .. }
        | ScoreError::MalformedCell { .. }
        | ScoreError::MalformedTable { .. }
        | ScoreError::UnknownCategory(_)
        | ScoreError::DuplicateCharacter(_)
        | ScoreError::SpanOutOfRange { .. } => EXIT_MALFORMED_INPUT,
        ScoreError::AlignmentMismatch { .. } => EXIT_ALIGNMENT,
        ScoreError::Io(_) => EXIT_IO,
        ScoreError::Run { source, .. } | ScoreError::Table { source, .. } => score_exit_code(source),
    }
}
