//! CSV readers for the character, quotation and prediction tables.
//!
//! Every reader takes the table contents as a string and resolves columns by
//! header name, so callers decide where the bytes come from.

use crate::config::ColumnMapping;
use crate::error::ScoreError;
use crate::model::{Character, CharacterSet, QuoteCategory};

/// Quotation metadata row: who really spoke and how the text signals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationMeta {
    pub speaker: Option<String>,
    pub category: QuoteCategory,
}

/// A parsed table with header lookup.
struct Table {
    name: &'static str,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read(name: &'static str, csv_data: &str) -> Result<Self, ScoreError> {
        // Spreadsheet exports often start with a UTF-8 BOM.
        let csv_data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| table_error(name, e))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| table_error(name, e))?;

        Ok(Self { name, headers, rows })
    }

    fn column(&self, column: &str) -> Result<usize, ScoreError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| ScoreError::MissingColumn {
                table: self.name.into(),
                column: column.into(),
            })
    }
}

/// Read failures stay I/O errors; anything the parser rejects is a malformed table.
fn table_error(table: &str, err: csv::Error) -> ScoreError {
    match err.kind() {
        csv::ErrorKind::Io(_) => ScoreError::Io(err.to_string()),
        _ => ScoreError::MalformedTable {
            table: table.into(),
            reason: err.to_string(),
        },
    }
}

/// Empty cells read as absent.
fn optional_cell(record: &csv::StringRecord, idx: usize) -> Option<String> {
    record.get(idx).filter(|v| !v.is_empty()).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Load the alias table. Table order is kept; it drives strong-metric tie-breaks.
pub fn load_characters(csv_data: &str, columns: &ColumnMapping) -> Result<CharacterSet, ScoreError> {
    let table = Table::read("characters", csv_data)?;
    let name_idx = table.column(&columns.character_name)?;
    let alias_idx = table.column(&columns.aliases)?;

    let mut characters = Vec::with_capacity(table.rows.len());
    for (i, record) in table.rows.iter().enumerate() {
        let row = i + 1;
        let name = record.get(name_idx).unwrap_or("").to_string();
        if name.is_empty() {
            return Err(ScoreError::malformed(
                table.name,
                row,
                &columns.character_name,
                "",
                "empty character name",
            ));
        }

        let raw = record.get(alias_idx).unwrap_or("");
        let parsed = parse_alias_list(raw)
            .map_err(|reason| ScoreError::malformed(table.name, row, &columns.aliases, raw, reason))?;

        let total = parsed.len();
        let aliases: Vec<String> = parsed.into_iter().filter(|a| !a.is_empty()).collect();
        if aliases.len() < total {
            log::warn!("character '{name}': dropped {} empty alias(es)", total - aliases.len());
        }
        if aliases.is_empty() {
            log::warn!("character '{name}' has no aliases and can never be matched");
        }

        characters.push(Character { name, aliases });
    }

    let set = CharacterSet::new(characters)?;
    log::debug!("loaded {} character(s)", set.len());
    Ok(set)
}

/// Parse a Python list literal of strings, e.g. `['Emma', "Miss Woodhouse"]`.
///
/// Accepts single- or double-quoted items, backslash escapes and a trailing
/// comma. Anything else (bare words, numbers, nesting) is rejected.
pub fn parse_alias_list(raw: &str) -> Result<Vec<String>, String> {
    let mut chars = raw.trim().chars().peekable();
    if chars.next() != Some('[') {
        return Err("expected a list starting with '['".into());
    }

    let mut items = Vec::new();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(']') => break,
            Some(quote @ ('\'' | '"')) => {
                let mut item = String::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated string".into()),
                        Some(c) if c == quote => break,
                        Some('\\') => match chars.next() {
                            None => return Err("unterminated string".into()),
                            Some('n') => item.push('\n'),
                            Some('t') => item.push('\t'),
                            Some(c @ ('\\' | '\'' | '"')) => item.push(c),
                            Some(other) => {
                                item.push('\\');
                                item.push(other);
                            }
                        },
                        Some(c) => item.push(c),
                    }
                }
                items.push(item);

                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                match chars.next() {
                    Some(',') => continue,
                    Some(']') => break,
                    Some(c) => return Err(format!("expected ',' or ']', found '{c}'")),
                    None => return Err("unterminated list".into()),
                }
            }
            Some(c) => return Err(format!("expected a quoted string, found '{c}'")),
            None => return Err("unterminated list".into()),
        }
    }

    if let Some(c) = chars.find(|c| !c.is_whitespace()) {
        return Err(format!("unexpected '{c}' after list"));
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Quotations + predictions
// ---------------------------------------------------------------------------

/// Load quotation metadata (speaker + category) in file order.
pub fn load_quotations(csv_data: &str, columns: &ColumnMapping) -> Result<Vec<QuotationMeta>, ScoreError> {
    let table = Table::read("quotations", csv_data)?;
    let speaker_idx = table.column(&columns.speaker)?;
    let category_idx = table.column(&columns.category)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let raw = record.get(category_idx).unwrap_or("");
            let category = raw.parse::<QuoteCategory>().map_err(|e| {
                ScoreError::malformed(table.name, i + 1, &columns.category, raw, e.to_string())
            })?;
            Ok(QuotationMeta {
                speaker: optional_cell(record, speaker_idx),
                category,
            })
        })
        .collect()
}

/// Load one model's predictions in file order. Empty cells are `None`.
pub fn load_predictions(csv_data: &str, columns: &ColumnMapping) -> Result<Vec<Option<String>>, ScoreError> {
    let table = Table::read("predictions", csv_data)?;
    let idx = table.column(&columns.prediction)?;
    Ok(table.rows.iter().map(|r| optional_cell(r, idx)).collect())
}

/// Load the raw `quoteByteSpans` cells, one per quotation.
pub fn load_span_cells(csv_data: &str, columns: &ColumnMapping) -> Result<Vec<String>, ScoreError> {
    let table = Table::read("quotations", csv_data)?;
    let idx = table.column(&columns.spans)?;
    Ok(table
        .rows
        .iter()
        .map(|r| r.get(idx).unwrap_or("").to_string())
        .collect())
}
