//! Ingredient bulk load.
//!
//! The input holds one `name,measurement_unit` record per line, without a
//! header. Fields may be double-quoted; `""` inside quotes is a literal quote
//! and a quoted field may span lines.
//! Rows already present are skipped.

use std::path::Path;

use thiserror::Error;

use foodgram_api::db::IngredientRepository;

/// A malformed input line.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    line: usize,
    reason: &'static str,
}

/// Load ingredients from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line is malformed, or the
/// insert fails. Nothing is inserted when any line is malformed.
pub async fn load(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let records = parse(&content)?;
    tracing::info!(path = %path.display(), records = records.len(), "Parsed ingredients");

    let pool = super::connect().await?;
    let inserted = IngredientRepository::new(&pool).load(&records).await?;

    let skipped = u64::try_from(records.len())?.saturating_sub(inserted);
    tracing::info!(inserted, skipped, "Ingredients loaded");
    Ok(())
}

/// Parse `name,measurement_unit` records. Blank lines are ignored.
fn parse(content: &str) -> Result<Vec<(String, String)>, ParseError> {
    split_records(content)?
        .into_iter()
        .map(|(line, fields)| match fields.as_slice() {
            [name, unit] if !name.is_empty() && !unit.is_empty() => {
                Ok((name.clone(), unit.clone()))
            }
            [_, _] => Err(ParseError {
                line,
                reason: "empty field",
            }),
            _ => Err(ParseError {
                line,
                reason: "expected two fields",
            }),
        })
        .collect()
}

/// Split the input into records of trimmed fields, each tagged with the line
/// it starts on. Line breaks inside quotes belong to the field.
fn split_records(content: &str) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field).trim().to_owned()),
            ('\r', false) => {}
            ('\n', false) => {
                fields.push(std::mem::take(&mut field).trim().to_owned());
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            ('\n', true) => {
                field.push(c);
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if quoted {
        return Err(ParseError {
            line: record_line,
            reason: "unterminated quote",
        });
    }
    fields.push(field.trim().to_owned());
    push_record(&mut records, record_line, fields);
    Ok(records)
}

/// Keep a finished record unless it is a blank line.
fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    if let [only] = fields.as_slice()
        && only.is_empty()
    {
        return;
    }
    records.push((line, fields));
}
