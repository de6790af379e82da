//! Layer list loading.
//!
//! A list file is either a CSV with a header row, the names taken from the
//! column whose header matches `--column`, or a plain file with one layer name
//! per line. Blank entries and repeated names are dropped; the first
//! occurrence keeps its place.

use std::collections::HashSet;
use std::path::Path;

use wfsgrab_core::LayerName;

use crate::cli::LayerArgs;
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedLayer {
    /// 1-based line in the source file.
    pub line: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListError {
    pub line: usize,
    pub message: String,
}

/// Layers from the command line followed by those of `--layers-file`.
pub fn collect(args: &LayerArgs) -> Result<Vec<LayerName>, CliError> {
    let mut seen = HashSet::new();
    let mut layers = Vec::new();

    for raw in &args.layers {
        let layer = LayerName::parse(raw)?;
        if seen.insert(layer.clone()) {
            layers.push(layer);
        }
    }

    if let Some(path) = &args.layers_file {
        for layer in load(path, &args.column)? {
            if seen.insert(layer.clone()) {
                layers.push(layer);
            }
        }
    }

    if layers.is_empty() {
        return Err(CliError::NoLayers);
    }
    Ok(layers)
}

pub fn load(path: &Path, column: &str) -> Result<Vec<LayerName>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let to_cli = |line: usize, message: String| CliError::LayerList {
        path: path.to_path_buf(),
        line,
        message,
    };

    parse(&content, column)
        .map_err(|error| to_cli(error.line, error.message))?
        .into_iter()
        .map(|listed| {
            LayerName::parse(&listed.name).map_err(|error| to_cli(listed.line, error.to_string()))
        })
        .collect()
}

pub fn parse(content: &str, column: &str) -> Result<Vec<ListedLayer>, ListError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = split_records(content)?
        .into_iter()
        .filter(|record| !record.raw.trim().is_empty());

    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };
    let column_index = header
        .fields
        .iter()
        .position(|field| field.trim() == column);

    let mut seen = HashSet::new();
    let mut listed = Vec::new();
    let mut keep = |line: usize, name: &str| {
        let name = name.trim();
        if !name.is_empty() && seen.insert(name.to_owned()) {
            listed.push(ListedLayer {
                line,
                name: name.to_owned(),
            });
        }
    };

    match column_index {
        Some(index) => {
            for record in records {
                if let Some(name) = record.fields.get(index) {
                    keep(record.line, name);
                }
            }
        }
        None => {
            keep(header.line, &header.raw);
            for record in records {
                keep(record.line, &record.raw);
            }
        }
    }

    Ok(listed)
}

struct Record {
    /// Line the record starts on.
    line: usize,
    raw: String,
    fields: Vec<String>,
}

/// Splits CSV text into records. Double-quoted fields may hold commas, line
/// breaks and `""` escapes.
fn split_records(content: &str) -> Result<Vec<Record>, ListError> {
    let mut records = Vec::new();
    let mut chars = content.chars().peekable();
    let mut line = 1;
    let mut record_line = 1;
    let mut raw = String::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        match (quoted, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                raw.push_str("\"\"");
                field.push('"');
                continue;
            }
            (true, '"') => quoted = false,
            (true, '\n') => {
                line += 1;
                field.push(ch);
            }
            (true, _) => field.push(ch),
            (false, '"') if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            (false, ',') => fields.push(std::mem::take(&mut field)),
            (false, '\r') if chars.peek() == Some(&'\n') => continue,
            (false, '\n') => {
                fields.push(std::mem::take(&mut field));
                records.push(Record {
                    line: record_line,
                    raw: std::mem::take(&mut raw),
                    fields: std::mem::take(&mut fields),
                });
                line += 1;
                record_line = line;
                continue;
            }
            (false, _) => field.push(ch),
        }
        raw.push(ch);
    }

    if quoted {
        return Err(ListError {
            line: record_line,
            message: String::from("unterminated quoted field"),
        });
    }
    if !raw.is_empty() {
        fields.push(field);
        records.push(Record {
            line: record_line,
            raw,
            fields,
        });
    }
    Ok(records)
}
