//! Reading target filenames from the command line, text files and CSV.

use chrono::Local;
use digital_ingest::core::derivative::sanitize_filename;
use digital_ingest::core::reporter::escape_csv_field;
use digital_ingest::error::{IngestError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Targets listed one per line. Blank lines and `#` comments are skipped.
pub fn read_targets_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        IngestError::Input(format!("Failed to read targets file {}: {}", path.display(), e))
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Non-empty values of `column` in a CSV file with a header row
pub fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        IngestError::Input(format!("Failed to read CSV {}: {}", path.display(), e))
    })?;
    csv_column(&contents, column)
        .map_err(|reason| IngestError::Input(format!("{}: {}", path.display(), reason)))
}

fn csv_column(contents: &str, column: &str) -> std::result::Result<Vec<String>, String> {
    let mut rows = contents.lines().filter(|line| !line.trim().is_empty());

    let header = rows.next().ok_or_else(|| "CSV file is empty".to_string())?;
    let index = column_index(header, column)?;

    Ok(rows
        .filter_map(|row| split_csv_line(row).into_iter().nth(index))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect())
}

fn column_index(header: &str, column: &str) -> std::result::Result<usize, String> {
    let header = split_csv_line(header.trim_start_matches('\u{feff}'));
    header
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case(column.trim()))
        .ok_or_else(|| {
            format!(
                "column '{}' not found (available: {})",
                column,
                header.join(", ")
            )
        })
}

/// Split one CSV record. Handles quoted fields and doubled quotes; fields
/// spanning lines are not supported.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Rewrite `column` so each cell naming a key of `replacements` holds its
/// value instead.
///
/// Rows whose cell is not a key are copied through byte for byte, as are
/// blank lines and line endings. Returns the new contents and the number of
/// rows changed.
pub fn apply_matches(
    contents: &str,
    column: &str,
    replacements: &HashMap<String, String>,
) -> std::result::Result<(String, usize), String> {
    let mut target_column = None;
    let mut updated = 0;
    let mut out = String::with_capacity(contents.len());

    for line in contents.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];

        if body.trim().is_empty() {
            out.push_str(line);
            continue;
        }
        let Some(index) = target_column else {
            target_column = Some(column_index(body, column)?);
            out.push_str(line);
            continue;
        };

        let mut fields = split_csv_line(body);
        let replacement = fields
            .get(index)
            .and_then(|cell| replacements.get(cell.trim()))
            .filter(|name| fields[index].trim() != name.as_str())
            .cloned();

        match replacement {
            Some(name) => {
                fields[index] = name;
                let record: Vec<_> = fields.iter().map(|f| escape_csv_field(f)).collect();
                out.push_str(&record.join(","));
                out.push_str(ending);
                updated += 1;
            }
            None => out.push_str(line),
        }
    }

    if target_column.is_none() {
        return Err("CSV file is empty".to_string());
    }
    Ok((out, updated))
}

/// Timestamped working copy name beside `source`, e.g.
/// `my_objects_20250101_093000.csv` for `my objects.csv`
pub fn working_copy_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    source.with_file_name(format!(
        "{}_{}{}",
        sanitize_filename(&stem),
        Local::now().format("%Y%m%d_%H%M%S"),
        extension
    ))
}

/// Apply `replacements` to the CSV at `source` and write the result to
/// `dest`. Nothing is written when no row changes.
pub fn update_csv(
    source: &Path,
    column: &str,
    replacements: &HashMap<String, String>,
    dest: &Path,
) -> Result<usize> {
    let contents = fs::read_to_string(source).map_err(|e| {
        IngestError::Input(format!("Failed to read CSV {}: {}", source.display(), e))
    })?;
    let (updated_contents, updated) = apply_matches(&contents, column, replacements)
        .map_err(|reason| IngestError::Input(format!("{}: {}", source.display(), reason)))?;

    if updated > 0 {
        fs::write(dest, updated_contents).map_err(|e| {
            IngestError::Input(format!("Failed to write CSV {}: {}", dest.display(), e))
        })?;
    }
    Ok(updated)
}

/// Positional targets, then the targets file, then the CSV column
pub fn collect_targets(
    positional: Vec<String>,
    targets_file: Option<&Path>,
    csv: Option<&Path>,
    column: Option<&str>,
) -> Result<Vec<String>> {
    let mut targets = positional;

    if let Some(path) = targets_file {
        targets.extend(read_targets_file(path)?);
    }

    match (csv, column) {
        (Some(path), Some(column)) => targets.extend(read_csv_column(path, column)?),
        (Some(_), None) => {
            return Err(IngestError::Input(
                "--csv needs --column to name the filename column".to_string(),
            ))
        }
        _ => {}
    }

    if targets.is_empty() {
        return Err(IngestError::Input(
            "No targets given. Pass filenames, --targets-file or --csv/--column.".to_string(),
        ));
    }

    Ok(targets)
}
