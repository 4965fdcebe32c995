// Statement/ledger ingestion.
//
// Both inputs arrive as whatever the bank or ERP exported: xlsx/xls/ods or
// delimited text, decimal comma or dot, sometimes Windows-1252. Everything
// is normalized to a rectangular string grid first, then mapped to the
// engine tables by header name.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;

use avstamning_engine::amount::parse_amount;
use avstamning_engine::{BankTable, BokfTable};

use crate::error::IngestError;

/// Bank statements carry four banner rows before the header.
const BANK_HEADER_SKIP: usize = 4;
/// Ledger exports carry seventeen banner rows before the header.
const BOKF_HEADER_SKIP: usize = 17;

/// Counts surfaced in the run summary. Parse failures are warnings, not
/// errors: the row is kept with a null date / zero amount.
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_opening_balance: usize,
    pub date_warnings: usize,
    pub amount_warnings: usize,
}

pub fn load_bank(path: &Path) -> Result<(BankTable, IngestStats), IngestError> {
    let grid = read_rows(path)?;
    let headers = header_row(path, &grid, BANK_HEADER_SKIP)?;

    let date_idx = require_column(path, &headers, "Bokföringsdatum")?;
    let text_idx = require_column(path, &headers, "Text")?;
    let amount_idx = require_column(path, &headers, "Belopp")?;

    let mut table = BankTable::default();
    let mut stats = IngestStats::default();

    for record in grid.iter().skip(BANK_HEADER_SKIP + 1) {
        if is_blank(record) {
            continue;
        }
        stats.rows_read += 1;

        let date = parse_date_cell(cell(record, date_idx), &mut stats);
        let amount = parse_amount_cell(cell(record, amount_idx), &mut stats);
        table.push(date, cell(record, text_idx).to_string(), amount);
        stats.rows_kept += 1;
    }

    Ok((table, stats))
}

pub fn load_bokf(path: &Path) -> Result<(BokfTable, IngestStats), IngestError> {
    let grid = read_rows(path)?;
    let headers = header_row(path, &grid, BOKF_HEADER_SKIP)?;

    let date_idx = require_column(path, &headers, "Datum")?;
    let opening_idx = require_column(path, &headers, "IB Året SEK")?;
    let amount_idx = require_column(path, &headers, "Period SEK")?;
    let text1_idx = require_column(path, &headers, "Text1")?;
    let voucher_idx = require_column(path, &headers, "Verifikationsnummer")?;
    let category_idx = require_column(path, &headers, "Kategori")?;
    let source_idx = find_column(&headers, "Källa");

    let mut table = BokfTable::default();
    let mut stats = IngestStats::default();

    for record in grid.iter().skip(BOKF_HEADER_SKIP + 1) {
        if is_blank(record) {
            continue;
        }
        stats.rows_read += 1;

        // Rows with an opening balance are aggregates, not transactions.
        // Whitespace-only cells count as empty and the row survives.
        if !cell(record, opening_idx).trim().is_empty() {
            stats.dropped_opening_balance += 1;
            continue;
        }

        let date = parse_date_cell(cell(record, date_idx), &mut stats);
        let amount = parse_amount_cell(cell(record, amount_idx), &mut stats);
        table.push(
            date,
            amount,
            cell(record, category_idx).to_string(),
            cell(record, voucher_idx).to_string(),
            cell(record, text1_idx).to_string(),
            source_idx.map(|i| cell(record, i).to_string()).unwrap_or_default(),
        );
        stats.rows_kept += 1;
    }

    Ok((table, stats))
}

// ---------------------------------------------------------------------------
// Grid reading
// ---------------------------------------------------------------------------

/// Read any supported file into a rectangular string grid.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_spreadsheet(path),
        _ => read_delimited(path),
    }
}

fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<String>>, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names.first().ok_or_else(|| IngestError::EmptyWorkbook {
        path: path.display().to_string(),
    })?;

    let range = workbook.worksheet_range(first).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut grid = Vec::with_capacity(range.get_size().0);
    for row in range.rows() {
        grid.push(row.iter().map(cell_to_string).collect());
    }
    Ok(grid)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without a trailing .0, everything else as-is
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(_) => String::new(),
        // Serial number; resolved by the lenient date parser downstream
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn read_delimited(path: &Path) -> Result<Vec<Vec<String>>, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    // Bank exports are frequently Windows-1252; fall back when the bytes
    // are not valid UTF-8.
    let text: String = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            decoded.into_owned()
        }
    };

    let delimiter = sniff_delimiter(&text);

    // Parsed line by line: the csv reader silently drops blank records,
    // but blank banner lines must keep their row position or the header
    // skip counts drift.
    let mut grid = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            grid.push(Vec::new());
            continue;
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(line.as_bytes());
        let mut record = csv::StringRecord::new();
        let got = reader.read_record(&mut record).map_err(|e| IngestError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if got {
            grid.push(record.iter().map(|f| f.to_string()).collect());
        } else {
            grid.push(Vec::new());
        }
    }
    Ok(grid)
}

/// Swedish exports delimit with semicolons precisely because amounts use
/// decimal commas, so any semicolon in the file decides it.
fn sniff_delimiter(text: &str) -> u8 {
    if text.contains(';') {
        b';'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// Header and cell access
// ---------------------------------------------------------------------------

fn header_row(
    path: &Path,
    grid: &[Vec<String>],
    skip: usize,
) -> Result<HashMap<String, usize>, IngestError> {
    let row = grid.get(skip).ok_or_else(|| IngestError::MissingHeader {
        path: path.display().to_string(),
        header_row: skip + 1,
    })?;
    if row.iter().all(|c| c.trim().is_empty()) {
        return Err(IngestError::MissingHeader {
            path: path.display().to_string(),
            header_row: skip + 1,
        });
    }

    let mut map = HashMap::new();
    for (i, name) in row.iter().enumerate() {
        map.entry(name.trim().to_string()).or_insert(i);
    }
    Ok(map)
}

fn require_column(
    path: &Path,
    headers: &HashMap<String, usize>,
    name: &str,
) -> Result<usize, IngestError> {
    headers.get(name).copied().ok_or_else(|| IngestError::MissingColumn {
        path: path.display().to_string(),
        column: name.to_string(),
    })
}

fn find_column(headers: &HashMap<String, usize>, name: &str) -> Option<usize> {
    headers.get(name).copied()
}

fn cell<'a>(record: &'a [String], idx: usize) -> &'a str {
    record.get(idx).map(String::as_str).unwrap_or("")
}

fn is_blank(record: &[String]) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}

fn parse_date_cell(raw: &str, stats: &mut IngestStats) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_date_lenient(trimmed) {
        Some(date) => Some(date),
        None => {
            stats.date_warnings += 1;
            None
        }
    }
}

fn parse_amount_cell(raw: &str, stats: &mut IngestStats) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match parse_amount(trimmed) {
        Some(cents) => cents,
        None => {
            stats.amount_warnings += 1;
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient date parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Excel serial epoch (the 1900 system with its historical offset).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Plausible serial window, roughly 1954..2119. Outside it a bare number
/// is noise, not a date.
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 20_000.0..=80_000.0;

pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // Datetime cells: try the date prefix alone ("2025-07-15 00:00:00")
    if let Some(prefix) = s.get(..10) {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, format) {
                return Some(date);
            }
        }
    }

    // Excel serial number
    if let Ok(serial) = s.parse::<f64>() {
        if SERIAL_RANGE.contains(&serial) {
            let (y, m, d) = SERIAL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
            return epoch.checked_add_signed(chrono::Duration::days(serial.trunc() as i64));
        }
    }

    None
}
