// The combined workbook: one sheet "Kombinerad", headers on row 4, data
// from row 5, control cells on row 2. The layout is a contract with the
// downstream review process; column K carries the date, column N the
// amount, and N2 recomputes the filtered sum via SUBTOTAL.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Formula, Workbook};

use avstamning_engine::amount::cents_to_f64;
use avstamning_engine::{CombinedRow, HEADERS};

use crate::error::OutputError;

/// 0-based sheet positions of the fixed layout.
const CONTROL_ROW: u32 = 1;
const HEADER_ROW: u32 = 3;
const FIRST_DATA_ROW: u32 = 4;
const DATE_COL: u16 = 10; // K
const AMOUNT_COL: u16 = 13; // N
const LAST_COL: u16 = (HEADERS.len() - 1) as u16;

const COLUMN_WIDTHS: [(u16, f64); 9] = [
    (1, 18.0),  // Ny källa
    (2, 13.0),  // Matchkategori
    (3, 18.0),  // MatchGruppID
    (5, 40.0),  // Text
    (6, 22.0),  // Verifikationsnummer
    (8, 28.0),  // Text1
    (10, 12.0), // Datum
    (12, 20.0), // Kommentar
    (13, 14.0), // Belopp
];

/// Serialize the combined rows to xlsx bytes.
pub fn write_combined_workbook(rows: &[CombinedRow]) -> Result<Vec<u8>, OutputError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Kombinerad")?;

    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let amount_format = Format::new().set_num_format("#,##0.00");

    // Control row: side labels, reserved totals, live diff and filter sum.
    sheet.write_string(CONTROL_ROW, 1, "Bank")?;
    sheet.write_number(CONTROL_ROW, 2, 0)?;
    sheet.write_string(CONTROL_ROW, 3, "Bokföring")?;
    sheet.write_number(CONTROL_ROW, 4, 0)?;
    sheet.write_formula(CONTROL_ROW, 6, Formula::new("=E2-C2"))?;
    sheet.write_formula_with_format(
        CONTROL_ROW,
        AMOUNT_COL,
        Formula::new("=ROUND(SUBTOTAL(9,N5:N99999),2)"),
        &amount_format,
    )?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(HEADER_ROW, col as u16, *header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = FIRST_DATA_ROW + i as u32;
        sheet.write_string(r, 0, row.system.to_string())?;
        sheet.write_string(r, 1, &row.ny_kalla)?;
        sheet.write_string(r, 2, &row.match_category)?;
        sheet.write_string(r, 3, &row.group_key)?;
        sheet.write_number(r, 4, row.row_id as f64)?;
        sheet.write_string(r, 5, &row.text)?;
        sheet.write_string(r, 6, &row.voucher)?;
        sheet.write_string(r, 7, &row.category)?;
        sheet.write_string(r, 8, &row.text1)?;
        sheet.write_string(r, 9, &row.source)?;
        if let Some(date) = row.date {
            sheet.write_number_with_format(r, DATE_COL, excel_serial(date), &date_format)?;
        }
        sheet.write_string(r, 11, "SEK")?;
        // column M (Kommentar) left blank for the reviewer
        sheet.write_number_with_format(r, AMOUNT_COL, cents_to_f64(row.amount_cents), &amount_format)?;
    }

    let last_data_row = FIRST_DATA_ROW + rows.len().max(1) as u32 - 1;
    sheet.autofilter(HEADER_ROW, 0, last_data_row, LAST_COL)?;
    sheet.set_freeze_panes(FIRST_DATA_ROW, 0)?;

    for (col, width) in COLUMN_WIDTHS {
        sheet.set_column_width(col, width)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Days since the 1900-system epoch; valid for all post-1900 dates.
fn excel_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("fixed epoch");
    (date - epoch).num_days() as f64
}
