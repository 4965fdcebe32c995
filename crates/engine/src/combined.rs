//! Combined projection: one unified row per source row, bank and ledger
//! sides interleaved, ready for the `Kombinerad` sheet.

use chrono::NaiveDate;
use serde::Serialize;

use crate::groupkey::GroupStamps;
use crate::model::{starts_with_ci, BankTable, BokfTable};

/// Column headers of the combined sheet, in emit order. `Datum` sits in
/// column K and `Belopp` in column N; the workbook writer's number formats
/// and control formulas depend on those positions.
pub const HEADERS: [&str; 14] = [
    "System",
    "Ny källa",
    "Matchkategori",
    "MatchGruppID",
    "RadID",
    "Text",
    "Verifikationsnummer",
    "Kategori",
    "Text1",
    "Källa",
    "Datum",
    "Valuta",
    "Kommentar",
    "Belopp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum System {
    Bank,
    Bokforing,
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bank => write!(f, "Bank"),
            Self::Bokforing => write!(f, "Bokföring"),
        }
    }
}

/// One output row. Bank amounts arrive sign-flipped (a bank credit is a
/// ledger debit); empty strings stand for blank cells.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedRow {
    pub system: System,
    pub ny_kalla: String,
    pub match_category: String,
    pub group_key: String,
    pub row_id: u32,
    pub text: String,
    pub voucher: String,
    pub category: String,
    pub text1: String,
    pub source: String,
    pub date: Option<NaiveDate>,
    pub amount_cents: i64,
}

/// Project both tables through the stamp map and sort by
/// `(MatchGruppID, Datum, System)` with blanks last.
pub fn build_combined(bank: &BankTable, bokf: &BokfTable, stamps: &GroupStamps) -> Vec<CombinedRow> {
    let mut rows: Vec<CombinedRow> = Vec::with_capacity(bank.rows.len() + bokf.rows.len());

    for row in &bank.rows {
        let stamp = stamps.bank.get(&row.id);
        rows.push(CombinedRow {
            system: System::Bank,
            ny_kalla: match stamp {
                Some(_) => "Match".into(),
                None => bank_fallback_source(&row.text).into(),
            },
            match_category: stamp.map(|s| s.category.to_string()).unwrap_or_default(),
            group_key: stamp.map(|s| s.key.clone()).unwrap_or_default(),
            row_id: row.id,
            text: row.text.clone(),
            voucher: String::new(),
            category: String::new(),
            text1: String::new(),
            source: String::new(),
            date: row.date,
            amount_cents: -row.amount_cents,
        });
    }

    for row in &bokf.rows {
        let stamp = stamps.bokf.get(&row.id);
        rows.push(CombinedRow {
            system: System::Bokforing,
            ny_kalla: match stamp {
                Some(_) => "Match".into(),
                None => row.source.clone(),
            },
            match_category: stamp.map(|s| s.category.to_string()).unwrap_or_default(),
            group_key: stamp.map(|s| s.key.clone()).unwrap_or_default(),
            row_id: row.id,
            text: String::new(),
            voucher: row.voucher.clone(),
            category: row.category.clone(),
            text1: row.text1.clone(),
            source: row.source.clone(),
            date: row.date,
            amount_cents: row.amount_cents,
        });
    }

    rows.sort_by(|a, b| {
        sort_key(a).cmp(&sort_key(b))
    });
    rows
}

/// Unmatched bank rows are routed by their statement text.
fn bank_fallback_source(text: &str) -> &'static str {
    if starts_with_ci(text, "BG53782751") {
        "Kundreskontra"
    } else if starts_with_ci(text, "LB") {
        "Leverantörsreskontra"
    } else {
        "Manuell"
    }
}

type SortKey<'a> = (bool, &'a str, bool, Option<NaiveDate>, System);

fn sort_key(row: &CombinedRow) -> SortKey<'_> {
    (
        row.group_key.is_empty(),
        row.group_key.as_str(),
        row.date.is_none(),
        row.date,
        row.system,
    )
}
