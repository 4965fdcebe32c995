use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One bank-statement movement. The id is assigned once at load in insertion
/// order and never reused; every set operation downstream keys on it.
#[derive(Debug, Clone)]
pub struct BankRow {
    pub id: u32,
    pub date: Option<NaiveDate>,
    pub text: String,
    pub amount_cents: i64,
}

/// One general-ledger posting. Rows whose opening-balance cell is non-empty
/// are aggregates and must be dropped by the loader before they get here.
#[derive(Debug, Clone)]
pub struct BokfRow {
    pub id: u32,
    pub date: Option<NaiveDate>,
    pub amount_cents: i64,
    pub category: String,
    pub voucher: String,
    pub text1: String,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Bank-statement side. Row ids equal their index in `rows`.
#[derive(Debug, Default)]
pub struct BankTable {
    pub rows: Vec<BankRow>,
}

impl BankTable {
    pub fn push(&mut self, date: Option<NaiveDate>, text: String, amount_cents: i64) -> u32 {
        let id = self.rows.len() as u32;
        self.rows.push(BankRow { id, date, text, amount_cents });
        id
    }

    pub fn row(&self, id: u32) -> &BankRow {
        &self.rows[id as usize]
    }
}

/// Ledger side. Row ids equal their index in `rows`.
#[derive(Debug, Default)]
pub struct BokfTable {
    pub rows: Vec<BokfRow>,
}

impl BokfTable {
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        date: Option<NaiveDate>,
        amount_cents: i64,
        category: String,
        voucher: String,
        text1: String,
        source: String,
    ) -> u32 {
        let id = self.rows.len() as u32;
        self.rows.push(BokfRow { id, date, amount_cents, category, voucher, text1, source });
        id
    }

    pub fn row(&self, id: u32) -> &BokfRow {
        &self.rows[id as usize]
    }
}

// ---------------------------------------------------------------------------
// Text predicates shared by the category rules
// ---------------------------------------------------------------------------

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn starts_with_ci(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack
            .chars()
            .zip(prefix.chars())
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
}

/// Category cells are compared trimmed and case-insensitively.
pub(crate) fn category_is(cell: &str, name: &str) -> bool {
    cell.trim().eq_ignore_ascii_case(name)
}

/// Two-digit year/month/day string of a bank date, as embedded in vouchers.
pub(crate) fn yymmdd(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}
