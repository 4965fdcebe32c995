//! K3/K4 — per-row amount+date matching.
//!
//! K3 claims bank rows carrying a 35-prefixed payment reference against a
//! same-day "Betalningar" posting of equal amount. K4 is the generic
//! fallback for bank rows matching none of the earlier text patterns,
//! against any same-day posting of equal amount.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{category_is, contains_ci, BankRow, BankTable, BokfTable};
use crate::pipeline::MatchState;
use crate::{k2, Category};

pub(crate) fn reference_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"35\d{10}").expect("static pattern"))
}

/// Bank rows in (date, id) order; rows without a date cannot be matched.
fn ordered_bank<'a>(bank: &'a BankTable, state: &MatchState) -> Vec<&'a BankRow> {
    let mut rows: Vec<&BankRow> = bank
        .rows
        .iter()
        .filter(|r| !state.used_bank.contains(&r.id) && r.date.is_some())
        .collect();
    rows.sort_by_key(|r| (r.date, r.id));
    rows
}

pub(crate) fn apply_k3(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    for row in ordered_bank(bank, state) {
        if !reference_pattern().is_match(&row.text) {
            continue;
        }
        let candidate = bokf
            .rows
            .iter()
            .filter(|f| !state.used_bokf.contains(&f.id))
            .filter(|f| f.date == row.date && category_is(&f.category, "Betalningar"))
            .find(|f| f.amount_cents == row.amount_cents);
        if let Some(found) = candidate {
            let found_id = found.id;
            state.commit(Category::K3, vec![row.id], vec![found_id]);
        }
    }
}

pub(crate) fn apply_k4(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    for row in ordered_bank(bank, state) {
        if contains_ci(&row.text, "BG53782751")
            || k2::bank_pattern().is_match(&row.text)
            || reference_pattern().is_match(&row.text)
        {
            continue;
        }
        let candidate = bokf
            .rows
            .iter()
            .filter(|f| !state.used_bokf.contains(&f.id))
            .filter(|f| f.date == row.date)
            .find(|f| f.amount_cents == row.amount_cents);
        if let Some(found) = candidate {
            let found_id = found.id;
            state.commit(Category::K4, vec![row.id], vec![found_id]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    #[test]
    fn k3_matches_reference_row_exactly() {
        let mut bank = BankTable::default();
        bank.push(Some(d(15)), "35 1234567890".into(), -50_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), -50_000, "Betalningar".into(), "V001".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k3(&bank, &bokf, &mut state);

        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.groups[0].key, "K3-B0-000001");
        assert_eq!(state.groups[0].bank_ids, vec![0]);
        assert_eq!(state.groups[0].bokf_ids, vec![0]);
    }

    #[test]
    fn k3_requires_betalningar_category() {
        let mut bank = BankTable::default();
        bank.push(Some(d(15)), "351234567890".into(), -50_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), -50_000, "Inbetalningar".into(), "V001".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k3(&bank, &bokf, &mut state);
        assert!(state.groups.is_empty());
    }

    #[test]
    fn k3_prefers_lowest_posting_id() {
        let mut bank = BankTable::default();
        bank.push(Some(d(15)), "351234567890".into(), -50_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), -50_000, "Betalningar".into(), "V001".into(), String::new(), String::new());
        bokf.push(Some(d(15)), -50_000, "Betalningar".into(), "V002".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k3(&bank, &bokf, &mut state);
        assert_eq!(state.groups[0].bokf_ids, vec![0]);
        assert!(!state.used_bokf.contains(&1));
    }

    #[test]
    fn k4_skips_patterned_rows() {
        let mut bank = BankTable::default();
        bank.push(Some(d(15)), "BG53782751".into(), 10_000);
        bank.push(Some(d(15)), "BG 5341-7689".into(), 10_000);
        bank.push(Some(d(15)), "351234567890".into(), 10_000);
        bank.push(Some(d(15)), "Swish inbet".into(), 10_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), 10_000, "Övrigt".into(), "V1".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k4(&bank, &bokf, &mut state);

        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.groups[0].bank_ids, vec![3]);
    }

    #[test]
    fn k4_matches_any_category() {
        let mut bank = BankTable::default();
        bank.push(Some(d(15)), "Hyra juli".into(), -120_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), -120_000, "Övrigt".into(), "V9".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k4(&bank, &bokf, &mut state);
        assert_eq!(state.groups[0].category, Category::K4);
    }

    #[test]
    fn bank_rows_walk_in_date_then_id_order() {
        let mut bank = BankTable::default();
        bank.push(Some(d(16)), "Senare".into(), -10_000);
        bank.push(Some(d(15)), "Tidigare".into(), -10_000);
        let mut bokf = BokfTable::default();
        bokf.push(Some(d(15)), -10_000, "Övrigt".into(), "V1".into(), String::new(), String::new());
        bokf.push(Some(d(16)), -10_000, "Övrigt".into(), "V2".into(), String::new(), String::new());

        let mut state = MatchState::default();
        apply_k4(&bank, &bokf, &mut state);

        // the earlier date is processed first and gets the first sequence
        assert_eq!(state.groups[0].bank_ids, vec![1]);
        assert_eq!(state.groups[0].key, "K4-B1-000001");
        assert_eq!(state.groups[1].bank_ids, vec![0]);
    }
}
