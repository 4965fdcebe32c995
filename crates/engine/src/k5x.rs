//! K5X — per-day global balance. After K1..K5 each day's residual diff
//! (postings minus bank movements) is trimmed away by excluding rows from
//! one side: a single posting, a meet-in-the-middle subset of postings, a
//! single bank row, or a meet-in-the-middle subset of bank rows. Excluded
//! rows are left unclaimed; only the accepted remainders are stamped.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{BankTable, BokfTable};
use crate::pipeline::MatchState;
use crate::subset::meet_in_middle;
use crate::Category;

pub(crate) fn apply(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut bank_by_day: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    let mut bokf_by_day: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();

    for row in &bank.rows {
        if state.used_bank.contains(&row.id) {
            continue;
        }
        if let Some(date) = row.date {
            days.insert(date);
            bank_by_day.entry(date).or_default().push(row.id);
        }
    }
    for row in &bokf.rows {
        if state.used_bokf.contains(&row.id) {
            continue;
        }
        if let Some(date) = row.date {
            days.insert(date);
            bokf_by_day.entry(date).or_default().push(row.id);
        }
    }

    for day in days {
        let bank_ids = bank_by_day.get(&day).cloned().unwrap_or_default();
        let bokf_ids = bokf_by_day.get(&day).cloned().unwrap_or_default();

        let bank_sum: i64 = bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();
        let bokf_sum: i64 = bokf_ids.iter().map(|&id| bokf.row(id).amount_cents).sum();
        let diff = bokf_sum - bank_sum;
        if diff == 0 {
            continue; // balanced days belong to K6
        }

        let bokf_amounts: Vec<i64> = bokf_ids.iter().map(|&id| bokf.row(id).amount_cents).collect();
        let bank_amounts: Vec<i64> = bank_ids.iter().map(|&id| bank.row(id).amount_cents).collect();

        // 1. Drop a single posting equal to the excess.
        if let Some(pos) = bokf_amounts.iter().position(|&a| a == diff) {
            let keep = without(&bokf_ids, &[pos]);
            let kept_sum: i64 = keep.iter().map(|&id| bokf.row(id).amount_cents).sum();
            if kept_sum == bank_sum && !(keep.is_empty() && bank_ids.is_empty()) {
                state.commit(Category::K5x, bank_ids, keep);
                continue;
            }
        }

        // 2. Drop a posting subset found by meet-in-the-middle.
        if let Some(excluded) = meet_in_middle(&bokf_amounts, diff) {
            let keep = without(&bokf_ids, &excluded);
            let kept_sum: i64 = keep.iter().map(|&id| bokf.row(id).amount_cents).sum();
            if kept_sum == bank_sum && !(keep.is_empty() && bank_ids.is_empty()) {
                state.commit(Category::K5x, bank_ids, keep);
                continue;
            }
        }

        // 3. Drop a single bank row equal to the shortfall.
        if let Some(pos) = bank_amounts.iter().position(|&a| a == -diff) {
            let keep = without(&bank_ids, &[pos]);
            let kept_sum: i64 = keep.iter().map(|&id| bank.row(id).amount_cents).sum();
            if kept_sum == bokf_sum && !(keep.is_empty() && bokf_ids.is_empty()) {
                state.commit(Category::K5x, keep, bokf_ids);
                continue;
            }
        }

        // 4. Drop a bank subset found by meet-in-the-middle.
        if let Some(excluded) = meet_in_middle(&bank_amounts, -diff) {
            let keep = without(&bank_ids, &excluded);
            let kept_sum: i64 = keep.iter().map(|&id| bank.row(id).amount_cents).sum();
            if kept_sum == bokf_sum && !(keep.is_empty() && bokf_ids.is_empty()) {
                state.commit(Category::K5x, keep, bokf_ids);
            }
        }
    }
}

/// Ids minus the excluded positions.
fn without(ids: &[u32], excluded: &[usize]) -> Vec<u32> {
    ids.iter()
        .enumerate()
        .filter(|(i, _)| !excluded.contains(i))
        .map(|(_, &id)| id)
        .collect()
}
