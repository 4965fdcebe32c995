//! K1 — BG53782751 inbound day sums against "Inbetalningar" postings.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{category_is, contains_ci, starts_with_ci, yymmdd, BankTable, BokfRow, BokfTable};
use crate::pipeline::MatchState;
use crate::subset::find_drop_combo;
use crate::Category;

const BANK_MARKER: &str = "BG53782751";
const COMBO_TRIES: usize = 2000;

pub(crate) fn apply(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    let mut days: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    for row in &bank.rows {
        if state.used_bank.contains(&row.id) || row.amount_cents <= 0 {
            continue;
        }
        let Some(date) = row.date else { continue };
        if contains_ci(&row.text, BANK_MARKER) {
            days.entry(date).or_default().push(row.id);
        }
    }

    for (day, bank_ids) in days {
        let bank_sum: i64 = bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();
        let pool: Vec<&BokfRow> = bokf
            .rows
            .iter()
            .filter(|r| !state.used_bokf.contains(&r.id))
            .filter(|r| r.date == Some(day) && r.amount_cents > 0)
            .filter(|r| category_is(&r.category, "Inbetalningar"))
            .collect();

        if let Some(claimed) = resolve_day(&pool, bank_sum, day) {
            state.commit(Category::K1, bank_ids, claimed);
        }
    }
}

/// The six attempt steps, first match wins.
fn resolve_day(pool: &[&BokfRow], bank_sum: i64, day: NaiveDate) -> Option<Vec<u32>> {
    // 1/2: whole candidate pool, then drop-one.
    if let Some(ids) = accept_full(pool, bank_sum) {
        return Some(ids);
    }
    if let Some(ids) = accept_drop_one(pool, bank_sum) {
        return Some(ids);
    }

    // 3/4: restrict to SEB vouchers.
    let seb: Vec<&BokfRow> = pool
        .iter()
        .copied()
        .filter(|r| starts_with_ci(&r.voucher, "SEB"))
        .collect();
    if let Some(ids) = accept_full(&seb, bank_sum) {
        return Some(ids);
    }
    if let Some(ids) = accept_drop_one(&seb, bank_sum) {
        return Some(ids);
    }

    // 5: full pool minus a small combination of non-SEB rows.
    if let Some(ids) = accept_drop_non_seb(pool, bank_sum) {
        return Some(ids);
    }

    // 6: SEB rows plus the non-SEB rows whose voucher names this day's
    // Skabank batch; rerun the full, drop-one and drop-combination steps.
    let stamp = yymmdd(day);
    let narrowed: Vec<&BokfRow> = pool
        .iter()
        .copied()
        .filter(|r| {
            starts_with_ci(&r.voucher, "SEB")
                || (r.voucher.contains(&stamp) && contains_ci(&r.voucher, "Skabank"))
        })
        .collect();
    if let Some(ids) = accept_full(&narrowed, bank_sum) {
        return Some(ids);
    }
    if let Some(ids) = accept_drop_one(&narrowed, bank_sum) {
        return Some(ids);
    }
    accept_drop_non_seb(&narrowed, bank_sum)
}

fn pool_sum(pool: &[&BokfRow]) -> i64 {
    pool.iter().map(|r| r.amount_cents).sum()
}

fn ids(pool: &[&BokfRow]) -> Vec<u32> {
    pool.iter().map(|r| r.id).collect()
}

/// Step (i): the pool as a whole balances the day.
fn accept_full(pool: &[&BokfRow], bank_sum: i64) -> Option<Vec<u32>> {
    if !pool.is_empty() && pool_sum(pool) == bank_sum {
        Some(ids(pool))
    } else {
        None
    }
}

/// Step (ii): dropping the lowest-id row equal to the excess balances it.
fn accept_drop_one(pool: &[&BokfRow], bank_sum: i64) -> Option<Vec<u32>> {
    let diff = pool_sum(pool) - bank_sum;
    let victim = pool.iter().position(|r| r.amount_cents == diff)?;
    let remainder: Vec<&BokfRow> = pool
        .iter()
        .copied()
        .enumerate()
        .filter(|(i, _)| *i != victim)
        .map(|(_, r)| r)
        .collect();
    accept_full(&remainder, bank_sum)
}

/// Step (v): drop a 1..=3 combination of non-SEB rows.
fn accept_drop_non_seb(pool: &[&BokfRow], bank_sum: i64) -> Option<Vec<u32>> {
    let diff = pool_sum(pool) - bank_sum;
    let non_seb: Vec<usize> = pool
        .iter()
        .enumerate()
        .filter(|(_, r)| !starts_with_ci(&r.voucher, "SEB"))
        .map(|(i, _)| i)
        .collect();
    let amounts: Vec<i64> = non_seb.iter().map(|&i| pool[i].amount_cents).collect();
    let combo = find_drop_combo(&amounts, diff, 3, COMBO_TRIES)?;
    let dropped: Vec<usize> = combo.iter().map(|&c| non_seb[c]).collect();
    let remainder: Vec<&BokfRow> = pool
        .iter()
        .copied()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, r)| r)
        .collect();
    accept_full(&remainder, bank_sum)
}
