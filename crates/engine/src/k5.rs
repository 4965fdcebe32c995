//! K5 — LB outbound day sums against same-day postings, first against the
//! whole day, then against the debit-only subset.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{starts_with_ci, BankTable, BokfRow, BokfTable};
use crate::pipeline::MatchState;
use crate::Category;

pub(crate) fn apply(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    let mut days: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    for row in &bank.rows {
        if state.used_bank.contains(&row.id) {
            continue;
        }
        let Some(date) = row.date else { continue };
        if starts_with_ci(&row.text, "LB") {
            days.entry(date).or_default().push(row.id);
        }
    }

    for (day, bank_ids) in days {
        let bank_sum: i64 = bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();

        let all: Vec<&BokfRow> = bokf
            .rows
            .iter()
            .filter(|r| !state.used_bokf.contains(&r.id))
            .filter(|r| r.date == Some(day))
            .collect();
        let negatives: Vec<&BokfRow> = all.iter().copied().filter(|r| r.amount_cents < 0).collect();

        let claimed = sweep(&all, bank_sum).or_else(|| sweep(&negatives, bank_sum));
        if let Some(ids) = claimed {
            state.commit(Category::K5, bank_ids, ids);
        }
    }
}

/// (i) whole pool, (ii) single row, (iii) drop-one. First hit wins.
fn sweep(pool: &[&BokfRow], bank_sum: i64) -> Option<Vec<u32>> {
    if pool.is_empty() {
        return None;
    }
    let total: i64 = pool.iter().map(|r| r.amount_cents).sum();

    if total == bank_sum {
        return Some(pool.iter().map(|r| r.id).collect());
    }

    if let Some(row) = pool.iter().find(|r| r.amount_cents == bank_sum) {
        return Some(vec![row.id]);
    }

    let diff = total - bank_sum;
    if let Some(victim) = pool.iter().position(|r| r.amount_cents == diff) {
        let remainder: Vec<u32> = pool
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != victim)
            .map(|(_, r)| r.id)
            .collect();
        if total - pool[victim].amount_cents == bank_sum && !remainder.is_empty() {
            return Some(remainder);
        }
    }

    None
}
