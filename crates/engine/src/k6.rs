//! K6 — symmetric cross-day netting of residual day totals.
//!
//! Each day still carrying unclaimed rows gets a residual total
//! `sum(postings) - sum(bank)`. Zero-total days are stamped on the spot;
//! the rest are split into plus and minus days and netted against each
//! other with a bounded combination search over day totals.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{BankTable, BokfTable};
use crate::pipeline::MatchState;
use crate::subset::find_drop_combo;
use crate::Category;

const COMBO_TRIES: usize = 2000;
const MAX_DAYS_PER_COMBO: usize = 10;

#[derive(Debug)]
struct DayResidual {
    date: NaiveDate,
    bank_ids: Vec<u32>,
    bokf_ids: Vec<u32>,
    total: i64,
}

pub(crate) fn apply(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    let mut by_day: BTreeMap<NaiveDate, (Vec<u32>, Vec<u32>)> = BTreeMap::new();
    for row in &bank.rows {
        if state.used_bank.contains(&row.id) {
            continue;
        }
        if let Some(date) = row.date {
            by_day.entry(date).or_default().0.push(row.id);
        }
    }
    for row in &bokf.rows {
        if state.used_bokf.contains(&row.id) {
            continue;
        }
        if let Some(date) = row.date {
            by_day.entry(date).or_default().1.push(row.id);
        }
    }

    let mut plus_days: Vec<DayResidual> = Vec::new();
    let mut minus_days: Vec<DayResidual> = Vec::new();

    for (date, (bank_ids, bokf_ids)) in by_day {
        let bank_sum: i64 = bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();
        let bokf_sum: i64 = bokf_ids.iter().map(|&id| bokf.row(id).amount_cents).sum();
        let total = bokf_sum - bank_sum;
        let residual = DayResidual { date, bank_ids, bokf_ids, total };

        if total == 0 {
            state.commit(Category::K6, residual.bank_ids, residual.bokf_ids);
        } else if total > 0 {
            plus_days.push(residual);
        } else {
            minus_days.push(residual);
        }
    }

    let mut plus_used = vec![false; plus_days.len()];
    let mut minus_used = vec![false; minus_days.len()];

    // Plus days against combinations of minus days, then the symmetric pass.
    for pi in 0..plus_days.len() {
        if plus_used[pi] {
            continue;
        }
        if let Some(chosen) = net_against(plus_days[pi].total, &minus_days, &minus_used) {
            commit_combo(state, &plus_days[pi], &minus_days, &chosen);
            plus_used[pi] = true;
            for &mi in &chosen {
                minus_used[mi] = true;
            }
        }
    }

    for mi in 0..minus_days.len() {
        if minus_used[mi] {
            continue;
        }
        if let Some(chosen) = net_against(-minus_days[mi].total, &plus_days, &plus_used) {
            commit_combo(state, &minus_days[mi], &plus_days, &chosen);
            minus_used[mi] = true;
            for &pi in &chosen {
                plus_used[pi] = true;
            }
        }
    }
}

/// Find unused counterpart days whose absolute totals sum to `target`.
/// Candidates are ordered by descending magnitude before the combination
/// search; returned indices refer to `days`.
fn net_against(target: i64, days: &[DayResidual], used: &[bool]) -> Option<Vec<usize>> {
    let mut candidates: Vec<usize> = (0..days.len()).filter(|&i| !used[i]).collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|&a, &b| {
        days[b].total.abs().cmp(&days[a].total.abs()).then(days[a].date.cmp(&days[b].date))
    });

    let amounts: Vec<i64> = candidates.iter().map(|&i| days[i].total.abs()).collect();
    let combo = find_drop_combo(&amounts, target, MAX_DAYS_PER_COMBO, COMBO_TRIES)?;
    Some(combo.into_iter().map(|c| candidates[c]).collect())
}

fn commit_combo(
    state: &mut MatchState,
    anchor: &DayResidual,
    others: &[DayResidual],
    chosen: &[usize],
) {
    let mut bank_ids = anchor.bank_ids.clone();
    let mut bokf_ids = anchor.bokf_ids.clone();
    for &i in chosen {
        bank_ids.extend_from_slice(&others[i].bank_ids);
        bokf_ids.extend_from_slice(&others[i].bokf_ids);
    }
    state.commit(Category::K6, bank_ids, bokf_ids);
}
