//! K2 — BG 5341-7689 inbound day sums against tiered posting pools.
//!
//! Four candidate pools per bank day:
//!   A  same-day "065 BFO" credits
//!   A' the A rows whose Text1 names the day's Skabank batch
//!   B  same-day "Inbetalningar" credits with a Skabank voucher (non-SEB)
//!   C  "Betalningar" credits within +-2 days whose voucher is the 6-digit
//!      day stamp
//! The sweep runs over A, then A' alone, then A'∪B, then A'∪B∪C; within a
//! tier the steps are full pool, single row, drop-one, drop-combination.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::model::{category_is, contains_ci, starts_with_ci, yymmdd, BankTable, BokfRow, BokfTable};
use crate::pipeline::MatchState;
use crate::subset::find_drop_combo;
use crate::Category;

const COMBO_TRIES: usize = 2000;

pub(crate) fn bank_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)BG\s*5341-7689").expect("static pattern"))
}

pub(crate) fn apply(bank: &BankTable, bokf: &BokfTable, state: &mut MatchState) {
    let mut days: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    for row in &bank.rows {
        if state.used_bank.contains(&row.id) || row.amount_cents <= 0 {
            continue;
        }
        let Some(date) = row.date else { continue };
        if bank_pattern().is_match(&row.text) {
            days.entry(date).or_default().push(row.id);
        }
    }

    for (day, bank_ids) in days {
        let bank_sum: i64 = bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();
        if let Some(claimed) = resolve_day(bokf, state, day, bank_sum) {
            state.commit(Category::K2, bank_ids, claimed);
        }
    }
}

fn resolve_day(
    bokf: &BokfTable,
    state: &MatchState,
    day: NaiveDate,
    bank_sum: i64,
) -> Option<Vec<u32>> {
    let stamp = yymmdd(day);

    let unused = |r: &&BokfRow| !state.used_bokf.contains(&r.id);

    let pool_a: Vec<&BokfRow> = bokf
        .rows
        .iter()
        .filter(unused)
        .filter(|r| r.date == Some(day) && r.amount_cents > 0)
        .filter(|r| category_is(&r.category, "065 BFO"))
        .collect();

    let pool_a_prime: Vec<&BokfRow> = pool_a
        .iter()
        .copied()
        .filter(|r| contains_ci(&r.text1, "Skabank") && r.text1.contains(&stamp))
        .collect();

    let pool_b: Vec<&BokfRow> = bokf
        .rows
        .iter()
        .filter(unused)
        .filter(|r| r.date == Some(day) && r.amount_cents > 0)
        .filter(|r| category_is(&r.category, "Inbetalningar"))
        .filter(|r| !starts_with_ci(&r.voucher, "SEB"))
        .filter(|r| contains_ci(&r.voucher, "Skabank") && r.voucher.contains(&stamp))
        .collect();

    let window_lo = day - Duration::days(2);
    let window_hi = day + Duration::days(2);
    let pool_c: Vec<&BokfRow> = bokf
        .rows
        .iter()
        .filter(unused)
        .filter(|r| r.amount_cents > 0)
        .filter(|r| category_is(&r.category, "Betalningar"))
        .filter(|r| matches!(r.date, Some(d) if d >= window_lo && d <= window_hi))
        .filter(|r| is_six_digits(&r.voucher) && r.voucher.contains(&stamp))
        .collect();

    // Tier order: A, A' alone, A'∪B, A'∪B∪C. The standalone A' sweep runs
    // before any union on purpose; reordering shifts tie-breaks.
    let tiers: [Vec<&BokfRow>; 4] = [
        pool_a,
        pool_a_prime.clone(),
        merge(&pool_a_prime, &pool_b),
        merge(&merge(&pool_a_prime, &pool_b), &pool_c),
    ];

    for tier in &tiers {
        if let Some(ids) = sweep(tier, bank_sum) {
            return Some(ids);
        }
    }
    None
}

/// Union of two pools, deduplicated, ascending row id.
fn merge<'a>(left: &[&'a BokfRow], right: &[&'a BokfRow]) -> Vec<&'a BokfRow> {
    let mut merged: BTreeMap<u32, &BokfRow> = BTreeMap::new();
    for &r in left.iter().chain(right.iter()) {
        merged.insert(r.id, r);
    }
    merged.into_values().collect()
}

fn is_six_digits(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_digit())
}

fn pool_sum(pool: &[&BokfRow]) -> i64 {
    pool.iter().map(|r| r.amount_cents).sum()
}

/// One tier sweep: (i) whole pool, (ii) single row, (iii) drop-one,
/// (iv) drop a 1..=3 combination. First hit wins.
fn sweep(pool: &[&BokfRow], bank_sum: i64) -> Option<Vec<u32>> {
    if pool.is_empty() {
        return None;
    }
    let total = pool_sum(pool);

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

    let amounts: Vec<i64> = pool.iter().map(|r| r.amount_cents).collect();
    if let Some(combo) = find_drop_combo(&amounts, diff, 3, COMBO_TRIES) {
        let remainder: Vec<u32> = pool
            .iter()
            .enumerate()
            .filter(|(i, _)| !combo.contains(i))
            .map(|(_, r)| r.id)
            .collect();
        if !remainder.is_empty() {
            return Some(remainder);
        }
    }

    None
}
