//! Subset-sum kernels backing the drop steps of the category rules.
//!
//! Two searches, both deterministic:
//! - bounded combination enumeration for small drops (sizes 1..=3, or up
//!   to 10 for cross-day netting), capped at a fixed number of tries;
//! - meet-in-the-middle over integer cents for the global-balance rule,
//!   where up to ~50 candidates are in play.

use std::collections::HashMap;

/// Enumerate combinations of `amounts` indices in lexicographic order,
/// sizes 1..=`max_size`, and return the first whose sum equals `target`.
///
/// Every enumerated combination counts against `max_tries`, shared across
/// all sizes of one call. Candidate order is the caller's: the rules pass
/// id-ascending pools, the cross-day balancer passes magnitude-descending
/// day totals.
pub fn find_drop_combo(
    amounts: &[i64],
    target: i64,
    max_size: usize,
    max_tries: usize,
) -> Option<Vec<usize>> {
    let mut tries = 0usize;
    let mut combo: Vec<usize> = Vec::with_capacity(max_size);

    fn descend(
        amounts: &[i64],
        target: i64,
        size: usize,
        start: usize,
        sum: i64,
        combo: &mut Vec<usize>,
        tries: &mut usize,
        max_tries: usize,
    ) -> Option<Vec<usize>> {
        if combo.len() == size {
            *tries += 1;
            if sum == target {
                return Some(combo.clone());
            }
            if *tries >= max_tries {
                return Some(Vec::new()); // sentinel: cap reached, no hit
            }
            return None;
        }
        for i in start..amounts.len() {
            combo.push(i);
            let hit = descend(amounts, target, size, i + 1, sum + amounts[i], combo, tries, max_tries);
            combo.pop();
            if let Some(found) = hit {
                return Some(found);
            }
            if *tries >= max_tries {
                return Some(Vec::new());
            }
        }
        None
    }

    for size in 1..=max_size.min(amounts.len()) {
        match descend(amounts, target, size, 0, 0, &mut combo, &mut tries, max_tries) {
            Some(found) if !found.is_empty() => return Some(found),
            Some(_) => return None, // cap hit
            None => {}
        }
    }
    None
}

/// Largest candidate set the meet-in-the-middle search will consider.
const MITM_MAX_CANDIDATES: usize = 50;

/// Above 26 retained values, only the top 34 by magnitude are searched
/// (two halves of 17, bounding each half-table at 2^17 entries).
const MITM_WIDE_CUTOFF: usize = 26;
const MITM_WIDE_RETAIN: usize = 34;

/// Find a subset of `values` summing exactly to `target` (integer cents).
///
/// Degenerate case first: if the whole set already sums to `target` the
/// empty subset is returned and the caller's balance re-check decides.
/// Otherwise indices are ranked by descending magnitude, the top 50 (or 34
/// when more than 26 remain) are split into two halves, and each half's
/// partial sums are tabulated with first-occurrence-wins semantics so that
/// earlier, higher-magnitude entries take ties. Returned indices refer to
/// the input slice.
pub fn meet_in_middle(values: &[i64], target: i64) -> Option<Vec<usize>> {
    let total: i64 = values.iter().sum();
    if total == target {
        return Some(Vec::new());
    }
    if values.is_empty() {
        return None;
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].abs().cmp(&values[a].abs()).then(a.cmp(&b)));
    order.truncate(MITM_MAX_CANDIDATES);

    let retained = if order.len() <= MITM_WIDE_CUTOFF {
        order
    } else {
        order.truncate(MITM_WIDE_RETAIN);
        order
    };

    let split = retained.len() / 2;
    let (left_ids, right_ids) = retained.split_at(split);

    // Right half: partial sum -> first mask reaching it. Mask order makes
    // earlier (higher-magnitude) entries win ties.
    let mut right_table: HashMap<i64, u32> = HashMap::new();
    for mask in 0u32..(1u32 << right_ids.len()) {
        let sum = mask_sum(mask, right_ids, values);
        right_table.entry(sum).or_insert(mask);
    }

    // Left half scanned in the same mask order; first probe hit wins.
    for mask in 0u32..(1u32 << left_ids.len()) {
        let sum = mask_sum(mask, left_ids, values);
        if let Some(&right_mask) = right_table.get(&(target - sum)) {
            if mask == 0 && right_mask == 0 {
                continue; // the empty subset never balances a non-trivial target
            }
            let mut chosen = mask_indices(mask, left_ids);
            chosen.extend(mask_indices(right_mask, right_ids));
            chosen.sort_unstable();
            return Some(chosen);
        }
    }

    None
}

fn mask_sum(mask: u32, ids: &[usize], values: &[i64]) -> i64 {
    let mut sum = 0;
    for (bit, &idx) in ids.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            sum += values[idx];
        }
    }
    sum
}

fn mask_indices(mask: u32, ids: &[usize]) -> Vec<usize> {
    ids.iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, &idx)| idx)
        .collect()
}
