//! Pipeline driver: applies the category cascade in fixed order over the
//! remaining (unclaimed) rows and collects the committed groups.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::groupkey::{GroupStamps, KeyAllocator, MatchGroup, Stamp};
use crate::model::{BankTable, BokfTable};
use crate::{k1, k2, k34, k5, k5x, k6, Category};

// ---------------------------------------------------------------------------
// Shared rule state
// ---------------------------------------------------------------------------

/// The only mutable state of a run: per-side used-sets, the key allocator
/// and the committed groups. Rules read the tables and call [`commit`]
/// exactly once per accepted group, after their accept test has passed, so
/// the used-sets never observe a partial claim.
///
/// [`commit`]: MatchState::commit
#[derive(Debug, Default)]
pub struct MatchState {
    pub used_bank: BTreeSet<u32>,
    pub used_bokf: BTreeSet<u32>,
    pub groups: Vec<MatchGroup>,
    pub stamps: GroupStamps,
    alloc: KeyAllocator,
}

impl MatchState {
    /// Stamp a group: mint its key, mark every row consumed.
    pub fn commit(&mut self, category: Category, mut bank_ids: Vec<u32>, mut bokf_ids: Vec<u32>) {
        debug_assert!(!bank_ids.is_empty() || !bokf_ids.is_empty());
        bank_ids.sort_unstable();
        bokf_ids.sort_unstable();

        let key = self.alloc.mint(category, &bank_ids);
        for &id in &bank_ids {
            let fresh = self.used_bank.insert(id);
            debug_assert!(fresh, "bank row {id} claimed twice");
            self.stamps.bank.insert(id, Stamp { category, key: key.clone() });
        }
        for &id in &bokf_ids {
            let fresh = self.used_bokf.insert(id);
            debug_assert!(fresh, "bokf row {id} claimed twice");
            self.stamps.bokf.insert(id, Stamp { category, key: key.clone() });
        }
        self.groups.push(MatchGroup { key, category, bank_ids, bokf_ids });
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub bank_rows: usize,
    pub bokf_rows: usize,
    pub groups_per_category: BTreeMap<String, usize>,
    pub matched_bank: usize,
    pub matched_bokf: usize,
    pub unmatched_bank: usize,
    pub unmatched_bokf: usize,
}

/// Everything a run produces: the groups in commit order, the per-row
/// stamps for the combined projection, and the summary.
#[derive(Debug)]
pub struct Reconciliation {
    pub groups: Vec<MatchGroup>,
    pub stamps: GroupStamps,
    pub summary: RunSummary,
}

/// Run the cascade K1 -> K2 -> K3 -> K4 -> K5 -> K5X -> K6.
///
/// Deterministic and total: same tables, same result, no failure path.
pub fn reconcile(bank: &BankTable, bokf: &BokfTable) -> Reconciliation {
    let mut state = MatchState::default();

    k1::apply(bank, bokf, &mut state);
    k2::apply(bank, bokf, &mut state);
    k34::apply_k3(bank, bokf, &mut state);
    k34::apply_k4(bank, bokf, &mut state);
    k5::apply(bank, bokf, &mut state);
    k5x::apply(bank, bokf, &mut state);
    k6::apply(bank, bokf, &mut state);

    let mut groups_per_category: BTreeMap<String, usize> = BTreeMap::new();
    for group in &state.groups {
        *groups_per_category.entry(group.category.to_string()).or_insert(0) += 1;
    }

    let summary = RunSummary {
        bank_rows: bank.rows.len(),
        bokf_rows: bokf.rows.len(),
        groups_per_category,
        matched_bank: state.used_bank.len(),
        matched_bokf: state.used_bokf.len(),
        unmatched_bank: bank.rows.len() - state.used_bank.len(),
        unmatched_bokf: bokf.rows.len() - state.used_bokf.len(),
    };

    Reconciliation { groups: state.groups, stamps: state.stamps, summary }
}
