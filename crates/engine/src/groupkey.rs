use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The match categories, in cascade order. `K5x` sits between K5 and K6 and
/// prints as `K5X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Category {
    K1,
    K2,
    K3,
    K4,
    K5,
    K5x,
    K6,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::K1 => write!(f, "K1"),
            Self::K2 => write!(f, "K2"),
            Self::K3 => write!(f, "K3"),
            Self::K4 => write!(f, "K4"),
            Self::K5 => write!(f, "K5"),
            Self::K5x => write!(f, "K5X"),
            Self::K6 => write!(f, "K6"),
        }
    }
}

// ---------------------------------------------------------------------------
// Groups and stamps
// ---------------------------------------------------------------------------

/// A committed match group. Either id list may be empty (K6 can produce
/// one-sided day groups), never both.
#[derive(Debug, Clone, Serialize)]
pub struct MatchGroup {
    pub key: String,
    pub category: Category,
    pub bank_ids: Vec<u32>,
    pub bokf_ids: Vec<u32>,
}

/// What a stamped row carries into the combined output.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub category: Category,
    pub key: String,
}

/// Per-side row-id -> stamp maps. A row id appears at most once per side.
#[derive(Debug, Default)]
pub struct GroupStamps {
    pub bank: BTreeMap<u32, Stamp>,
    pub bokf: BTreeMap<u32, Stamp>,
}

// ---------------------------------------------------------------------------
// Key allocation
// ---------------------------------------------------------------------------

/// Mints `<CAT>-B<min bank id>-<seq>` keys. Counters are per category and
/// dense from 1; a group without bank rows anchors at `B0`.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    counters: BTreeMap<Category, u32>,
}

impl KeyAllocator {
    pub fn mint(&mut self, category: Category, bank_ids: &[u32]) -> String {
        let seq = self.counters.entry(category).or_insert(0);
        *seq += 1;
        let anchor = bank_ids.iter().min().copied().unwrap_or(0);
        format!("{category}-B{anchor}-{seq:06}")
    }
}
