//! `avstamning-engine` — bank/ledger reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns stamped match
//! groups and the combined projection. No CLI or IO dependencies.
//!
//! The cascade runs K1 through K6 in fixed order; every rule sees only the
//! rows earlier rules left unclaimed, and the whole run is deterministic.

pub mod amount;
pub mod combined;
pub mod groupkey;
pub mod model;
pub mod pipeline;
pub mod subset;

mod k1;
mod k2;
mod k34;
mod k5;
mod k5x;
mod k6;

pub use combined::{build_combined, CombinedRow, System, HEADERS};
pub use groupkey::{Category, GroupStamps, MatchGroup};
pub use model::{BankRow, BankTable, BokfRow, BokfTable};
pub use pipeline::{reconcile, Reconciliation, RunSummary};
