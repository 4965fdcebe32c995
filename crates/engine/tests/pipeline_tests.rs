// End-to-end cascade scenarios and the structural guarantees the combined
// output relies on: disjoint claims, balanced groups, dense per-category
// sequences, deterministic reruns.

use std::collections::BTreeSet;

use avstamning_engine::{build_combined, reconcile, BankTable, BokfTable, Category, System};
use chrono::NaiveDate;

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn bokf_row(
    bokf: &mut BokfTable,
    date: NaiveDate,
    cents: i64,
    category: &str,
    voucher: &str,
) -> u32 {
    bokf.push(Some(date), cents, category.into(), voucher.into(), String::new(), "Reskontra".into())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn reference_payment_matches_one_to_one() {
    let mut bank = BankTable::default();
    bank.push(Some(d(7, 15)), "35 1234567890".into(), -50_000);
    let mut bokf = BokfTable::default();
    bokf_row(&mut bokf, d(7, 15), -50_000, "Betalningar", "V001");

    let recon = reconcile(&bank, &bokf);

    assert_eq!(recon.groups.len(), 1);
    let group = &recon.groups[0];
    assert_eq!(group.category, Category::K3);
    assert_eq!(group.key, "K3-B0-000001");
    assert_eq!(group.bank_ids, vec![0]);
    assert_eq!(group.bokf_ids, vec![0]);
}

#[test]
fn bankgiro_day_drops_excess_posting() {
    let mut bank = BankTable::default();
    bank.push(Some(d(7, 10)), "BG53782751 dagsinsättning".into(), 100_000);
    let mut bokf = BokfTable::default();
    bokf_row(&mut bokf, d(7, 10), 70_000, "Inbetalningar", "V1");
    bokf_row(&mut bokf, d(7, 10), 30_000, "Inbetalningar", "V2");
    bokf_row(&mut bokf, d(7, 10), 5_000, "Inbetalningar", "V3");

    let recon = reconcile(&bank, &bokf);

    assert_eq!(recon.groups.len(), 1);
    assert_eq!(recon.groups[0].category, Category::K1);
    assert_eq!(recon.groups[0].bokf_ids, vec![0, 1]);

    // the 50.00 posting stays on the table for manual review
    let rows = build_combined(&bank, &bokf, &recon.stamps);
    let leftover = rows.iter().find(|r| r.row_id == 2 && r.system == System::Bokforing).unwrap();
    assert_eq!(leftover.group_key, "");
}

#[test]
fn global_balance_trims_posting_side_by_subset() {
    let mut bank = BankTable::default();
    bank.push(Some(d(7, 20)), "Insättning diverse".into(), 221_871);
    let mut bokf = BokfTable::default();
    bokf_row(&mut bokf, d(7, 20), 100_000, "Övrigt", "V1");
    bokf_row(&mut bokf, d(7, 20), -120_000, "Övrigt", "V2");
    bokf_row(&mut bokf, d(7, 20), -201_871, "Övrigt", "V3");
    bokf_row(&mut bokf, d(7, 20), 50_000, "Övrigt", "V4");
    bokf_row(&mut bokf, d(7, 20), 221_871, "Övrigt", "V5");
    bokf_row(&mut bokf, d(7, 20), -50_000, "Övrigt", "V6");

    let recon = reconcile(&bank, &bokf);

    let group = recon.groups.iter().find(|g| g.category == Category::K5x).unwrap();
    assert_eq!(group.bank_ids, vec![0]);
    let kept: i64 = group.bokf_ids.iter().map(|&id| bokf.row(id).amount_cents).sum();
    assert_eq!(kept, 221_871);
}

#[test]
fn cross_day_netting_spans_three_days() {
    let bank = BankTable::default();
    let mut bokf = BokfTable::default();
    bokf_row(&mut bokf, d(7, 1), 30_000, "Övrigt", "V1");
    bokf_row(&mut bokf, d(7, 2), -10_000, "Övrigt", "V2");
    bokf_row(&mut bokf, d(7, 3), -20_000, "Övrigt", "V3");

    let recon = reconcile(&bank, &bokf);

    assert_eq!(recon.groups.len(), 1);
    let group = &recon.groups[0];
    assert_eq!(group.category, Category::K6);
    assert_eq!(group.bokf_ids, vec![0, 1, 2]);
    assert_eq!(group.key, "K6-B0-000001");
}

#[test]
fn lonely_swish_row_is_manual() {
    let mut bank = BankTable::default();
    bank.push(Some(d(7, 18)), "Swish inbet".into(), 15_000);
    let bokf = BokfTable::default();

    let recon = reconcile(&bank, &bokf);
    assert!(recon.groups.is_empty());

    let rows = build_combined(&bank, &bokf, &recon.stamps);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ny_kalla, "Manuell");
    assert_eq!(rows[0].group_key, "");
    assert_eq!(rows[0].amount_cents, -15_000);
}

// ---------------------------------------------------------------------------
// A mixed fixture exercising most of the cascade at once
// ---------------------------------------------------------------------------

fn mixed_fixture() -> (BankTable, BokfTable) {
    let mut bank = BankTable::default();
    // K1 day
    bank.push(Some(d(7, 10)), "BG53782751 insättning".into(), 100_000);
    // K2 day
    bank.push(Some(d(7, 11)), "BG 5341-7689 kundinbet".into(), 80_000);
    // K3 row
    bank.push(Some(d(7, 12)), "351234567890 betalning".into(), -42_000);
    // K4 row
    bank.push(Some(d(7, 13)), "Hyra juli".into(), -120_000);
    // K5 day
    bank.push(Some(d(7, 14)), "LB-UTBETALNING".into(), -90_000);
    // K5X day (bank 500.00 vs postings 570.00, no single equal posting)
    bank.push(Some(d(7, 15)), "Dagens rörelse".into(), 50_000);
    // unmatched
    bank.push(Some(d(7, 18)), "Swish inbet".into(), 15_000);
    // K6 pair of days, bank side of the first
    bank.push(Some(d(7, 21)), "Justering".into(), -30_000);

    let mut bokf = BokfTable::default();
    bokf.push(Some(d(7, 10)), 70_000, "Inbetalningar".into(), "SEB-1".into(), String::new(), "Kund".into());
    bokf.push(Some(d(7, 10)), 30_000, "Inbetalningar".into(), "V2".into(), String::new(), "Kund".into());
    bokf.push(Some(d(7, 11)), 80_000, "065 BFO".into(), "9".into(), "Skabank250711".into(), "Kund".into());
    bokf.push(Some(d(7, 12)), -42_000, "Betalningar".into(), "V4".into(), String::new(), "Lev".into());
    bokf.push(Some(d(7, 13)), -120_000, "Övrigt".into(), "V5".into(), String::new(), "Övr".into());
    bokf.push(Some(d(7, 14)), -50_000, "Betalningar".into(), "V6".into(), String::new(), "Lev".into());
    bokf.push(Some(d(7, 14)), -40_000, "Betalningar".into(), "V7".into(), String::new(), "Lev".into());
    bokf.push(Some(d(7, 15)), 30_000, "Övrigt".into(), "V8".into(), String::new(), "Övr".into());
    bokf.push(Some(d(7, 15)), 20_000, "Övrigt".into(), "V9".into(), String::new(), "Övr".into());
    bokf.push(Some(d(7, 15)), 7_000, "Övrigt".into(), "V10".into(), String::new(), "Övr".into());
    bokf.push(Some(d(7, 22)), -30_000, "Övrigt".into(), "V11".into(), String::new(), "Övr".into());

    (bank, bokf)
}

#[test]
fn claims_are_disjoint() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);

    let mut bank_seen = BTreeSet::new();
    let mut bokf_seen = BTreeSet::new();
    for group in &recon.groups {
        for &id in &group.bank_ids {
            assert!(bank_seen.insert(id), "bank row {id} in two groups");
        }
        for &id in &group.bokf_ids {
            assert!(bokf_seen.insert(id), "bokf row {id} in two groups");
        }
    }
}

#[test]
fn category_groups_balance() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);
    assert!(!recon.groups.is_empty());

    for group in &recon.groups {
        let bank_sum: i64 = group.bank_ids.iter().map(|&id| bank.row(id).amount_cents).sum();
        let bokf_sum: i64 = group.bokf_ids.iter().map(|&id| bokf.row(id).amount_cents).sum();
        match group.category {
            Category::K5x | Category::K6 => {
                assert_eq!(bokf_sum - bank_sum, 0, "unbalanced {}", group.key);
            }
            _ => assert_eq!(bokf_sum, bank_sum, "unbalanced {}", group.key),
        }
    }
}

#[test]
fn full_cascade_lands_every_expected_category() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);

    let per_cat = &recon.summary.groups_per_category;
    assert_eq!(per_cat.get("K1"), Some(&1));
    assert_eq!(per_cat.get("K2"), Some(&1));
    assert_eq!(per_cat.get("K3"), Some(&1));
    assert_eq!(per_cat.get("K4"), Some(&1));
    assert_eq!(per_cat.get("K5"), Some(&1));
    assert_eq!(per_cat.get("K5X"), Some(&1));
    assert_eq!(per_cat.get("K6"), Some(&1));

    // the Swish row and the trimmed 70.00 posting stay unmatched
    assert_eq!(recon.summary.unmatched_bank, 1);
    assert_eq!(recon.summary.unmatched_bokf, 1);
}

#[test]
fn reruns_are_byte_identical() {
    let (bank, bokf) = mixed_fixture();
    let first = reconcile(&bank, &bokf);
    let second = reconcile(&bank, &bokf);

    let keys_a: Vec<&str> = first.groups.iter().map(|g| g.key.as_str()).collect();
    let keys_b: Vec<&str> = second.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys_a, keys_b);

    let rows_a = build_combined(&bank, &bokf, &first.stamps);
    let rows_b = build_combined(&bank, &bokf, &second.stamps);
    let flat_a: Vec<String> = rows_a.iter().map(|r| format!("{r:?}")).collect();
    let flat_b: Vec<String> = rows_b.iter().map(|r| format!("{r:?}")).collect();
    assert_eq!(flat_a, flat_b);
}

#[test]
fn group_keys_follow_the_grammar_with_dense_sequences() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);

    let pattern = regex::Regex::new(r"^K(?:[1-46]|5X?)-B\d+-\d{6}$").unwrap();
    for group in &recon.groups {
        assert!(pattern.is_match(&group.key), "bad key {}", group.key);
    }

    // per category, sequences must be 1..N without gaps
    let mut by_cat: std::collections::BTreeMap<Category, Vec<u32>> = Default::default();
    for group in &recon.groups {
        let seq: u32 = group.key.rsplit('-').next().unwrap().parse().unwrap();
        by_cat.entry(group.category).or_default().push(seq);
    }
    for (cat, mut seqs) in by_cat {
        seqs.sort_unstable();
        let expected: Vec<u32> = (1..=seqs.len() as u32).collect();
        assert_eq!(seqs, expected, "gapped sequence for {cat:?}");
    }
}

#[test]
fn combined_view_is_complete_and_tagged() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);
    let rows = build_combined(&bank, &bokf, &recon.stamps);

    assert_eq!(rows.len(), bank.rows.len() + bokf.rows.len());
    for row in &rows {
        if row.group_key.is_empty() {
            assert_ne!(row.ny_kalla, "Match");
            assert_eq!(row.match_category, "");
        } else {
            assert_eq!(row.ny_kalla, "Match");
        }
    }
}

#[test]
fn summary_serializes_for_reporting() {
    let (bank, bokf) = mixed_fixture();
    let recon = reconcile(&bank, &bokf);
    let json = serde_json::to_value(&recon.summary).unwrap();
    assert_eq!(json["bank_rows"], 8);
    assert_eq!(json["groups_per_category"]["K5X"], 1);
}

#[test]
fn earlier_categories_take_precedence() {
    // A row satisfying both the K3 pattern and a K4-style amount match must
    // be claimed by K3; the cascade never reassigns it.
    let mut bank = BankTable::default();
    bank.push(Some(d(7, 12)), "351234567890".into(), -42_000);
    let mut bokf = BokfTable::default();
    bokf_row(&mut bokf, d(7, 12), -42_000, "Betalningar", "V1");
    bokf_row(&mut bokf, d(7, 12), -42_000, "Övrigt", "V2");

    let recon = reconcile(&bank, &bokf);
    let claimed = recon.groups.iter().find(|g| g.bank_ids.contains(&0)).unwrap();
    assert_eq!(claimed.category, Category::K3);
    assert_eq!(claimed.bokf_ids, vec![0]);
}
