// Shell-contract tests: exit codes and produced files, driven through the
// real binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

fn avstam() -> Command {
    Command::new(env!("CARGO_BIN_EXE_avstam"))
}

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn bank_fixture(dir: &Path) -> PathBuf {
    write_fixture(
        dir,
        "bank.csv",
        "Kontoutdrag\n\n\nKonto 1234\nBokföringsdatum;Text;Belopp\n\
         2025-07-15;35 1234567890;-500,00\n",
    )
}

fn bokf_fixture(dir: &Path) -> PathBuf {
    let mut banner = String::from("Huvudbok\n");
    for _ in 0..16 {
        banner.push('\n');
    }
    write_fixture(
        dir,
        "bokf.csv",
        &format!(
            "{banner}Datum;IB Året SEK;Period SEK;Text1;Verifikationsnummer;Kategori;Källa\n\
             2025-07-15;;-500,00;betalning;V001;Betalningar;Lev\n"
        ),
    )
}

#[test]
fn run_writes_workbook_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("resultat.xlsx");

    let status = avstam()
        .args(["run"])
        .arg(bank_fixture(dir.path()))
        .arg(bokf_fixture(dir.path()))
        .arg("-o")
        .arg(&out)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(0));
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn run_json_prints_summary_object() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("resultat.xlsx");

    let output = avstam()
        .args(["run"])
        .arg(bank_fixture(dir.path()))
        .arg(bokf_fixture(dir.path()))
        .arg("-o")
        .arg(&out)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["summary"]["bank_rows"], 1);
    assert_eq!(parsed["summary"]["groups_per_category"]["K3"], 1);
}

#[test]
fn missing_input_exits_with_ingest_code() {
    let dir = tempfile::tempdir().unwrap();
    let status = avstam()
        .args(["run", "saknas.csv", "saknas2.csv", "-o"])
        .arg(dir.path().join("out.xlsx"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(3));
}

#[test]
fn malformed_header_exits_with_ingest_code() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_fixture(dir.path(), "bad.csv", "bara en rad\n");

    let status = avstam()
        .arg("run")
        .arg(&bad)
        .arg(bokf_fixture(dir.path()))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(3));
}

#[test]
fn check_validates_without_writing() {
    let dir = tempfile::tempdir().unwrap();

    let output = avstam()
        .args(["check"])
        .arg(bank_fixture(dir.path()))
        .arg(bokf_fixture(dir.path()))
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["bank"]["rows_kept"], 1);
    assert_eq!(parsed["bokf"]["rows_kept"], 1);
    // nothing but the fixtures in the directory
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2);
}

#[test]
fn usage_error_exits_two() {
    let status = avstam().arg("run").status().unwrap();
    assert_eq!(status.code(), Some(2));
}
