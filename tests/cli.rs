use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TRANSACTIONS: &str = "\
data_transacao;valor;agencia_id;cliente_id;status
01/02/2024;100,00;7;1;Aprovada
05/02/2024;;7;2;Negada
10/03/2024 14:00;50;8;1;OK
11/03/2024 09:30;25;9;3;aprovada
";

const BRANCHES: &str = "agencia_id,nome\n7,Centro\n8,Norte\n10,Centro\n";
const CLIENTS: &str = "cod_cliente,nome\n1,Ana\n2,Bruno\n";

fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("transacoes.csv"), TRANSACTIONS).unwrap();
    std::fs::write(dir.path().join("agencias.csv"), BRANCHES).unwrap();
    std::fs::write(dir.path().join("clientes.csv"), CLIENTS).unwrap();
    dir
}

/// Runs against an isolated HOME so no real settings file is read or written.
fn banvic(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("banvic").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn summary_prints_kpis() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["summary", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 175.00"))
        .stdout(predicate::str::contains("75.0%"))
        .stdout(predicate::str::contains("2024-02"))
        .stdout(predicate::str::contains("Centro"));
}

#[test]
fn summary_with_branch_filter() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["summary", "--branch", "Norte", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Branch:  Norte"))
        .stdout(predicate::str::contains("R$ 50.00"));
}

#[test]
fn empty_selection_reports_no_data() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["summary", "--from", "01/01/2020", "--to", "31/01/2020", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("N/A"))
        .stdout(predicate::str::contains("No data in the selected period."));
}

#[test]
fn missing_transactions_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    let empty = tempfile::tempdir().unwrap();
    banvic(home.path())
        .args(["summary", "--data-dir"])
        .arg(empty.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("transacoes.csv"));
}

#[test]
fn invalid_date_flag_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["branches", "--from", "yesterday", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("yesterday"));
}

#[test]
fn branches_shows_leader_and_laggard() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["branches", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Most active:"))
        .stdout(predicate::str::contains("Least active:"));
}

#[test]
fn clients_writes_csv() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    let out = data.path().join("clients.csv");
    banvic(home.path())
        .args(["clients", "--data-dir"])
        .arg(data.path())
        .arg("--csv")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana"));

    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("rank,client,transactions,volume,average"));
    assert_eq!(lines.next(), Some("1,Ana,2,150.0,75.0"));
}

#[test]
fn trends_runs_every_section() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["trends", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Even vs Odd Months"))
        .stdout(predicate::str::contains("Amount Distribution"));
}

#[test]
fn inspect_shows_mapping() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["inspect", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("data_transacao"))
        .stdout(predicate::str::contains("agencia_id"))
        .stdout(predicate::str::contains("Rows:          4"))
        .stdout(predicate::str::contains(
            "Headers:       data_transacao, valor, agencia_id, cliente_id, status",
        ));
}

#[test]
fn use_persists_data_dir() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .arg("use")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Using"));

    let settings = home.path().join(".config").join("banvic").join("settings.json");
    assert!(settings.exists());

    // Later commands pick the directory up without --data-dir.
    banvic(home.path())
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 175.00"));
}

#[test]
fn use_rejects_dir_without_transactions() {
    let home = tempfile::tempdir().unwrap();
    let empty = tempfile::tempdir().unwrap();
    banvic(home.path())
        .arg("use")
        .arg(empty.path())
        .assert()
        .failure();
}

#[cfg(feature = "pdf")]
#[test]
fn export_writes_pdf() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    let out = data.path().join("report.pdf");
    banvic(home.path())
        .args(["export", "--data-dir"])
        .arg(data.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[cfg(feature = "pdf")]
#[test]
fn export_default_path_uses_period() {
    let home = tempfile::tempdir().unwrap();
    let data = data_dir();
    banvic(home.path())
        .args(["export", "--from", "01/02/2024", "--to", "29/02/2024", "--data-dir"])
        .arg(data.path())
        .assert()
        .success();

    let expected = data
        .path()
        .join("exports")
        .join("report-01-02-2024_29-02-2024.pdf");
    assert!(expected.exists());
}
