//! Basic CLI E2E tests.
//!
//! Tests invoke the built CLI binary and verify outputs. HOME points to a
//! temporary directory so config files never touch the real one.

use std::process::Command;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(home: &std::path::Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_ooh-cli"))
        .args(args)
        .env("HOME", home)
        .env_remove("OOH_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_grid_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["grid", "list", "--from", "2026-01-01", "--count", "3", "--json"],
    );
    assert_eq!(code, 0, "grid list failed");
    let blocks: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0]["start"], "2025-12-29");
    assert_eq!(blocks[1]["start"], "2026-01-12");
}

#[test]
fn test_grid_next() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["grid", "next", "--from", "2026-01-13"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2026-01-26 .. 2026-02-08");
}

#[test]
fn test_period_validate_biweekly() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "period",
            "validate",
            "--biweekly",
            "2026-01-12_2026-01-25",
            "2026-01-26_2026-02-08",
        ],
    );
    assert_eq!(code, 0, "period validate failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["start"], "2026-01-12");
    assert_eq!(report["end"], "2026-02-08");
    assert_eq!(report["quantity"], 2);
}

#[test]
fn test_period_validate_rejects_mismatched_monthly_end() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["period", "validate", "--monthly", "2026-01-31", "--end", "2026-02-27"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_period_quantity_and_monthly_end() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["period", "quantity", "2026-01-12", "2026-02-08", "--type", "bissemanal"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2");

    let (code, stdout, _) = run_cli(
        home.path(),
        &["period", "monthly-end", "2026-01-31", "--months", "1"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2026-02-27");
}

#[test]
fn test_quote_proposal_file() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("proposta.json");
    std::fs::write(
        &file,
        r#"{
            "id": 1,
            "nome": "Campanha",
            "comissao": "V2",
            "itens": [{
                "id": 1,
                "id_ooh": 10,
                "periodo_inicio": "2026-01-12",
                "periodo_fim": "2026-01-25",
                "periodo_comercializado": "bissemanal",
                "valor_locacao": 1000,
                "valor_papel": 200,
                "valor_lona": 150,
                "fluxo_diario": 10000
            }]
        }"#,
    )
    .unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["quote", file.to_str().unwrap(), "--totals"]);
    assert_eq!(code, 0, "quote failed");
    let totals: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(totals["total_investimento"], 1687.5);
    assert_eq!(totals["total_impactos"], 140000);
}

const UNTIERED_PROPOSAL: &str = r#"{
    "id": 2,
    "nome": "Sem comissão",
    "itens": [{
        "id": 1,
        "id_ooh": 10,
        "periodo_inicio": "2026-01-12",
        "periodo_fim": "2026-01-25",
        "periodo_comercializado": "bissemanal",
        "valor_locacao": 1000,
        "valor_papel": 200,
        "valor_lona": 150,
        "fluxo_diario": 10000
    }]
}"#;

#[test]
fn test_quote_uses_configured_tier_when_file_has_none() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("proposta.json");
    std::fs::write(&file, UNTIERED_PROPOSAL).unwrap();

    let (code, _, _) = run_cli(home.path(), &["config", "set", "pricing.default_tier", "V3"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(home.path(), &["quote", file.to_str().unwrap(), "--totals"]);
    assert_eq!(code, 0, "quote failed");
    let totals: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // 1000 -> 1250 -> 1562.5 rental, plus 437.5 materials
    assert_eq!(totals["total_investimento"], 2000.0);
}

#[test]
fn test_quote_rejects_client_table_tier() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("proposta.json");
    std::fs::write(&file, UNTIERED_PROPOSAL).unwrap();

    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["quote", file.to_str().unwrap(), "--tier", "V0"],
    );
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("not a proposal tier"));

    let (code, _, _) = run_cli(home.path(), &["config", "set", "pricing.default_tier", "V0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_get_roundtrip() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "pricing.default_tier", "V3"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "pricing.default_tier"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "V3");
    assert!(home.path().join(".config/ooh-proposals/config.toml").exists());
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "get", "api.nope"]);
    assert_ne!(code, 0);
}
