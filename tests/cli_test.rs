mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn gateway(base: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("boleto-gateway"));
    cmd.arg("--base-dir")
        .arg(base)
        .arg("--scratch-dir")
        .arg(base.join("scratch"))
        .arg("--output-dir")
        .arg(base.join("out"));
    cmd
}

#[test]
fn test_cli_boleto_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::workspace();
    let request = dir.path().join("request.json");
    let titles = vec![common::title(1, "12345678900"), common::title(2, "98765432100")];
    std::fs::write(
        &request,
        serde_json::to_string(&common::request_json("pdf", "1", titles))?,
    )?;

    gateway(dir.path())
        .arg("--simulate")
        .arg("boleto")
        .arg(&request)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""success":true"#))
        .stdout(predicate::str::contains(r#""pdf":"JVBERi0xLjQK"#));

    assert!(common::scratch_files(dir.path()).is_empty());
    Ok(())
}

#[test]
fn test_cli_missing_logo_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::workspace();
    let request = dir.path().join("request.json");
    let titles = vec![common::title(1, "12345678900")];
    std::fs::write(
        &request,
        serde_json::to_string(&common::request_json("pdf", "341", titles))?,
    )?;

    gateway(dir.path())
        .arg("--simulate")
        .arg("boleto")
        .arg(&request)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""success":false"#))
        .stdout(predicate::str::contains("341.png"));
    Ok(())
}

#[test]
fn test_cli_malformed_request_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = common::workspace();
    let request = dir.path().join("request.json");
    std::fs::write(&request, r#"{ "operacao": "pdf", "banco": "#)?;

    gateway(dir.path())
        .arg("--simulate")
        .arg("boleto")
        .arg(&request)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
    Ok(())
}

#[test]
fn test_cli_info() {
    let dir = common::workspace();

    gateway(dir.path())
        .arg("--simulate")
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name":"ACBrLibBoleto""#));
}

#[test]
fn test_cli_export_config() {
    let dir = common::workspace();

    gateway(dir.path())
        .arg("--simulate")
        .arg("export-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[BoletoCedenteConfig]"));
}

#[test]
fn test_cli_unknown_cep_fails() {
    let dir = common::workspace();

    gateway(dir.path())
        .arg("--simulate")
        .arg("cep")
        .arg("01310100")
        .assert()
        .failure()
        .stdout(predicate::str::contains("CEP não encontrado: 01310100"));
}

#[cfg(not(feature = "native"))]
#[test]
fn test_native_fallback_warning() {
    let dir = common::workspace();

    gateway(dir.path())
        .arg("info")
        .assert()
        .success()
        .stderr(predicate::str::contains("WARNING: native engine requested, but the 'native' feature is not enabled. Falling back to the scripted engine."));
}

#[test]
fn test_cli_simulate_has_no_fallback_warning() {
    let dir = common::workspace();

    gateway(dir.path())
        .arg("--simulate")
        .arg("info")
        .assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
