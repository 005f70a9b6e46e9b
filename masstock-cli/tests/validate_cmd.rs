use assert_cmd::Command;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    std::io::Write::write_all(&mut f, contents.as_bytes()).expect("write");
    f
}

fn masstock() -> Command {
    let mut cmd = Command::cargo_bin("masstock").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

const CATALOG: &str = r#"
workflows:
  - id: product-shots
    client_id: client_a
    status: deployed
    input_schema:
      fields:
        - name: prompt
          type: string
          required: true
  - id: banners
    client_id: client_a
    status: draft
"#;

#[test]
fn validate_accepts_catalog() {
    let f = write_temp(CATALOG);
    let out = masstock()
        .args(["validate", f.path().to_string_lossy().as_ref()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.contains("2 workflow(s)"), "{stdout}");
}

#[test]
fn validate_reports_catalog_violations() {
    let doc = r#"
workflows:
  - id: dup
    client_id: client_a
    status: deployed
  - id: dup
    client_id: client_a
    status: deployed
    timeout_seconds: 0
"#;
    let f = write_temp(doc);
    let out = masstock()
        .args(["validate", f.path().to_string_lossy().as_ref()])
        .assert()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(out).unwrap();
    assert!(stderr.contains("workflows[1].id"), "{stderr}");
    assert!(stderr.contains("workflows[1].timeout_seconds"), "{stderr}");
}

#[test]
fn validate_rejects_unparseable_document() {
    let f = write_temp("invalid: yaml: content");
    masstock()
        .args(["validate", f.path().to_string_lossy().as_ref()])
        .assert()
        .code(2);
}

#[test]
fn validate_missing_file_is_runtime_error() {
    masstock()
        .args(["validate", "/nonexistent/catalog.yaml"])
        .assert()
        .code(4);
}

#[test]
fn validate_checks_input_against_workflow_schema() {
    let f = write_temp(CATALOG);
    let path = f.path().to_string_lossy().to_string();

    masstock()
        .args([
            "validate",
            &path,
            "--workflow",
            "product-shots",
            "--input",
            r#"{"prompt": "red sneakers"}"#,
        ])
        .assert()
        .success();

    let out = masstock()
        .args([
            "validate",
            &path,
            "--workflow",
            "product-shots",
            "--input",
            r#"{"prompt": 7}"#,
            "--format",
            "json",
        ])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let result: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(result["valid"], false);
    assert!(result["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("input_data.prompt"));
}
