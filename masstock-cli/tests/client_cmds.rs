use assert_cmd::Command;

fn masstock() -> Command {
    let mut cmd = Command::cargo_bin("masstock").unwrap();
    cmd.env("RUST_LOG", "off")
        .env_remove("MASSTOCK_CLIENT_ID")
        .env_remove("MASSTOCK_API_URL")
        .env_remove("MASSTOCK_API_TOKEN");
    cmd
}

#[test]
fn execute_requires_client_id() {
    let out = masstock()
        .args(["execute", "product-shots", "--input", r#"{"prompt": "x"}"#])
        .assert()
        .code(4)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(out).unwrap().contains("missing client id"));
}

#[test]
fn execute_rejects_malformed_input_before_calling_api() {
    masstock()
        .args([
            "execute",
            "product-shots",
            "--client-id",
            "client_a",
            "--input",
            "{not json",
        ])
        .assert()
        .code(2);
}

#[test]
fn status_rejects_malformed_execution_id() {
    masstock()
        .args(["status", "not-a-uuid", "--client-id", "client_a"])
        .assert()
        .code(4);
}

#[test]
fn unreachable_api_is_runtime_error() {
    masstock()
        .args([
            "status",
            "5f0c6d1e-8a43-4b7e-9a51-2f1d3c4b5a69",
            "--client-id",
            "client_a",
            "--api-url",
            "http://127.0.0.1:9",
            "--request-timeout-secs",
            "2",
        ])
        .assert()
        .code(4);
}

#[test]
fn events_requires_database_url() {
    let out = masstock()
        .env_remove("MASSTOCK_DATABASE_URL")
        .env_remove("DATABASE_URL")
        .args(["events", "5f0c6d1e-8a43-4b7e-9a51-2f1d3c4b5a69"])
        .assert()
        .code(4)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(out).unwrap().contains("missing database url"));
}
