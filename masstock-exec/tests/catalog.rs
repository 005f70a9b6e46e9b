use std::io::Write;

use masstock_exec::{CatalogLoadError, StaticCatalog, WorkflowCatalog};

#[test]
fn loads_catalog_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "workflows": [ {{ "id": "w1", "client_id": "c1", "status": "deployed" }} ] }}"#
    )
    .unwrap();

    let catalog = StaticCatalog::from_path(file.path()).unwrap();
    assert_eq!(catalog.len(), 1);
    let wf = catalog.get("w1").unwrap();
    assert!(wf.is_deployed());
    assert!(catalog.get("w2").is_none());
}

#[test]
fn invalid_catalog_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "workflows:\n  - id: 'bad id'\n    client_id: c1\n    status: deployed"
    )
    .unwrap();
    let err = StaticCatalog::from_path(file.path()).unwrap_err();
    assert!(matches!(err, CatalogLoadError::Catalog(_)));
}

#[test]
fn missing_file_reports_path() {
    let err = StaticCatalog::from_path("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}
