mod common;

use std::process::{Command, Output};

use common::SchemaTree;

fn schema_gc(tree: &SchemaTree, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-gc"))
        .args(args)
        .current_dir(tree.root())
        .env_remove("RUST_LOG")
        .env_remove("SCHEMA_GC_BASE_DIR")
        .env_remove("SCHEMA_GC_EXTENSIONS")
        .env_remove("SCHEMA_GC_EXCLUDE")
        .env_remove("SCHEMA_GC_DRY_RUN")
        .env_remove("SCHEMA_GC_FORMAT")
        .env_remove("SCHEMA_GC_VERBOSE")
        .env_remove("SCHEMA_GC_QUIET")
        .output()
        .expect("Failed to execute schema-gc")
}

fn service_tree() -> SchemaTree {
    let tree = SchemaTree::new();
    tree.wsdl("service.wsdl", &[&[("import", "types.xsd")]]);
    tree.schema("types.xsd", &[("include", "common.xsd")]);
    tree.schema("common.xsd", &[]);
    tree.schema("legacy.xsd", &[]);
    tree
}

#[test]
fn test_cli_help_output() {
    let tree = SchemaTree::new();
    let output = schema_gc(&tree, &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--prune"));
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--base-dir"));
    assert!(stdout.contains("--exclude"));
    assert!(stdout.contains("--format"));
}

#[test]
fn test_cli_missing_root_error() {
    let tree = SchemaTree::new();
    let output = schema_gc(&tree, &["nowhere.wsdl"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Root document does not exist"));
}

#[test]
fn test_cli_dry_run_requires_prune() {
    let tree = service_tree();
    let output = schema_gc(&tree, &["--dry-run", "service.wsdl"]);

    assert!(!output.status.success());
}

#[test]
fn test_cli_report_lists_schemas() {
    let tree = service_tree();
    let output = schema_gc(&tree, &["service.wsdl"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let types = tree.canonical("types.xsd");
    let legacy = tree.canonical("legacy.xsd");
    assert!(stdout.contains(&format!("referenced    {}", types.display())));
    assert!(stdout.contains(&format!("unreferenced  {}", legacy.display())));
    assert!(stdout.contains("Referenced schemas: 2"));
    assert!(tree.path("legacy.xsd").exists());
}

#[test]
fn test_cli_prune_dry_run() {
    let tree = service_tree();
    let output = schema_gc(&tree, &["--prune", "--dry-run", "service.wsdl"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("would delete"));
    assert!(tree.path("legacy.xsd").exists());
}

#[test]
fn test_cli_prune_deletes_unreferenced() {
    let tree = service_tree();
    let output = schema_gc(&tree, &["--prune", "service.wsdl"]);

    assert!(output.status.success());
    assert!(!tree.path("legacy.xsd").exists());
    assert!(tree.path("types.xsd").exists());
    assert!(tree.path("common.xsd").exists());
}

#[test]
fn test_cli_json_output() {
    let tree = service_tree();
    let output = schema_gc(&tree, &["--format", "json", "service.wsdl"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcome"], "complete");
    assert_eq!(value["inventory_size"], 3);
    assert_eq!(value["unreferenced"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_broken_root_exits_with_failure() {
    let tree = service_tree();
    tree.raw("service.wsdl", "<wsdl:definitions");
    let output = schema_gc(&tree, &["--prune", "service.wsdl"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(tree.path("legacy.xsd").exists());
}

#[test]
fn test_cli_degraded_prune_is_refused() {
    let tree = service_tree();
    tree.raw("types.xsd", "<xs:schema");
    let output = schema_gc(&tree, &["--prune", "service.wsdl"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("--force"));
    assert!(tree.path("common.xsd").exists());
}

#[test]
fn test_cli_config_file_is_applied() {
    let tree = service_tree();
    tree.raw(
        "schema-gc.toml",
        "[inventory]\nexclude_patterns = [\"legacy.xsd\"]\n",
    );
    let output = schema_gc(&tree, &["--prune", "service.wsdl"]);

    assert!(output.status.success());
    assert!(tree.path("legacy.xsd").exists());
}

#[test]
fn test_cli_config_file_does_not_enable_prune() {
    let tree = service_tree();
    tree.raw("schema-gc.toml", "[prune]\nenabled = true\n");
    let output = schema_gc(&tree, &["service.wsdl"]);

    assert!(output.status.success());
    assert!(tree.path("legacy.xsd").exists());
}
