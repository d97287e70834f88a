//! Validates contract fixtures and serialized client types against frozen
//! JSON schemas.

use jsonschema::JSONSchema;
use selfsnap_contract::{
    CreateSnapshotsRequest, extract_error_message, parse_login_initiation, parse_snapshot_summary,
};
use selfsnap_core::SubmissionForm;
use serde_json::Value;

const CONTRACTS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts");

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(name: &str) -> JSONSchema {
    let schema = load_json(&format!("{CONTRACTS_DIR}/{name}.schema.json"));
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn fixture(name: &str) -> Value {
    load_json(&format!("{CONTRACTS_DIR}/fixtures/{name}.valid.json"))
}

#[test]
fn request_fixture_matches_schema() {
    let validator = compile_validator("create-snapshots-request");
    assert!(
        validator.is_valid(&fixture("create-snapshots-request")),
        "request fixture should validate against schema"
    );
}

#[test]
fn serialized_form_request_matches_schema() {
    let validator = compile_validator("create-snapshots-request");
    let mut form = SubmissionForm::new();
    form.set_host_file_ref("prod_vms.txt");
    form.set_change_number("CHG0031337");
    form.set_ttl_duration_days(3);

    let bytes = CreateSnapshotsRequest::from_form(&form)
        .to_json_bytes()
        .expect("request should encode");
    let value: Value = serde_json::from_slice(&bytes).expect("request should be json");

    assert!(
        validator.is_valid(&value),
        "serialized request should validate against schema"
    );
}

#[test]
fn request_schema_rejects_zero_ttl_and_extra_fields() {
    let validator = compile_validator("create-snapshots-request");
    let zero_ttl = serde_json::json!({
        "host_file": "prod_vms.txt",
        "chg_number": "CHG0031337",
        "ttl_duration": 0
    });
    let extra = serde_json::json!({
        "host_file": "prod_vms.txt",
        "chg_number": "CHG0031337",
        "ttl_duration": 7,
        "file_contents": "vm-01"
    });

    assert!(!validator.is_valid(&zero_ttl));
    assert!(!validator.is_valid(&extra));
}

#[test]
fn summary_fixture_matches_schema_and_parser() {
    let validator = compile_validator("create-snapshots-response");
    let value = fixture("create-snapshots-response");
    assert!(validator.is_valid(&value));

    let bytes = serde_json::to_vec(&value).expect("fixture should encode");
    let summary = parse_snapshot_summary(&bytes).expect("fixture should parse");
    assert_eq!(summary.total_vms, 10);
    assert_eq!(summary.successful_snapshots, 8);
    assert_eq!(summary.failed_snapshots, 2);
}

#[test]
fn login_fixture_matches_schema_and_parser() {
    let validator = compile_validator("azure-login-response");
    let value = fixture("azure-login-response");
    assert!(validator.is_valid(&value));

    let bytes = serde_json::to_vec(&value).expect("fixture should encode");
    let login = parse_login_initiation(&bytes).expect("fixture should parse");
    assert_eq!(login.user_code, "GHJ7KL2");
}

#[test]
fn error_fixture_matches_schema_and_extractor() {
    let validator = compile_validator("error-response");
    let value = fixture("error-response");
    assert!(validator.is_valid(&value));

    let bytes = serde_json::to_vec(&value).expect("fixture should encode");
    assert_eq!(
        extract_error_message(&bytes).as_deref(),
        Some("Change number CHG0031337 is not approved")
    );
}
