//! Helpers for loading the frozen wire contracts under `contracts/`.

use std::path::PathBuf;

use jsonschema::JSONSchema;
use serde_json::Value;

/// Absolute path of a file under the workspace `contracts/` directory.
pub fn contract_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../contracts")
        .join(relative)
}

/// Reads a contract file as raw text.
pub fn load_raw(relative: &str) -> String {
    let path = contract_path(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("{} should be readable: {error}", path.display()))
}

/// Reads a contract file as JSON.
pub fn load_json(relative: &str) -> Value {
    serde_json::from_str(&load_raw(relative)).expect("contract file should be valid json")
}

/// Compiles `<name>.schema.json`.
pub fn compile_validator(name: &str) -> JSONSchema {
    let schema = load_json(&format!("{name}.schema.json"));
    JSONSchema::compile(&schema).expect("schema should compile")
}
