use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{JobError, JobResult};

/// included parameter file schema: a flat object of scalar values
static PARAMS_SCHEMA: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/params.json"));

pub fn load_schema() -> JobResult<JSONSchema> {
    let schema_json = read_schema()?;
    compile_schema(&schema_json)
}

fn read_schema() -> JobResult<Value> {
    serde_json::from_str(PARAMS_SCHEMA).map_err(|err| schema_error(err.to_string()))
}

fn compile_schema(schema: &Value) -> JobResult<JSONSchema> {
    JSONSchema::options()
        .compile(schema)
        .map_err(|err| schema_error(err.to_string()))
}

fn schema_error(reason: String) -> JobError {
    JobError::Config { origin: "parameter schema".to_string(), reason }
}
