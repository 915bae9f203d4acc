use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::error::{JobError, JobResult};
use crate::params::schema::load_schema;
use crate::params::set::ParameterSet;

/// A JSON file of template parameters, e.g. `{"wall_time_hrs": 4, "nodes": 2}`
pub struct ParamsFile {
    pub path: PathBuf,
    pub compiled_schema: JSONSchema,
}

impl ParamsFile {
    pub fn new(path: &Path) -> JobResult<ParamsFile> {
        Ok(ParamsFile { path: path.to_path_buf(), compiled_schema: load_schema()? })
    }

    pub fn read(&self) -> JobResult<ParameterSet> {
        let json: Value = self.parse_untyped_json()?;

        match self.validate(&json) {
            Ok(_) => {
                info!("Parameter file is valid");
                self.parse_json(json)
            }
            Err(err) => {
                warn!("Parameter file fails validation");
                Err(err)
            }
        }
    }

    fn validate(&self, json: &Value) -> JobResult<()> {
        info!("Validating parameter file against JSON schema");
        self.compiled_schema.validate(json).map_err(|errors| {
            let reasons: Vec<String> = errors.map(|err| err.to_string()).collect();
            self.error(reasons.join("; "))
        })
    }

    fn read_file(&self) -> JobResult<String> {
        let path: &Path = self.path.as_path();
        info!("Reading parameters at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read parameter file at path {}: {}", path.display(), err);
            self.error(err.to_string())
        })
    }

    fn parse_json(&self, value: Value) -> JobResult<ParameterSet> {
        info!("Deserialising valid JSON into a parameter set");
        serde_json::from_value::<ParameterSet>(value).map_err(|err| self.error(err.to_string()))
    }

    fn parse_untyped_json(&self) -> JobResult<Value> {
        let json_string = self.read_file()?;
        serde_json::from_str::<Value>(&json_string).map_err(|err| self.error(err.to_string()))
    }

    fn error(&self, reason: String) -> JobError {
        JobError::Config { origin: format!("parameter file {}", self.path.display()), reason }
    }
}
