//! YAML job files.
//!
//! A job file holds the same PascalCase keys the library parameter
//! dictionaries accept. Interleave jobs may also list their inputs under
//! `DataSource`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::{Mapping, Value};

use bitsamp::structs::params::{InterleaveParams, ResampleParams};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResampleJob {
    pub params: ResampleParams,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct InterleaveJob {
    #[serde(rename = "DataSource", default, skip_serializing_if = "Vec::is_empty")]
    pub data_source: Vec<PathBuf>,

    #[serde(flatten)]
    pub params: InterleaveParams,
}

// `DataSource` is split off, the remaining keys must all be parameters.
impl<'de> Deserialize<'de> for InterleaveJob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut map = Mapping::deserialize(deserializer)?;

        let data_source = match map.remove("DataSource") {
            Some(list) => serde_yaml_ng::from_value(list).map_err(de::Error::custom)?,
            None => Vec::new(),
        };
        let params =
            serde_yaml_ng::from_value(Value::Mapping(map)).map_err(de::Error::custom)?;

        Ok(Self {
            data_source,
            params,
        })
    }
}

/// Reads a job file, or the defaults when none is given.
pub fn load<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }

    serde_yaml_ng::from_str(&text)
        .with_context(|| format!("Invalid job file {}", path.display()))
}

/// Logs the effective parameters at debug level.
pub fn log_effective<T: Serialize>(what: &str, job: &T) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    match serde_yaml_ng::to_string(job) {
        Ok(yaml) => log::debug!("Effective {what} parameters:\n{}", yaml.trim_end()),
        Err(e) => log::debug!("Effective {what} parameters unavailable: {e}"),
    }
}
