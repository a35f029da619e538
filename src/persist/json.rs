use std::path::PathBuf;

use crate::error::Result;
use crate::math::params::Parameters;
use crate::persist::ParameterSink;

/// Writes the full parameters as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    pub path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> JsonSnapshot {
        JsonSnapshot { path: path.into() }
    }
}

impl ParameterSink for JsonSnapshot {
    fn save(&mut self, parameters: &Parameters) -> Result<()> {
        parameters.save_json(&self.path)?;
        log::info!("saved parameters to {}", self.path.display());
        Ok(())
    }
}
