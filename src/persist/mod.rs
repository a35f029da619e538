//! Where the final parameters go once training ends.

pub mod json;
pub mod squares;

use crate::error::Result;
use crate::math::params::Parameters;

pub use json::JsonSnapshot;
pub use squares::{weight_squares, IdxWeightSquares, PngWeightSquares};

/// Receives the final parameters exactly once, after training.
pub trait ParameterSink {
    fn save(&mut self, parameters: &Parameters) -> Result<()>;
}

/// Forwards one save to several sinks, stopping at the first error.
#[derive(Default)]
pub struct SinkFanout {
    sinks: Vec<Box<dyn ParameterSink>>,
}

impl SinkFanout {
    pub fn new() -> SinkFanout {
        SinkFanout::default()
    }

    pub fn with(mut self, sink: impl ParameterSink + 'static) -> SinkFanout {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ParameterSink for SinkFanout {
    fn save(&mut self, parameters: &Parameters) -> Result<()> {
        for sink in &mut self.sinks {
            sink.save(parameters)?;
        }
        Ok(())
    }
}

/// Keeps the last saved parameters in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub saved: Vec<Parameters>,
}

impl ParameterSink for MemorySink {
    fn save(&mut self, parameters: &Parameters) -> Result<()> {
        self.saved.push(parameters.clone());
        Ok(())
    }
}
