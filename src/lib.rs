pub mod anneal;
pub mod boulder;
pub mod catalog;
pub mod design;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod params;
pub mod reconcile;
pub mod resolve;
pub mod results;
pub mod sequence;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use anneal::{Candidate, MatchRecord, Strand, anneal};
pub use catalog::ParameterCatalog;
pub use design::{Design, DesignOptions, DesignOutcome, DesignState};
pub use engine::{DesignEngine, EngineError, EngineOutput, Primer3Core};
pub use error::{DesignError, Result};
pub use gradient::RelaxationGradient;
pub use params::{ParamValue, ParameterSet};
pub use resolve::Side;
pub use results::{DesignResults, PairResult, PrimerResult};
