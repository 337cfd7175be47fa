//! Job orchestration: drives a dubbing request end to end through the
//! transcript, translation, synthesis, and media stages.

pub mod artifacts;
pub mod driver;
pub mod job;

pub use driver::{DriverOutput, SynthesisDriver};
pub use job::{DubEngine, DubOutcome, DubRequest, EngineConfig, JobRegistry};
