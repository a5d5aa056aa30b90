//! The dispute engine state machine.

mod state;
pub use state::{CycleOutcome, CycleReport, EngineState};

mod core;
pub use core::DisputeEngine;
