pub mod assembler;
pub mod decision;
pub mod runner;

pub use runner::{BatchRunner, RunStatus, RunSummary};
