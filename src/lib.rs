// casewriter: strategic case analysis
//
// This is the library root. Each module corresponds to a stage or a
// supporting subsystem of the extract → map → assemble → export pipeline.

pub mod assemble;
pub mod config;
pub mod export;
pub mod extract;
pub mod knowledge;
pub mod mapping;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod status;

#[cfg(feature = "web")]
pub mod web;
