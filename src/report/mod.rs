//! Report assembly and rendering.

pub mod assembler;
pub mod generator;

pub use assembler::assemble;
pub use generator::{generate_json_report, generate_summary};
