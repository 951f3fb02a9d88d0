//! Report generation and export.

pub mod generator;
pub mod sink;

pub use generator::*;
pub use sink::*;
