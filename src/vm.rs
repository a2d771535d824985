//! The register machine formulas compile to.

pub mod cpu;
pub mod instruction;
pub mod program;

pub use cpu::Cpu;
pub use instruction::{Instruction, RwRegisters};
pub use program::Program;

/// Index into a register file of `f64` cells.
pub type Register = usize;
