//! A tiny formula language for synthesis graph nodes.
//!
//! Formulas such as `output = sin(input * 2)` are compiled into a flat
//! register machine program which is then run once per audio sample.

pub mod compiler;
pub mod config;
pub mod evaluator;
pub mod logger;
pub mod vm;

pub use compiler::{CompilationError, CompilationState, compile_source};
pub use evaluator::{Evaluator, Voice};
pub use logger::{LogMessage, Severity};
pub use vm::{Cpu, Instruction, Program};
