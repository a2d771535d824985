//! Turns formula source text into a [`Program`].
//!
//! The pipeline is tokenizer, then code generator, both sharing one
//! [`SymbolTable`] that lives for a single compilation. The streaming
//! registers are reserved before anything else so that `input` is always
//! register 0 and `output` register 1, whether the formula mentions them
//! or not.

use crate::vm::{Program, Register};

pub mod codegen;
pub mod symbol_table;
pub mod tokenizer;

mod compilation_error;
pub use compilation_error::{CompilationError, ErrorKind};

mod compilation_state;
pub use compilation_state::CompilationState;

pub use codegen::compile;
pub use symbol_table::SymbolTable;
pub use tokenizer::{Token, tokenize, tokens_to_string};

#[cfg(test)]
mod tests;

pub const INPUT_NAME: &str = "input";
pub const OUTPUT_NAME: &str = "output";

/// Everything produced by one successful compilation.
///
/// Only `program` is needed to run the formula. The symbol table and tokens
/// are kept for diagnostics.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: Program,
    pub symbols: SymbolTable,
    pub tokens: Vec<Token>,
    /// Register holding the value of the last statement.
    pub result: Register,
}

/// Symbol table with the streaming registers already bound.
pub fn seeded_symbols() -> SymbolTable {
    let mut symbols = SymbolTable::new();
    symbols.alloc_named(INPUT_NAME);
    symbols.alloc_named(OUTPUT_NAME);
    symbols
}

/// Compiles a formula from scratch.
pub fn compile_source(source: &str) -> Result<Compilation, CompilationError> {
    let mut symbols = seeded_symbols();
    let input = symbols.alloc_named(INPUT_NAME);
    let output = symbols.alloc_named(OUTPUT_NAME);

    let chars: Vec<char> = source.chars().collect();
    let tokens = tokenize(&mut symbols, &chars)?;
    let (instructions, result) = compile(&mut symbols, &tokens)?;

    Ok(Compilation {
        program: Program::new(instructions, input, output),
        symbols,
        tokens,
        result,
    })
}
