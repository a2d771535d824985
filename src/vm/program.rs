use crate::compiler::SymbolTable;
use crate::vm::{Instruction, Register};

/// A compiled formula: its instructions plus the two registers used to
/// stream samples in and out.
///
/// Programs are immutable once built. A recompilation produces a new one
/// that replaces the old, it never edits it.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    input: Register,
    output: Register,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, input: Register, output: Register) -> Self {
        Self { instructions, input, output }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn input_register(&self) -> Register {
        self.input
    }

    pub fn output_register(&self) -> Register {
        self.output
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Size of the register file needed to run this program.
    pub fn register_count(&self) -> usize {
        register_count(&self.instructions)
            .max(self.input + 1)
            .max(self.output + 1)
    }

    pub fn into_parts(self) -> (Vec<Instruction>, Register, Register) {
        (self.instructions, self.input, self.output)
    }

    /// Numbered listing, one instruction per line.
    pub fn dump(&self, symbols: &SymbolTable) -> String {
        let mut res = String::new();
        for (i, instr) in self.instructions.iter().enumerate() {
            res.push_str(&format!("{:3}: {}\n", i, instr.describe(symbols)));
        }
        res
    }
}

/// `max(2, 1 + highest register referenced)`.
pub fn register_count(instructions: &[Instruction]) -> usize {
    instructions
        .iter()
        .map(|instr| instr.max_register() + 1)
        .max()
        .unwrap_or(0)
        .max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_count_has_a_floor_of_two() {
        assert_eq!(register_count(&[]), 2);
        assert_eq!(register_count(&[Instruction::Set(0, 1.0)]), 2);
        assert_eq!(
            register_count(&[Instruction::Set(2, 1.0), Instruction::Move(1, 6)]),
            7
        );
    }

    #[test]
    fn dump_lists_instructions() {
        let mut symbols = SymbolTable::new();
        let input = symbols.alloc_named("input");
        let output = symbols.alloc_named("output");
        let prog = Program::new(vec![Instruction::Move(output, input)], input, output);
        assert_eq!(prog.dump(&symbols), "  0: move output, input\n");
        assert_eq!(prog.register_count(), 2);
    }
}
