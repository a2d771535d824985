use crate::compiler::SymbolTable;
use crate::vm::{Instruction, Register, program::register_count};

/// Register machine running one program against its own register file.
///
/// Registers survive between executions, which is what lets formulas keep
/// state (running sums, feedback) from one sample and one block to the
/// next. Installing a program resets them all to zero.
#[derive(Debug, Clone)]
pub struct Cpu {
    program: Vec<Instruction>,
    registers: Vec<f64>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            program: Vec::new(),
            registers: vec![0.0; register_count(&[])],
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the program and starts over from a zeroed register file
    /// sized for it.
    pub fn set_program(&mut self, program: Vec<Instruction>) {
        let count = register_count(&program);
        self.program = program;
        self.registers.clear();
        self.registers.resize(count, 0.0);
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    pub fn registers(&self) -> &[f64] {
        &self.registers
    }

    pub fn register(&self, reg: Register) -> f64 {
        self.registers[reg]
    }

    /// Runs every instruction once, in order.
    pub fn execute(&mut self) {
        let registers = &mut self.registers[..];
        for instr in &self.program {
            instr.exec(registers);
        }
    }

    /// Runs the whole program once per sample: `input[i]` is written to
    /// `src`, the program runs, and `dst` is read back into `output[i]`.
    /// The block is `output.len()` samples long. Samples past the end of a
    /// shorter `input` are not computed and come out as silence.
    ///
    /// This is the audio thread entry point, it must stay free of
    /// allocations, locks and logging.
    pub fn execute_1_1_block(
        &mut self,
        src: Register,
        dst: Register,
        input: &[f32],
        output: &mut [f32],
    ) {
        debug_assert!(src < self.registers.len(), "input register {src} out of range");
        debug_assert!(dst < self.registers.len(), "output register {dst} out of range");
        let n = input.len().min(output.len());
        let registers = &mut self.registers[..];
        for (sample_in, sample_out) in input[..n].iter().zip(output[..n].iter_mut()) {
            registers[src] = *sample_in as f64;
            for instr in &self.program {
                instr.exec(registers);
            }
            *sample_out = registers[dst] as f32;
        }
        output[n..].fill(0.0);
    }

    /// One `name = value` line per register.
    pub fn dump_registers(&self, symbols: &SymbolTable) -> String {
        let mut res = String::new();
        for (reg, value) in self.registers.iter().enumerate() {
            res.push_str(&format!("{} = {}\n", symbols.name(reg), value));
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cpu_outputs_silence() {
        let mut cpu = Cpu::new();
        let input = [0.5f32, 1.0, -1.0];
        let mut output = [9.0f32; 3];
        cpu.execute_1_1_block(0, 1, &input, &mut output);
        assert_eq!(output, [0.0; 3]);
        assert_eq!(cpu.registers().len(), 2);
    }

    #[test]
    fn set_program_sizes_and_zeroes_registers() {
        let mut cpu = Cpu::new();
        cpu.set_program(vec![Instruction::Set(4, 1.0), Instruction::Add(3, 4)]);
        assert_eq!(cpu.registers(), &[0.0; 5]);
        cpu.execute();
        cpu.execute();
        assert_eq!(cpu.register(3), 2.0);

        cpu.set_program(vec![Instruction::Set(4, 1.0), Instruction::Add(3, 4)]);
        assert_eq!(cpu.register(3), 0.0);
    }

    #[test]
    fn block_execution_streams_through_registers() {
        // output = input * 2
        let mut cpu = Cpu::new();
        cpu.set_program(vec![
            Instruction::Move(2, 0),
            Instruction::Set(3, 2.0),
            Instruction::Mul(2, 3),
            Instruction::Move(1, 2),
        ]);
        let input = [1.0f32, 2.0, 3.0];
        let mut output = [0.0f32; 3];
        cpu.execute_1_1_block(0, 1, &input, &mut output);
        assert_eq!(output, [2.0, 4.0, 6.0]);
    }

    #[test]
    fn short_input_leaves_silence() {
        // output = 5
        let mut cpu = Cpu::new();
        cpu.set_program(vec![Instruction::Set(2, 5.0), Instruction::Move(1, 2)]);
        let mut output = [9.0f32; 4];
        cpu.execute_1_1_block(0, 1, &[1.0, 1.0], &mut output);
        assert_eq!(output, [5.0, 5.0, 0.0, 0.0]);

        let mut output = [9.0f32; 2];
        cpu.execute_1_1_block(0, 1, &[1.0; 8], &mut output);
        assert_eq!(output, [5.0, 5.0]);
    }

    #[test]
    fn dump_registers_uses_names() {
        let mut symbols = SymbolTable::new();
        symbols.alloc_named("input");
        symbols.alloc_named("output");
        let mut cpu = Cpu::new();
        cpu.set_program(vec![Instruction::Set(1, 3.0)]);
        cpu.execute();
        assert_eq!(cpu.dump_registers(&symbols), "input = 0\noutput = 3\n");
    }
}
