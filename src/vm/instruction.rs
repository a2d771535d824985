use crate::compiler::SymbolTable;
use crate::vm::Register;

/// One operation of the register machine.
///
/// `Add` and `Mul` accumulate in place (`dst = dst op src`) and `Sin`
/// overwrites its operand. Instructions never allocate registers, they
/// only refer to the ones the compiler assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Set(Register, f64),
    Move(Register, Register),
    Add(Register, Register),
    Mul(Register, Register),
    Sin(Register),
}

/// Register operands of an instruction, split by access.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RwRegisters {
    pub read: [Option<Register>; 2],
    pub write: [Option<Register>; 2],
}

impl RwRegisters {
    pub fn iter(&self) -> impl Iterator<Item = Register> + '_ {
        self.read.iter().chain(self.write.iter()).flatten().copied()
    }
}

impl Instruction {
    #[inline]
    pub fn exec(&self, registers: &mut [f64]) {
        match *self {
            Instruction::Set(dst, value) => registers[dst] = value,
            Instruction::Move(dst, src) => registers[dst] = registers[src],
            Instruction::Add(dst, src) => registers[dst] += registers[src],
            Instruction::Mul(dst, src) => registers[dst] *= registers[src],
            Instruction::Sin(reg) => registers[reg] = registers[reg].sin(),
        }
    }

    pub fn rw_registers(&self) -> RwRegisters {
        match *self {
            Instruction::Set(dst, _) => RwRegisters {
                read: [None, None],
                write: [Some(dst), None],
            },
            Instruction::Move(dst, src) => RwRegisters {
                read: [Some(src), None],
                write: [Some(dst), None],
            },
            Instruction::Add(dst, src) | Instruction::Mul(dst, src) => RwRegisters {
                read: [Some(dst), Some(src)],
                write: [Some(dst), None],
            },
            Instruction::Sin(reg) => RwRegisters {
                read: [Some(reg), None],
                write: [Some(reg), None],
            },
        }
    }

    /// Highest register this instruction touches.
    pub fn max_register(&self) -> Register {
        self.rw_registers().iter().max().unwrap_or(0)
    }

    /// Assembly-like listing with registers shown by name.
    pub fn describe(&self, symbols: &SymbolTable) -> String {
        match *self {
            Instruction::Set(dst, value) => format!("set {}, {}", symbols.name(dst), value),
            Instruction::Move(dst, src) => {
                format!("move {}, {}", symbols.name(dst), symbols.name(src))
            }
            Instruction::Add(dst, src) => {
                format!("add {}, {}", symbols.name(dst), symbols.name(src))
            }
            Instruction::Mul(dst, src) => {
                format!("mul {}, {}", symbols.name(dst), symbols.name(src))
            }
            Instruction::Sin(reg) => format!("sin {}", symbols.name(reg)),
        }
    }
}
