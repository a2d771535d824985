use std::collections::HashMap;

use crate::vm::Register;

/// Name to register bookkeeping for a single compilation.
///
/// Registers are handed out from a monotonic counter. Named registers are
/// remembered so that asking twice for the same name yields the same
/// register, anonymous ones are always fresh. Nothing is ever removed: the
/// table only grows until the compilation it belongs to is discarded.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    registers: HashMap<String, Register>,
    /// Reverse index, `names[r]` is the name bound to register `r` if any
    names: Vec<Option<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a brand new anonymous register.
    pub fn alloc(&mut self) -> Register {
        let reg = self.names.len();
        self.names.push(None);
        reg
    }

    /// Returns the register bound to `name`, allocating it on first use.
    pub fn alloc_named(&mut self, name: &str) -> Register {
        if let Some(reg) = self.registers.get(name) {
            return *reg;
        }
        let reg = self.names.len();
        self.names.push(Some(name.to_owned()));
        self.registers.insert(name.to_owned(), reg);
        reg
    }

    /// Looks up a name without allocating.
    pub fn lookup(&self, name: &str) -> Option<Register> {
        self.registers.get(name).copied()
    }

    /// Name bound to `reg`, or a placeholder such as `R07` for temporaries.
    pub fn name(&self, reg: Register) -> String {
        match self.names.get(reg) {
            Some(Some(name)) => name.clone(),
            _ => format!("R{:02}", reg),
        }
    }

    /// Number of registers handed out so far, named or not.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
