//! Recursive code generation from a token list.
//!
//! There is no syntax tree: each token range is split at its loosest
//! binding top-level operator, both sides are compiled recursively and the
//! operator is emitted last. Runs of the same operator are compiled in one
//! loop rather than one level per operand. Code is only ever appended.

use crate::compiler::{CompilationError, ErrorKind, SymbolTable, Token};
use crate::vm::{Instruction, Register};

/// The only function the language knows.
pub const SIN_FUNCTION: &str = "sin";

/// Deepest nesting of groups, calls and chained assignments accepted.
pub const MAX_NESTING: usize = 256;

/// Compiles `tokens` into instructions, allocating temporaries in
/// `symbols`. Also returns the register holding the value of the last
/// statement.
pub fn compile(
    symbols: &mut SymbolTable,
    tokens: &[Token],
) -> Result<(Vec<Instruction>, Register), CompilationError> {
    let mut codegen = CodeGenerator {
        symbols,
        tokens,
        code: Vec::new(),
        depth: 0,
    };
    let result = codegen.compile_range(0, tokens.len())?;
    Ok((codegen.code, result))
}

struct CodeGenerator<'a> {
    symbols: &'a mut SymbolTable,
    tokens: &'a [Token],
    code: Vec<Instruction>,
    depth: usize,
}

impl CodeGenerator<'_> {
    /// Compiles `tokens[begin..begin + size]`.
    fn compile_range(
        &mut self,
        begin: usize,
        size: usize,
    ) -> Result<Register, CompilationError> {
        if self.depth >= MAX_NESTING {
            return Err(CompilationError::new(ErrorKind::TooDeep, begin, begin + size));
        }
        self.depth += 1;
        let result = self.compile_split(begin, begin + size);
        self.depth -= 1;
        result
    }

    fn compile_split(&mut self, begin: usize, end: usize) -> Result<Register, CompilationError> {
        match end - begin {
            0 => {
                return Err(CompilationError::new(ErrorKind::EmptyExpression, begin, end));
            }
            1 => return self.compile_operand(begin),
            _ => {}
        }

        let Some(split) = self.split_point(begin, end)? else {
            return Err(CompilationError::new(ErrorKind::MissingOperator, begin, end));
        };

        match self.tokens[split] {
            Token::Semicolon | Token::Plus | Token::Mul => self.compile_chain(begin, split, end),
            Token::Equals => {
                let target = match &self.tokens[begin..split] {
                    [Token::Variable(reg)] => *reg,
                    _ => {
                        return Err(CompilationError::new(
                            ErrorKind::InvalidAssignment,
                            begin,
                            split + 1,
                        ));
                    }
                };
                let value = self.compile_range(split + 1, end - split - 1)?;
                self.code.push(Instruction::Move(target, value));
                Ok(target)
            }
            Token::LeftParen => self.compile_group(begin, split, end),
            token => Err(CompilationError::new(
                ErrorKind::UnexpectedToken(token.to_string()),
                split,
                split + 1,
            )),
        }
    }

    /// `a op b op c ...` for one of `;`, `+` or `*`, folded from the left:
    /// each operand accumulates into the register of the first one. A
    /// sequence is worth its last statement.
    fn compile_chain(
        &mut self,
        begin: usize,
        first: usize,
        end: usize,
    ) -> Result<Register, CompilationError> {
        let op = self.tokens[first];
        let mut acc = self.compile_range(begin, first - begin)?;
        let mut start = first + 1;
        loop {
            let stop = self.next_top_level(op, start, end);
            let operand = self.compile_range(start, stop - start)?;
            match op {
                Token::Plus => self.code.push(Instruction::Add(acc, operand)),
                Token::Mul => self.code.push(Instruction::Mul(acc, operand)),
                _ => acc = operand,
            }
            if stop == end {
                return Ok(acc);
            }
            start = stop + 1;
        }
    }

    /// Position of the next `op` outside parentheses in `start..end`, or
    /// `end` if there is none.
    fn next_top_level(&self, op: Token, start: usize, end: usize) -> usize {
        let mut depth = 0usize;
        for pos in start..end {
            match self.tokens[pos] {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                token if depth == 0 && token == op => return pos,
                _ => {}
            }
        }
        end
    }

    /// A single number or variable, copied into a fresh register so that
    /// later in-place arithmetic never clobbers a named one.
    fn compile_operand(&mut self, pos: usize) -> Result<Register, CompilationError> {
        match self.tokens[pos] {
            Token::Number(value) => {
                let reg = self.symbols.alloc();
                self.code.push(Instruction::Set(reg, value));
                Ok(reg)
            }
            Token::Variable(var) => {
                let reg = self.symbols.alloc();
                self.code.push(Instruction::Move(reg, var));
                Ok(reg)
            }
            token => Err(CompilationError::new(
                ErrorKind::UnexpectedToken(token.to_string()),
                pos,
                pos + 1,
            )),
        }
    }

    /// Finds the operator to split `begin..end` at: the top-level one with
    /// the highest rank, leftmost on ties. Closing parentheses are never
    /// candidates.
    fn split_point(&self, begin: usize, end: usize) -> Result<Option<usize>, CompilationError> {
        let mut depth = 0usize;
        let mut last_open = begin;
        let mut best: Option<(usize, u8)> = None;

        for pos in begin..end {
            let token = self.tokens[pos];
            if token == Token::RightParen {
                if depth == 0 {
                    return Err(CompilationError::new(ErrorKind::UnmatchedParen, pos, pos + 1));
                }
                depth -= 1;
                continue;
            }
            if depth == 0 {
                if let Some(rank) = token.precedence() {
                    if best.is_none_or(|(_, best_rank)| rank > best_rank) {
                        best = Some((pos, rank));
                    }
                }
            }
            if token == Token::LeftParen {
                if depth == 0 {
                    last_open = pos;
                }
                depth += 1;
            }
        }

        if depth != 0 {
            return Err(CompilationError::new(ErrorKind::UnmatchedParen, last_open, end));
        }
        Ok(best.map(|(pos, _)| pos))
    }

    /// Index of the `)` closing the `(` at `open`. The range has already
    /// been checked for balance.
    fn matching_paren(&self, open: usize, end: usize) -> Result<usize, CompilationError> {
        let mut depth = 0usize;
        for pos in open..end {
            match self.tokens[pos] {
                Token::LeftParen => depth += 1,
                Token::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(pos);
                    }
                }
                _ => {}
            }
        }
        Err(CompilationError::new(ErrorKind::UnmatchedParen, open, end))
    }

    /// A parenthesised group that is the only top-level construct left:
    /// either plain grouping `( ... )` or a call `sin( ... )`.
    fn compile_group(
        &mut self,
        begin: usize,
        open: usize,
        end: usize,
    ) -> Result<Register, CompilationError> {
        let close = self.matching_paren(open, end)?;
        if close != end - 1 {
            return Err(CompilationError::new(ErrorKind::MissingOperator, close + 1, end));
        }
        let inner_size = close - open - 1;

        if open == begin {
            return self.compile_range(open + 1, inner_size);
        }

        match &self.tokens[begin..open] {
            [Token::Variable(reg)] => {
                let name = self.symbols.name(*reg);
                if name != SIN_FUNCTION {
                    let kind = ErrorKind::UnknownFunction(name);
                    return Err(CompilationError::new(kind, begin, end));
                }
                let arg = self.compile_range(open + 1, inner_size)?;
                self.code.push(Instruction::Sin(arg));
                Ok(arg)
            }
            _ => Err(CompilationError::new(ErrorKind::MissingOperator, begin, open + 1)),
        }
    }
}
