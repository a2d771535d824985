use std::fmt;

use crate::compiler::{CompilationError, ErrorKind, SymbolTable};
use crate::vm::Register;

/// A classified lexical unit of a formula.
///
/// Identifiers are resolved to registers while scanning, so the compiler
/// never sees names again except through the symbol table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Plus,
    Mul,
    Equals,
    Semicolon,
    LeftParen,
    RightParen,
    Number(f64),
    Variable(Register),
}

impl Token {
    fn from_symbol(c: char) -> Option<Token> {
        match c {
            '+' => Some(Token::Plus),
            '*' => Some(Token::Mul),
            '=' => Some(Token::Equals),
            ';' => Some(Token::Semicolon),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        }
    }

    /// Rank used to pick split points: the highest rank binds loosest and
    /// is split first. Operands have no rank.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Token::LeftParen | Token::RightParen => Some(1),
            Token::Mul => Some(2),
            Token::Plus => Some(3),
            Token::Equals => Some(4),
            Token::Semicolon => Some(5),
            Token::Number(_) | Token::Variable(_) => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.precedence().is_some()
    }

    /// Like `Display`, but with variables shown by name.
    pub fn describe(&self, symbols: &SymbolTable) -> String {
        match self {
            Token::Variable(reg) => symbols.name(*reg),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Plus => write!(f, "+"),
            Token::Mul => write!(f, "*"),
            Token::Equals => write!(f, "="),
            Token::Semicolon => write!(f, ";"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Number(value) => write!(f, "{}", value),
            Token::Variable(reg) => write!(f, "R{:02}", reg),
        }
    }
}

/// Space separated dump of a token list.
pub fn tokens_to_string(tokens: &[Token], symbols: &SymbolTable) -> String {
    tokens
        .iter()
        .map(|token| token.describe(symbols))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Neutral,
    Number,
    Variable,
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Splits `source` into tokens, allocating a register in `symbols` for
/// every identifier met.
///
/// On error, identifiers scanned before the faulty character stay allocated
/// in `symbols`; callers throw the whole table away anyway.
pub fn tokenize(
    symbols: &mut SymbolTable,
    source: &[char],
) -> Result<Vec<Token>, CompilationError> {
    let mut tokens = Vec::new();
    let mut state = ScanState::Neutral;
    let mut buffer = String::new();
    let mut start = 0;

    // The trailing newline flushes whatever number or name is pending
    for (pos, &c) in source.iter().chain(['\n'].iter()).enumerate() {
        match state {
            ScanState::Number if is_number_char(c) => {
                buffer.push(c);
                continue;
            }
            ScanState::Number => {
                let value = buffer.parse::<f64>().map_err(|_| {
                    CompilationError::new(ErrorKind::MalformedNumber(buffer.clone()), start, pos)
                })?;
                tokens.push(Token::Number(value));
                buffer.clear();
                state = ScanState::Neutral;
            }
            ScanState::Variable if c.is_ascii_alphanumeric() => {
                buffer.push(c);
                continue;
            }
            ScanState::Variable => {
                tokens.push(Token::Variable(symbols.alloc_named(&buffer)));
                buffer.clear();
                state = ScanState::Neutral;
            }
            ScanState::Neutral => {}
        }

        // Neutral state, the current character has not been consumed yet
        if is_number_char(c) {
            state = ScanState::Number;
            start = pos;
            buffer.push(c);
        } else if c.is_ascii_alphabetic() {
            state = ScanState::Variable;
            start = pos;
            buffer.push(c);
        } else if c.is_whitespace() {
            continue;
        } else if let Some(token) = Token::from_symbol(c) {
            tokens.push(token);
        } else {
            return Err(CompilationError::new(
                ErrorKind::UnknownCharacter(c),
                pos,
                pos + 1,
            ));
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(symbols: &mut SymbolTable, text: &str) -> Result<Vec<Token>, CompilationError> {
        let chars: Vec<char> = text.chars().collect();
        tokenize(symbols, &chars)
    }

    #[test]
    fn test_basic_tokenize() {
        let mut symbols = SymbolTable::new();
        let tokens = scan(&mut symbols, "output = sin(input*2)").unwrap();
        let output = symbols.lookup("output").unwrap();
        let sin = symbols.lookup("sin").unwrap();
        let input = symbols.lookup("input").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Variable(output),
                Token::Equals,
                Token::Variable(sin),
                Token::LeftParen,
                Token::Variable(input),
                Token::Mul,
                Token::Number(2.0),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_last_token_is_flushed() {
        let mut symbols = SymbolTable::new();
        assert_eq!(scan(&mut symbols, "1.5").unwrap(), vec![Token::Number(1.5)]);
        let tokens = scan(&mut symbols, "abc").unwrap();
        assert_eq!(tokens, vec![Token::Variable(symbols.lookup("abc").unwrap())]);
    }

    #[test]
    fn test_operators_need_no_spaces() {
        let mut symbols = SymbolTable::new();
        let tokens = scan(&mut symbols, "a=1;b=(a+2)*3").unwrap();
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[3], Token::Semicolon);
        assert_eq!(tokens[6], Token::LeftParen);
    }

    #[test]
    fn test_number_then_name() {
        let mut symbols = SymbolTable::new();
        let tokens = scan(&mut symbols, "2x").unwrap();
        assert_eq!(tokens, vec![Token::Number(2.0), Token::Variable(0)]);
        assert_eq!(symbols.name(0), "x");
    }

    #[test]
    fn test_names_may_contain_digits() {
        let mut symbols = SymbolTable::new();
        let tokens = scan(&mut symbols, "x1 + x2 + x1").unwrap();
        assert_eq!(tokens[0], tokens[4]);
        assert_ne!(tokens[0], tokens[2]);
    }

    #[test]
    fn test_existing_bindings_are_reused() {
        let mut symbols = SymbolTable::new();
        symbols.alloc_named("input");
        symbols.alloc_named("output");
        let tokens = scan(&mut symbols, "output = input").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Variable(1), Token::Equals, Token::Variable(0)]
        );
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_unknown_character() {
        let mut symbols = SymbolTable::new();
        let err = scan(&mut symbols, "output = input # 2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownCharacter('#'));
        assert_eq!(err.to_string(), "can't interpret '#'");
        assert_eq!((err.from, err.to), (15, 16));
        // names seen before the failure stay allocated
        assert!(symbols.lookup("input").is_some());
    }

    #[test]
    fn test_underscore_is_not_a_name_character() {
        let mut symbols = SymbolTable::new();
        let err = scan(&mut symbols, "my_var").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownCharacter('_'));
    }

    #[test]
    fn test_malformed_number() {
        let mut symbols = SymbolTable::new();
        let err = scan(&mut symbols, "a = 1.2.3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedNumber("1.2.3".to_owned()));
        assert_eq!((err.from, err.to), (4, 9));
        assert!(scan(&mut symbols, ". + 1").is_err());
    }

    #[test]
    fn test_token_dump() {
        let mut symbols = SymbolTable::new();
        let tokens = scan(&mut symbols, "acc = acc + 0.5").unwrap();
        assert_eq!(tokens_to_string(&tokens, &symbols), "acc = acc + 0.5");
    }
}
