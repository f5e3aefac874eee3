//! Tokens and a tokenizer for the symbolic format.

use logos::{Lexer, Logos};

use std::fmt;

use crate::instruction::Register;

/// Enumeration of all tokens of the symbolic format.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Errorneous token that could not be interpreted as any of the other variants.
    #[error]
    #[regex(r"[ \t\f\r]+", logos::skip)]
    #[regex(r"[;#][^\n]*", logos::skip)]
    Error,

    /// End of a statement.
    #[token("\n")]
    Newline,

    /// A register. `R0`-`R7` or `SP`.
    #[regex("[Rr][0-7]|[Ss][Pp]", |lex| lex.slice().parse())]
    Register(Register),

    /// A mnemonic, a directive or a label. Begins with a letter or an underscore and can contain
    /// the characters `A-Za-z0-9_`.
    #[regex("[A-Za-z_][A-Za-z0-9_]*", Lexer::slice)]
    Symbol(&'a str),

    /// An unsigned number literal in decimal, hexadecimal (`0x`) or binary (`0b`).
    #[regex("[0-9]+", |lex| lex.slice().parse())]
    #[regex("0[xX][0-9a-fA-F]+", |lex| radix_callback(lex, 16))]
    #[regex("0[bB][01]+", |lex| radix_callback(lex, 2))]
    Literal(u32),

    /// Token (`,`) that is used to separate operands of a single instruction.
    #[token(",")]
    ParameterSeparator,

    /// Token (`:`) that ends a label definition.
    #[token(":")]
    LabelEnd,
}

fn radix_callback<'a>(
    lex: &mut Lexer<'a, Token<'a>>,
    radix: u32,
) -> std::result::Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(&lex.slice()[2..], radix)
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Error => write!(f, "<error>"),
            Token::Newline => write!(f, "<newline>"),
            Token::Register(reg) => write!(f, "{}", reg),
            Token::Symbol(symbol) => write!(f, "{}", symbol),
            Token::Literal(num) => write!(f, "{}", num),
            Token::ParameterSeparator => write!(f, ","),
            Token::LabelEnd => write!(f, ":"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_instruction_tokens() {
        assert_eq!(tokens("loop: LDI R0, 0x1F ; comment\n"), vec![
            Token::Symbol("loop"),
            Token::LabelEnd,
            Token::Symbol("LDI"),
            Token::Register(Register::R0),
            Token::ParameterSeparator,
            Token::Literal(31),
            Token::Newline,
        ]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(tokens("12 0b1010 0XfF"), vec![
            Token::Literal(12),
            Token::Literal(10),
            Token::Literal(255),
        ]);
    }

    #[test]
    fn test_registers_and_symbols() {
        assert_eq!(tokens("sp r7 R8 spin # hash comment"), vec![
            Token::Register(Register::R7),
            Token::Register(Register::R7),
            Token::Symbol("R8"),
            Token::Symbol("spin"),
        ]);
    }

    #[test]
    fn test_error_token() {
        assert_eq!(tokens("PRN $"), vec![Token::Symbol("PRN"), Token::Error]);
    }
}
