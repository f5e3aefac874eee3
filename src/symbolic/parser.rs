use std::iter::Peekable;

use edit_distance::edit_distance;
use logos::{Logos, SpannedIter};

use crate::instruction::{OpCode, OperandKind};
use crate::parsing::{Error, ErrorExt, ErrorKind, Span};
use super::program::{Operand, Program, Statement, StatementEntry};
use super::token::Token;

pub type ParseError = Error<&'static str>;

/// Mnemonic of the directive that emits a single data byte.
pub const DATA_DIRECTIVE: &str = "DB";

/// Suggestions further away than this are not worth showing.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Parser for the symbolic format.
///
/// Every line consists of any number of label definitions (`name:`) followed by an optional
/// instruction or directive. Operands are separated by commas.
pub(crate) struct Parser<'a> {
    tokens: Peekable<SpannedIter<'a, Token<'a>>>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            tokens: Token::lexer(source).spanned().peekable(),
        }
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();

        while self.tokens.peek().is_some() {
            self.parse_line(&mut program.statements)?;
        }

        Ok(program)
    }

    fn parse_line(&mut self, statements: &mut Vec<StatementEntry>) -> Result<(), ParseError> {
        loop {
            match self.tokens.next() {
                None | Some((Token::Newline, _)) => return Ok(()),
                Some((Token::Symbol(symbol), span)) => {
                    if let Some(end) = self.next_label_end() {
                        statements.push(StatementEntry {
                            statement: Statement::Label(symbol.to_string()),
                            span: span.start..end.end,
                        });

                        continue;
                    }

                    let entry = self.parse_statement(symbol, span).context("statement")?;
                    statements.push(entry);

                    return self.end_of_line();
                }
                Some((_, span)) => {
                    return Err(Error::new(span, "expected a label, an instruction or a directive"));
                }
            }
        }
    }

    fn next_label_end(&mut self) -> Option<Span> {
        match self.tokens.peek() {
            Some((Token::LabelEnd, _)) => self.tokens.next().map(|(_, span)| span),
            _ => None,
        }
    }

    fn end_of_line(&mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            None | Some((Token::Newline, _)) => Ok(()),
            Some((_, span)) => Err(Error::new(span, "expected the end of the line")),
        }
    }

    fn parse_statement(&mut self, mnemonic: &str, span: Span) -> Result<StatementEntry, ParseError> {
        if mnemonic.eq_ignore_ascii_case(DATA_DIRECTIVE) {
            return self.parse_data(span);
        }

        let opcode = match OpCode::from_mnemonic(mnemonic) {
            Some(opcode) => opcode,
            None => {
                let kind = ErrorKind::UnknownMnemonic {
                    span,
                    mnemonic: mnemonic.to_string(),
                    suggestion: suggest_mnemonic(mnemonic),
                };

                return Err(Error::with_kind(kind, "instruction"));
            }
        };

        let operands = self.parse_operands().context("instruction")?;
        let span = statement_span(&span, &operands);
        let expected = opcode.operands();

        if operands.len() != expected.len() {
            let kind = ErrorKind::OperandCount {
                span,
                expected: expected.len(),
                found: operands.len(),
            };

            return Err(Error::with_kind(kind, "instruction"));
        }

        for ((operand, operand_span), kind) in operands.iter().zip(expected) {
            if operand.kind() != *kind {
                let kind = ErrorKind::InvalidOperand {
                    span: operand_span.clone(),
                    expected: *kind,
                };

                return Err(Error::with_kind(kind, "instruction"));
            }
        }

        Ok(StatementEntry {
            statement: Statement::Instruction { opcode, operands },
            span,
        })
    }

    fn parse_data(&mut self, span: Span) -> Result<StatementEntry, ParseError> {
        let mut operands = self.parse_operands().context("directive")?;
        let span = statement_span(&span, &operands);
        let found = operands.len();

        match operands.pop() {
            Some((Operand::Register(_), operand_span)) if found == 1 => {
                let kind = ErrorKind::InvalidOperand {
                    span: operand_span,
                    expected: OperandKind::Immediate,
                };

                Err(Error::with_kind(kind, "directive"))
            }
            Some((operand, _)) if found == 1 => Ok(StatementEntry {
                statement: Statement::Data(operand),
                span,
            }),
            _ => {
                let kind = ErrorKind::OperandCount { span, expected: 1, found };
                Err(Error::with_kind(kind, "directive"))
            }
        }
    }

    fn parse_operands(&mut self) -> Result<Vec<(Operand, Span)>, ParseError> {
        let mut operands = Vec::new();

        if let None | Some((Token::Newline, _)) = self.tokens.peek() {
            return Ok(operands);
        }

        loop {
            operands.push(self.parse_operand().context("operand")?);

            match self.tokens.peek() {
                Some((Token::ParameterSeparator, _)) => {
                    self.tokens.next();
                }
                _ => return Ok(operands),
            }
        }
    }

    fn parse_operand(&mut self) -> Result<(Operand, Span), ParseError> {
        match self.tokens.next() {
            Some((Token::Register(register), span)) => Ok((Operand::Register(register), span)),
            Some((Token::Literal(value), span)) => {
                if value > u8::MAX as u32 {
                    return Err(Error::with_kind(ErrorKind::LiteralOutOfRange { span }, "literal"));
                }

                Ok((Operand::Literal(value as u8), span))
            }
            Some((Token::Symbol(label), span)) => Ok((Operand::Label(label.to_string()), span)),
            Some((_, span)) => Err(Error::new(span, "expected a register, a literal or a label")),
            None => Err(Error::eos("expected a register, a literal or a label")),
        }
    }
}

fn statement_span(mnemonic: &Span, operands: &[(Operand, Span)]) -> Span {
    let end = operands.last()
        .map(|(_, span)| span.end)
        .unwrap_or(mnemonic.end);

    mnemonic.start..end
}

/// Finds the known mnemonic closest to `mnemonic`.
fn suggest_mnemonic(mnemonic: &str) -> Option<&'static str> {
    let mnemonic = mnemonic.to_ascii_uppercase();

    OpCode::ALL.iter()
        .map(OpCode::mnemonic)
        .chain(std::iter::once(DATA_DIRECTIVE))
        .map(|candidate| (edit_distance(&mnemonic, candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}
