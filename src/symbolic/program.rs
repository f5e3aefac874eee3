use std::collections::HashMap;
use std::fmt;

use slog::{o, trace, Discard, Logger};

use crate::bytecode;
use crate::emulator::MEMORY_SIZE;
use crate::instruction::{Instruction, OpCode, OperandKind, Register};
use crate::parsing::{Error, ErrorKind, Span};
use super::parser::{ParseError, Parser};

/// An operand as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register(Register),
    Literal(u8),
    /// A reference to a label. Resolves to the address of the label.
    Label(String),
}

impl Operand {
    pub(crate) fn kind(&self) -> OperandKind {
        match self {
            Operand::Register(_) => OperandKind::Register,
            Operand::Literal(_) | Operand::Label(_) => OperandKind::Immediate,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Label(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Defines a label at the address of the next instruction or data byte.
    Label(String),

    /// An instruction. The operand kinds have been checked against the opcode.
    Instruction {
        opcode: OpCode,
        operands: Vec<(Operand, Span)>,
    },

    /// A raw data byte. (`DB`)
    Data(Operand),
}

impl Statement {
    /// Number of bytes the statement occupies in memory.
    pub fn size(&self) -> usize {
        match self {
            Statement::Label(_) => 0,
            Statement::Instruction { opcode, .. } => opcode.encoding().length() as usize,
            Statement::Data(_) => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatementEntry {
    pub statement: Statement,
    pub span: Span,
}

/// A parsed symbolic assembly program.
#[derive(Debug, Default, Clone)]
pub struct Program {
    pub statements: Vec<StatementEntry>,
}

impl Program {
    /// Parses symbolic assembly.
    ///
    /// ```
    /// let program = ls8::symbolic::Program::parse("LDI R0, 8\nPRN R0\nHLT\n").unwrap();
    /// let bytecode = program.compile().unwrap();
    ///
    /// assert_eq!(bytecode.words(), &[0b1000_0010, 0, 8, 0b0100_0111, 0, 1]);
    /// ```
    pub fn parse(source: &str) -> Result<Program, ParseError> {
        Parser::new(source).parse()
    }

    /// Resolves the labels and encodes the program into a [bytecode program](bytecode::Program).
    pub fn compile(&self) -> Result<bytecode::Program, ParseError> {
        self.compile_with_logger(None)
    }

    pub fn compile_with_logger<L>(&self, logger: L) -> Result<bytecode::Program, ParseError>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "assembly"));

        let labels = self.label_addresses()?;

        let size = self.statements.iter().map(|entry| entry.statement.size()).sum::<usize>();

        if size > MEMORY_SIZE {
            return Err(Error::with_kind(ErrorKind::ProgramTooLarge { size }, "program"));
        }

        let resolve = |operand: &Operand, span: &Span| -> Result<u8, ParseError> {
            match operand {
                Operand::Register(reg) => Ok(reg.index() as u8),
                Operand::Literal(value) => Ok(*value),
                Operand::Label(label) => {
                    let address = labels.get(label.as_str()).ok_or_else(|| {
                        Error::with_kind(
                            ErrorKind::UnknownLabel { span: span.clone(), label: label.clone() },
                            "operand",
                        )
                    })?;

                    if *address >= MEMORY_SIZE {
                        return Err(Error::with_kind(
                            ErrorKind::LiteralOutOfRange { span: span.clone() },
                            "operand",
                        ));
                    }

                    Ok(*address as u8)
                }
            }
        };

        let mut words = Vec::with_capacity(size);

        for entry in &self.statements {
            let address = words.len();

            match entry.statement {
                Statement::Label(ref label) => {
                    trace!(logger, "label"; "label" => label, "address" => address);
                }
                Statement::Instruction { opcode, ref operands } => {
                    let mut bytes = [0; 2];

                    for (i, (operand, span)) in operands.iter().enumerate() {
                        bytes[i] = resolve(operand, span)?;
                    }

                    let ins = Instruction::new(opcode, bytes);
                    trace!(logger, "emit instruction"; "address" => address, "instruction" => %ins);

                    words.extend(ins.to_bytes());
                }
                Statement::Data(ref operand) => {
                    let value = resolve(operand, &entry.span)?;
                    trace!(logger, "emit data"; "address" => address, "value" => value);

                    words.push(value);
                }
            }
        }

        bytecode::Program::from_words(words)
            .map_err(|_| Error::with_kind(ErrorKind::ProgramTooLarge { size }, "program"))
    }

    /// Computes the address of every label.
    fn label_addresses(&self) -> Result<HashMap<&str, usize>, ParseError> {
        let mut labels = HashMap::new();
        let mut address = 0;

        for entry in &self.statements {
            if let Statement::Label(ref label) = entry.statement {
                if labels.insert(label.as_str(), address).is_some() {
                    return Err(Error::with_kind(
                        ErrorKind::DuplicateLabel { span: entry.span.clone(), label: label.clone() },
                        "label",
                    ));
                }
            }

            address += entry.statement.size();
        }

        Ok(labels)
    }
}
