use std::fmt::Write;

use super::parser::{parse_program_file, ParseError};
use crate::emulator::{EmulationError, Memory, MEMORY_SIZE};
use crate::instruction::{Instruction, OpCode};

/// A program image: the initial contents of the memory starting from address 0.
///
/// Never holds more words than there are memory cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    words: Vec<u8>,
}

impl Program {
    /// Parses a program image from its text format.
    pub fn parse(input: &str) -> Result<Program, ParseError> {
        parse_program_file(input)
    }

    /// Creates a program from raw words.
    ///
    /// # Errors
    /// Returns [EmulationError::ProgramTooLarge] if there are more words than memory cells.
    pub fn from_words(words: Vec<u8>) -> Result<Program, EmulationError> {
        if words.len() > MEMORY_SIZE {
            return Err(EmulationError::ProgramTooLarge { size: words.len() });
        }

        Ok(Program { words })
    }

    pub(crate) fn from_words_unchecked(words: Vec<u8>) -> Program {
        debug_assert!(words.len() <= MEMORY_SIZE);
        Program { words }
    }

    pub fn words(&self) -> &[u8] {
        &self.words[..]
    }

    /// Creates a memory with the program loaded at address 0 and the rest zeroed.
    pub fn to_memory(&self) -> Memory {
        let mut memory = Memory::new();

        for (address, word) in self.words.iter().enumerate() {
            memory.write(address as u8, *word);
        }

        memory
    }

    /// Renders the program in the text format.
    ///
    /// Words that start a complete instruction get the disassembled instruction as a comment.
    /// Parsing the output yields the same program.
    pub fn to_source(&self) -> String {
        let mut source = String::new();
        let mut address = 0;

        while address < self.words.len() {
            let word = self.words[address];
            let operand = |offset: usize| self.words.get(address + offset).copied().unwrap_or(0);

            let instruction = OpCode::from_byte(word)
                .map(|opcode| Instruction::new(opcode, [operand(1), operand(2)]))
                .filter(|ins| {
                    address + ins.opcode.encoding().length() as usize <= self.words.len()
                });

            match instruction {
                Some(ins) => {
                    let bytes = ins.to_bytes();
                    let _ = writeln!(source, "{:08b} # {}", bytes[0], ins);

                    for byte in &bytes[1..] {
                        let _ = writeln!(source, "{:08b}", byte);
                    }

                    address += bytes.len();
                }
                None => {
                    let _ = writeln!(source, "{:08b}", word);
                    address += 1;
                }
            }
        }

        source
    }
}
