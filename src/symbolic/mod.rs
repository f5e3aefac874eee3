//! Parsing and assembling symbolic LS-8 assembly.
//!
//! ```text
//! ; prints 8
//!         LDI R0, 8
//!         PRN R0
//! end:    HLT
//! ```
//!
//! Labels (`name:`) can be used in place of any immediate operand and resolve to the address of
//! the following instruction. `DB value` emits a single data byte.

pub mod parser;
pub mod program;
mod token;

pub use self::parser::ParseError;
pub use self::program::{Operand, Program, Statement};
