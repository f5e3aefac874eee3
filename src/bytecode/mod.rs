//! Parsing and storing LS-8 program images.
//!
//! A program image is a text file with one 8-bit word per line, written in binary. Anything after
//! a `#` is a comment. Blank lines are skipped.
//!
//! ```text
//! 10000010 # LDI R0, 8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

mod parser;
mod program;

pub use self::parser::{ErrorKind, ParseError};
pub use self::program::Program;
