//! A crate for loading, assembling and executing programs for the LS-8, an imaginary 8-bit
//! computer with 256 bytes of memory, eight general purpose registers and a downward growing
//! stack.
//!
//! Currently this crate provides the functionality to:
//! - Read and write `.ls8` files containing LS-8 machine code as binary text.
//! - Assemble `.asm` files containing symbolic LS-8 assembly with labels.
//! - Disassemble machine code.
//! - Execute machine code, optionally printing a trace of every instruction.
//!
//! # Unimplemented stuff
//! - Interrupts. `INT` and `IRET` are accepted but only log a warning.
//! - Keyboard input and timers.
//!
//! # Example
//! ```
//! use ls8::{
//!     bytecode::Program,
//!     emulator::{Emulator, Exit, TestIo},
//! };
//!
//! // Loads 8 into R0, prints it and halts.
//! let source = "
//!     10000010 # LDI R0,8
//!     00000000
//!     00001000
//!     01000111 # PRN R0
//!     00000000
//!     00000001 # HLT
//! ";
//!
//! let program = Program::parse(source).unwrap();
//!
//! let mut emulator = Emulator::new(program.to_memory(), TestIo::new());
//!
//! assert_eq!(emulator.run(), Ok(Exit::Halted));
//! assert_eq!(emulator.io.output(), "8\n");
//! ```
//!
//! The same program in symbolic assembly:
//! ```
//! use ls8::{
//!     symbolic::Program,
//!     emulator::{Emulator, TestIo},
//! };
//!
//! let program = Program::parse("LDI R0, 8\nPRN R0\nHLT").unwrap()
//!     .compile()
//!     .unwrap();
//!
//! let mut emulator = Emulator::new(program.to_memory(), TestIo::new());
//! emulator.run().unwrap();
//!
//! assert_eq!(emulator.io.into_output(), "8\n");
//! ```
//!
//! # Executables
//!
//! Both executables are behind the `tools` feature.
//!
//! ## `ls8run`
//!
//! Executes a `.ls8` or `.asm` file using the standard output.
//!
//! ```text
//! $ ls8run --trace print8.ls8
//! TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4
//! TRACE: 03 | 47 00 01 | 08 00 00 00 00 00 00 F4
//! 8
//! TRACE: 05 | 01 00 00 | 08 00 00 00 00 00 00 F4
//! ```
//!
//! ## `ls8asm`
//!
//! Assembles a `.asm` file into the `.ls8` format, with every instruction disassembled into a
//! comment.
pub mod alu;
pub mod bytecode;
pub mod emulator;
pub mod error;
pub mod event;
pub mod instruction;
pub mod parsing;
pub mod symbolic;
