//! [Emulator] for executing LS-8 [programs](crate::bytecode::Program).

use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

use itertools::Itertools;
use slog::{error, o, trace, warn, Discard, Logger};

use crate::alu;
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::{Encoding, Instruction, JumpCondition, OpCode, Register};

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Initial value of the stack pointer. The stack grows downwards from here.
pub const STACK_BASE_ADDRESS: u8 = 0xF4;

/// Contains the execution environment of the LS-8 processor.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The Program Counter stores the address of the next instruction to be executed.
    pub pc: u8,

    /// Array containing values for all the eight registers. `R7` is the stack pointer.
    pub r: [u8; 8],

    /// The comparison result flags.
    pub flags: Flags,
}

/// Represents the flags register.
///
/// Holds the result of the latest `CMP` instruction. At most one flag is set at a time.
/// Read by the conditional jump instructions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub less: bool,
    pub greater: bool,
    pub equal: bool,
}

impl Flags {
    pub const EQUAL: u8 = 0b001;
    pub const GREATER: u8 = 0b010;
    pub const LESS: u8 = 0b100;

    /// Clears all flags.
    fn zero(&mut self) {
        self.less = false;
        self.greater = false;
        self.equal = false;
    }

    /// Replaces the flags with the outcome of a comparison.
    fn set_ordering(&mut self, ordering: Ordering) {
        self.zero();

        match ordering {
            Ordering::Less => self.less = true,
            Ordering::Equal => self.equal = true,
            Ordering::Greater => self.greater = true,
        }
    }

    fn test(&self, condition: JumpCondition) -> bool {
        match condition {
            JumpCondition::Always => true,
            JumpCondition::Equal => self.equal,
            JumpCondition::NotEqual => !self.equal,
            JumpCondition::Less => self.less,
            JumpCondition::LessOrEqual => self.less || self.equal,
            JumpCondition::Greater => self.greater,
            JumpCondition::GreaterOrEqual => self.greater || self.equal,
        }
    }

    /// The flags in the `00000LGE` layout of the flags register.
    pub fn as_word(&self) -> u8 {
        let mut word = 0;

        if self.equal {
            word |= Flags::EQUAL;
        }

        if self.greater {
            word |= Flags::GREATER;
        }

        if self.less {
            word |= Flags::LESS;
        }

        word
    }

    /// Reads the flags from the `00000LGE` layout. Reserved bits are ignored.
    pub fn from_word(word: u8) -> Flags {
        Flags {
            less: word & Flags::LESS != 0,
            greater: word & Flags::GREATER != 0,
            equal: word & Flags::EQUAL != 0,
        }
    }
}

/// The flat 256 byte memory of the machine.
///
/// Addresses are bytes, so every address is valid.
#[derive(Clone, PartialEq)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Creates a zeroed memory.
    pub fn new() -> Memory {
        Memory {
            cells: [0; MEMORY_SIZE],
        }
    }

    /// Copies `words` into the memory starting from address 0.
    ///
    /// # Errors
    /// Returns [EmulationError::ProgramTooLarge] if the words do not fit into the memory.
    /// The memory is left untouched in that case.
    pub fn load(&mut self, words: &[u8]) -> Result<(), EmulationError> {
        if words.len() > MEMORY_SIZE {
            return Err(EmulationError::ProgramTooLarge { size: words.len() });
        }

        self.cells[..words.len()].copy_from_slice(words);

        Ok(())
    }

    pub fn read(&self, address: u8) -> u8 {
        self.cells[address as usize]
    }

    pub fn write(&mut self, address: u8, value: u8) {
        self.cells[address as usize] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells[..]
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let used = self.cells.iter().rposition(|cell| *cell != 0).map_or(0, |i| i + 1);

        write!(f, "Memory[{}]", self.cells[..used].iter().map(|c| format!("{:02X}", c)).join(" "))
    }
}

/// Interface to the output devices.
pub trait InputOutput {
    /// Called when a `PRN` instruction is executed.
    ///
    /// # Parameters
    /// - `value`: The value of the register specified in the instruction.
    fn print_number(&mut self, value: u8);

    /// Called when a `PRA` instruction is executed.
    ///
    /// # Parameters
    /// - `value`: The value of the register specified in the instruction, an ASCII code.
    fn print_char(&mut self, value: u8);
}

/// An IO handler for testing purposes.
///
/// Appends everything printed to an output buffer exactly as [StdIo] would print it.
#[derive(Debug, Default)]
pub struct TestIo {
    output_buffer: String,
}

impl TestIo {
    pub fn new() -> TestIo {
        TestIo {
            output_buffer: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output_buffer
    }

    pub fn into_output(self) -> String {
        self.output_buffer
    }
}

impl InputOutput for TestIo {
    fn print_number(&mut self, value: u8) {
        self.output_buffer.push_str(&format!("{}\n", value));
    }

    fn print_char(&mut self, value: u8) {
        self.output_buffer.push(value as char);
    }
}

impl InputOutput for &mut TestIo {
    fn print_number(&mut self, value: u8) {
        (**self).print_number(value)
    }

    fn print_char(&mut self, value: u8) {
        (**self).print_char(value)
    }
}

/// An IO handler that prints numbers and characters to the standard output.
#[derive(Debug)]
pub struct StdIo;

impl InputOutput for StdIo {
    fn print_number(&mut self, value: u8) {
        println!("{}", value);
    }

    fn print_char(&mut self, value: u8) {
        print!("{}", value as char);
        let _ = std::io::stdout().flush();
    }
}

/// Errors that end a run before the program halts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulationError {
    /// An instruction referred to a register outside `R0`-`R7`.
    InvalidRegister {
        /// The address of the instruction.
        pc: u8,
        /// The operand byte that was used as a register index.
        index: u8,
    },

    /// The program counter was advanced past the last memory address.
    ProgramCounterOverflow {
        /// The address of the instruction that was executed last.
        pc: u8,
    },

    /// [Emulator::run_with_limit] executed its whole budget without the program halting.
    StepLimitExceeded {
        limit: u64,
    },

    /// The program does not fit into the memory.
    ProgramTooLarge {
        /// Size of the program in words.
        size: usize,
    },
}

impl fmt::Display for EmulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmulationError::InvalidRegister { pc, index } => {
                write!(f, "invalid register {} at address 0x{:02x}", index, pc)
            }
            EmulationError::ProgramCounterOverflow { pc } => {
                write!(f, "program counter overflow after address 0x{:02x}", pc)
            }
            EmulationError::StepLimitExceeded { limit } => {
                write!(f, "program did not halt within {} steps", limit)
            }
            EmulationError::ProgramTooLarge { size } => {
                write!(f, "program of {} words does not fit into {} bytes of memory", size, MEMORY_SIZE)
            }
        }
    }
}

impl std::error::Error for EmulationError {}

/// Describes how a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The program executed a `HLT` instruction.
    Halted,

    /// A `DIV` or `MOD` instruction had a zero divisor.
    DivisionByZero {
        /// The address of the faulting instruction.
        pc: u8,
    },
}

/// What the engine does with the program counter after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Advance past the instruction.
    Next,

    /// The instruction moved the program counter to the address.
    Jump(u8),
}

/// Snapshot of the machine state in the format of the classic LS-8 trace line.
///
/// ```text
/// TRACE: PC | OP A B | R0 R1 R2 R3 R4 R5 R6 R7
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub pc: u8,

    /// The byte at the program counter and the two following bytes.
    pub bytes: [u8; 3],

    pub registers: [u8; 8],
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TRACE: {:02X} | {:02X} {:02X} {:02X} | {}",
            self.pc,
            self.bytes[0],
            self.bytes[1],
            self.bytes[2],
            self.registers.iter().map(|r| format!("{:02X}", r)).join(" "),
        )
    }
}

/// Utility struct for implementing methods in the context of emulating a single instruction.
struct InstructionEmulationContext<'e, 'i, IO> {
    /// The emulator in whose context the instruction is being emulated.
    emulator: &'e mut Emulator<IO>,

    /// The instruction that we are currently emulating.
    instruction: &'i Instruction,

    /// The address of the instruction.
    pc: u8,
}

impl<'e, 'i, IO> InstructionEmulationContext<'e, 'i, IO>
where
    IO: InputOutput,
{
    /// Interprets an operand as a register.
    fn register(&self, operand: usize) -> Result<Register, EmulationError> {
        let index = self.instruction.operands[operand];

        Register::from_byte(index).ok_or(EmulationError::InvalidRegister { pc: self.pc, index })
    }

    /// Returns the value of the register referred to by an operand.
    fn register_value(&self, operand: usize) -> Result<u8, EmulationError> {
        let register = self.register(operand)?;
        Ok(self.emulator.context.r[register.index()])
    }

    fn set_register(&mut self, register: Register, data: u8) {
        self.emulator.context.r[register.index()] = data;
        self.emulator.events.dispatch(Event::RegisterChange { register, data });
    }

    fn write_memory(&mut self, address: u8, data: u8) {
        self.emulator.memory.write(address, data);
        self.emulator.events.dispatch(Event::MemoryChange { address, data });
    }

    fn push_stack(&mut self, value: u8) {
        let sp = self.emulator.context.r[Register::SP.index()].wrapping_sub(1);
        self.set_register(Register::SP, sp);
        self.write_memory(sp, value);
    }

    fn pop_stack(&mut self) -> u8 {
        let sp = self.emulator.context.r[Register::SP.index()];
        let value = self.emulator.memory.read(sp);
        self.set_register(Register::SP, sp.wrapping_add(1));
        value
    }

    /// Address of the instruction following this one.
    fn next_address(&self) -> Result<u8, EmulationError> {
        self.pc
            .checked_add(self.instruction.opcode.encoding().length())
            .ok_or(EmulationError::ProgramCounterOverflow { pc: self.pc })
    }

    fn output(&mut self, text: String) {
        self.emulator.events.dispatch(Event::Output { text });
    }

    /// Execute the instruction.
    ///
    /// # Returns
    /// What to do with the program counter, or an error if the instruction has an invalid
    /// register operand.
    fn emulate(&mut self) -> Result<Flow, EmulationError> {
        match self.instruction.opcode {
            OpCode::NoOperation => (),

            OpCode::Halt => self.emulator.halt(Exit::Halted),

            OpCode::LoadImmediate => {
                let register = self.register(0)?;
                self.set_register(register, self.instruction.operands[1]);
            }

            OpCode::Load => {
                let register = self.register(0)?;
                let address = self.register_value(1)?;
                let value = self.emulator.memory.read(address);
                self.set_register(register, value);
            }

            OpCode::Store => {
                let address = self.register_value(0)?;
                let value = self.register_value(1)?;
                self.write_memory(address, value);
            }

            OpCode::PrintNumber => {
                let value = self.register_value(0)?;
                self.emulator.io.print_number(value);
                self.output(format!("{}\n", value));
            }

            OpCode::PrintAscii => {
                let value = self.register_value(0)?;
                self.emulator.io.print_char(value);
                self.output((value as char).to_string());
            }

            OpCode::Alu(op) => {
                let register = self.register(0)?;
                let a = self.register_value(0)?;
                let b = if op.is_unary() { 0 } else { self.register_value(1)? };

                match alu::execute(op, a, b) {
                    Ok(value) => self.set_register(register, value),
                    Err(err) => {
                        error!(self.emulator.logger, "{}", err;
                               "pc" => self.pc, "instruction" => %self.instruction);
                        self.emulator.halt(Exit::DivisionByZero { pc: self.pc });
                    }
                }
            }

            OpCode::Compare => {
                let a = self.register_value(0)?;
                let b = self.register_value(1)?;

                self.emulator.context.flags.set_ordering(alu::compare(a, b));

                let flags = self.emulator.context.flags;
                self.emulator.events.dispatch(Event::FlagsChange { flags });
            }

            OpCode::Jump(condition) => {
                let target = self.register_value(0)?;

                if self.emulator.context.flags.test(condition) {
                    return Ok(Flow::Jump(target));
                }
            }

            OpCode::Call => {
                let target = self.register_value(0)?;
                let return_address = self.next_address()?;
                self.push_stack(return_address);

                return Ok(Flow::Jump(target));
            }

            OpCode::Return => {
                let address = self.pop_stack();
                return Ok(Flow::Jump(address));
            }

            OpCode::Push => {
                let value = self.register_value(0)?;
                self.push_stack(value);
            }

            OpCode::Pop => {
                let register = self.register(0)?;
                let value = self.pop_stack();
                self.set_register(register, value);
            }

            OpCode::Interrupt | OpCode::InterruptReturn => {
                warn!(self.emulator.logger, "interrupts are not supported, instruction ignored";
                      "pc" => self.pc, "instruction" => %self.instruction);
            }
        }

        Ok(Flow::Next)
    }
}

/// The emulator contains all neccessary context for executing an LS-8 program
/// and an interface for doing output.
#[derive(Debug)]
pub struct Emulator<IO> {
    /// The memory of the emulated machine.
    /// Contains all the instructions and data required by the program.
    pub memory: Memory,

    /// The execution context, which includes the registers, flags and program counter.
    pub context: Context,

    /// Interface for printing.
    pub io: IO,

    /// True if the execution has been halted.
    pub halted: bool,

    exit: Option<Exit>,
    steps: u64,
    logger: Logger,
    events: EventDispatcher,
}

impl<IO> Emulator<IO>
where
    IO: InputOutput,
{
    /// Create a new emulator.
    ///
    /// # Parameters
    /// - `memory`: A [Memory] which has the program loaded at address 0.
    /// - `io`: An [IO handler](InputOutput).
    ///
    /// # Returns
    /// A new [Emulator] instance with zeroed registers and the stack pointer at
    /// [STACK_BASE_ADDRESS].
    pub fn new(memory: Memory, io: IO) -> Emulator<IO> {
        Emulator::with_logger(memory, io, None)
    }

    /// Create a new emulator which logs to `logger`.
    pub fn with_logger<L>(memory: Memory, io: IO, logger: L) -> Emulator<IO>
    where
        L: Into<Option<Logger>>,
    {
        let mut r = [0; 8];
        r[Register::SP.index()] = STACK_BASE_ADDRESS;

        let mut emulator = Emulator {
            memory,
            context: Context {
                r,
                pc: 0,
                flags: Flags::default(),
            },
            io,
            halted: false,
            exit: None,
            steps: 0,
            logger: Logger::root(Discard, o!()),
            events: EventDispatcher::new(),
        };

        if let Some(logger) = logger.into() {
            emulator.set_logger(logger);
        }

        emulator
    }

    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = logger.new(o!("stage" => "emulation"));
    }

    /// Registers a listener which is notified of every state change.
    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.events.add_listener(listener);
    }

    /// How the execution ended, or `None` if the program has not halted yet.
    pub fn exit(&self) -> Option<Exit> {
        self.exit
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Fetches the instruction at the address pointed by the Program Counter register.
    ///
    /// Returns `None` if the byte at the program counter is not a valid opcode.
    pub fn get_current_instruction(&self) -> Option<Instruction> {
        let pc = self.context.pc;

        OpCode::from_byte(self.memory.read(pc)).map(|opcode| {
            Instruction::new(opcode, [
                self.memory.read(pc.wrapping_add(1)),
                self.memory.read(pc.wrapping_add(2)),
            ])
        })
    }

    /// Captures the program counter, the bytes at it and all registers.
    pub fn trace(&self) -> Trace {
        let pc = self.context.pc;

        Trace {
            pc,
            bytes: [
                self.memory.read(pc),
                self.memory.read(pc.wrapping_add(1)),
                self.memory.read(pc.wrapping_add(2)),
            ],
            registers: self.context.r,
        }
    }

    fn halt(&mut self, exit: Exit) {
        self.halted = true;
        self.exit = Some(exit);
        self.events.dispatch(Event::Halt { pc: self.context.pc });
    }

    /// Executes a single instruction located at the program counter.
    ///
    /// Does not move the program counter. Returns what the engine should do with it.
    fn emulate_instruction(&mut self, ins: &Instruction) -> Result<Flow, EmulationError> {
        let pc = self.context.pc;

        let mut ctx = InstructionEmulationContext {
            emulator: self,
            instruction: ins,
            pc,
        };

        ctx.emulate()
    }

    /// Fetches the next instruction, executes it and moves the program counter.
    ///
    /// Unrecognized opcodes are logged and skipped. Does nothing if the emulator is halted.
    ///
    /// # Errors
    /// Returns an error if the instruction has an invalid register operand or if the program
    /// counter would move past the end of the memory.
    pub fn step(&mut self) -> Result<(), EmulationError> {
        if self.halted {
            return Ok(());
        }

        let pc = self.context.pc;
        let opcode = self.memory.read(pc);
        let operands = [
            self.memory.read(pc.wrapping_add(1)),
            self.memory.read(pc.wrapping_add(2)),
        ];
        let encoding = Encoding::decode(opcode);

        trace!(self.logger, "fetch"; "pc" => pc, "opcode" => format!("{:08b}", opcode));

        self.steps += 1;

        let flow = match OpCode::from_byte(opcode) {
            Some(op) => self.emulate_instruction(&Instruction::new(op, operands))?,
            None => {
                warn!(self.logger, "unrecognized instruction";
                      "pc" => pc, "opcode" => format!("{:08b}", opcode));
                Flow::Next
            }
        };

        if self.halted {
            return Ok(());
        }

        self.context.pc = match flow {
            Flow::Jump(address) if encoding.sets_pc => address,
            _ => pc
                .checked_add(encoding.length())
                .ok_or(EmulationError::ProgramCounterOverflow { pc })?,
        };

        Ok(())
    }

    /// Executes the program until it halts.
    ///
    /// A program that never halts runs forever, see [Emulator::run_with_limit].
    ///
    /// # Errors
    /// Returns an error if an instruction fails, see [Emulator::step].
    pub fn run(&mut self) -> Result<Exit, EmulationError> {
        while !self.halted {
            self.step()?;
        }

        Ok(self.exit.unwrap_or(Exit::Halted))
    }

    /// Executes the program until it halts or `limit` instructions have been executed.
    ///
    /// # Errors
    /// Returns [EmulationError::StepLimitExceeded] if the program did not halt in time, or any
    /// error returned by [Emulator::step].
    pub fn run_with_limit(&mut self, limit: u64) -> Result<Exit, EmulationError> {
        let start = self.steps;

        while !self.halted {
            if self.steps - start >= limit {
                return Err(EmulationError::StepLimitExceeded { limit });
            }

            self.step()?;
        }

        Ok(self.exit.unwrap_or(Exit::Halted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const NOP: u8 = 0b0000_0000;
    const HLT: u8 = 0b0000_0001;
    const RET: u8 = 0b0001_0001;
    const PUSH: u8 = 0b0100_0101;
    const POP: u8 = 0b0100_0110;
    const PRN: u8 = 0b0100_0111;
    const PRA: u8 = 0b0100_1000;
    const CALL: u8 = 0b0101_0000;
    const INT: u8 = 0b0101_0010;
    const JMP: u8 = 0b0101_0100;
    const LDI: u8 = 0b1000_0010;
    const LD: u8 = 0b1000_0011;
    const ST: u8 = 0b1000_0100;
    const ADD: u8 = 0b1010_0000;
    const DIV: u8 = 0b1010_0011;
    const MOD: u8 = 0b1010_0100;
    const CMP: u8 = 0b1010_0111;
    const NOT: u8 = 0b0110_1001;
    const INC: u8 = 0b0110_0101;
    const AND: u8 = 0b1010_1000;
    const SHL: u8 = 0b1010_1100;
    const SUB: u8 = 0b1010_0001;

    macro_rules! assert_register {
        ($emulator:expr, $register:expr, $value:expr) => {
            assert_eq!($emulator.context.r[$register], $value, "Register {} != {}", $register, $value);
        };
    }

    fn emulator(program: &[u8]) -> Emulator<TestIo> {
        let mut memory = Memory::new();
        memory.load(program).expect("program does not fit into memory");

        Emulator::new(memory, TestIo::new())
    }

    #[test]
    fn test_load_immediate_and_print() {
        let mut emulator = emulator(&[LDI, 3, 42, PRN, 3, HLT]);

        assert_eq!(emulator.run(), Ok(Exit::Halted));
        assert_register!(emulator, 3, 42);
        assert_eq!(emulator.io.output(), "42\n");
    }

    #[test]
    fn test_add_program() {
        let mut emulator = emulator(&[
            LDI, 0, 8,
            LDI, 1, 9,
            PRN, 0,
            ADD, 0, 1,
            PRN, 0,
            HLT,
            PRN, 1,
        ]);

        assert_eq!(emulator.run(), Ok(Exit::Halted));
        assert_eq!(emulator.io.output(), "8\n17\n");
        assert!(emulator.halted);
        assert_eq!(emulator.context.pc, 13);
        assert_eq!(emulator.steps(), 6);
    }

    #[test]
    fn test_alu_writes_back() {
        let mut emulator = emulator(&[
            LDI, 0, 0b1111_0000,
            NOT, 0,
            LDI, 1, 0b0000_0110,
            AND, 1, 0,
            LDI, 2, 3,
            SHL, 2, 2,
            LDI, 3, 255,
            INC, 3,
            LDI, 4, 0,
            SUB, 4, 2,
            HLT,
        ]);

        emulator.run().unwrap();

        assert_register!(emulator, 0, 0b0000_1111);
        assert_register!(emulator, 1, 0b0000_0110);
        assert_register!(emulator, 2, 24);
        assert_register!(emulator, 3, 0);
        assert_register!(emulator, 4, 232);
    }

    #[test]
    fn test_division_by_zero_halts() {
        for op in [DIV, MOD].iter() {
            let mut emulator = emulator(&[
                LDI, 0, 10,
                LDI, 1, 0,
                *op, 0, 1,
                PRN, 0,
                HLT,
            ]);

            assert_eq!(emulator.run(), Ok(Exit::DivisionByZero { pc: 6 }));
            assert!(emulator.halted);
            assert_register!(emulator, 0, 10);
            assert_eq!(emulator.io.output(), "");
            assert_eq!(emulator.context.pc, 6);
        }
    }

    #[test]
    fn test_compare_sets_one_flag() {
        let cases = [
            (1, 2, Flags::LESS),
            (2, 2, Flags::EQUAL),
            (200, 2, Flags::GREATER),
        ];

        for (a, b, word) in cases.iter() {
            let mut emulator = emulator(&[LDI, 0, *a, LDI, 1, *b, CMP, 0, 1, HLT]);
            emulator.context.flags = Flags::from_word(0b111);

            emulator.run().unwrap();

            assert_eq!(emulator.context.flags.as_word(), *word, "CMP {}, {}", a, b);
        }
    }

    #[test]
    fn test_conditional_jumps() {
        let cases = [
            ("JEQ", 4, 4, true), ("JEQ", 3, 7, false),
            ("JNE", 3, 7, true), ("JNE", 4, 4, false),
            ("JLT", 3, 7, true), ("JLT", 7, 3, false), ("JLT", 4, 4, false),
            ("JLE", 4, 4, true), ("JLE", 3, 7, true), ("JLE", 7, 3, false),
            ("JGT", 7, 3, true), ("JGT", 4, 4, false),
            ("JGE", 4, 4, true), ("JGE", 7, 3, true), ("JGE", 3, 7, false),
            ("JMP", 3, 7, true),
        ];

        for (mnemonic, a, b, taken) in cases.iter() {
            let jump = OpCode::from_mnemonic(mnemonic).unwrap().as_byte();

            let mut emulator = emulator(&[
                LDI, 0, *a,
                LDI, 1, *b,
                LDI, 2, 17,
                CMP, 0, 1,
                jump, 2,
                PRN, 0,
                HLT,
                PRN, 1,
                HLT,
            ]);

            emulator.run().unwrap();

            let (pc, output) = match taken {
                true => (19, format!("{}\n", b)),
                false => (16, format!("{}\n", a)),
            };

            assert_eq!(emulator.context.pc, pc, "{} with {}, {}", mnemonic, a, b);
            assert_eq!(emulator.io.output(), output, "{} with {}, {}", mnemonic, a, b);
        }
    }

    #[test]
    fn test_jump_moves_fetch_address() {
        let mut emulator = emulator(&[LDI, 0, 10, JMP, 0, HLT]);

        emulator.step().unwrap();
        emulator.step().unwrap();

        assert_eq!(emulator.context.pc, 10);
        assert_eq!(emulator.trace().bytes[0], NOP);
    }

    #[test]
    fn test_push_pop_round_trip() {
        let mut emulator = emulator(&[
            LDI, 0, 99,
            PUSH, 0,
            LDI, 0, 0,
            POP, 1,
            HLT,
        ]);

        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_register!(emulator, 7, STACK_BASE_ADDRESS - 1);
        assert_eq!(emulator.memory.read(STACK_BASE_ADDRESS - 1), 99);

        emulator.run().unwrap();
        assert_register!(emulator, 0, 0);
        assert_register!(emulator, 1, 99);
        assert_register!(emulator, 7, STACK_BASE_ADDRESS);
    }

    #[test]
    fn test_call_and_return() {
        let mut emulator = emulator(&[
            LDI, 1, 8,
            CALL, 1,
            PRN, 0,
            HLT,
            LDI, 0, 7,
            RET,
        ]);

        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_eq!(emulator.context.pc, 8);
        assert_eq!(emulator.memory.read(STACK_BASE_ADDRESS - 1), 5);

        assert_eq!(emulator.run(), Ok(Exit::Halted));
        assert_eq!(emulator.io.output(), "7\n");
        assert_register!(emulator, 7, STACK_BASE_ADDRESS);
    }

    #[test]
    fn test_load_and_store() {
        let mut emulator = emulator(&[
            LDI, 0, 0x80,
            LDI, 1, 42,
            ST, 0, 1,
            LD, 2, 0,
            HLT,
        ]);

        emulator.run().unwrap();

        assert_eq!(emulator.memory.read(0x80), 42);
        assert_register!(emulator, 2, 42);
    }

    #[test]
    fn test_print_ascii() {
        let mut emulator = emulator(&[LDI, 0, b'H', PRA, 0, LDI, 0, b'i', PRA, 0, HLT]);

        emulator.run().unwrap();

        assert_eq!(emulator.io.output(), "Hi");
    }

    #[test]
    fn test_unrecognized_instruction_is_skipped() {
        let mut emulator = emulator(&[0b0110_0000, 0xAA, 0xFF, 0, 0, 0, LDI, 0, 1, HLT]);

        assert_eq!(emulator.run(), Ok(Exit::Halted));
        assert_register!(emulator, 0, 1);
        assert_eq!(emulator.context.pc, 9);
    }

    #[test]
    fn test_interrupt_placeholder_falls_through() {
        let mut emulator = emulator(&[INT, 0, HLT]);

        assert_eq!(emulator.run(), Ok(Exit::Halted));
        assert_eq!(emulator.context.pc, 2);
    }

    #[test]
    fn test_invalid_register() {
        let mut emulator = emulator(&[NOP, LDI, 8, 1, HLT]);

        assert_eq!(emulator.run(), Err(EmulationError::InvalidRegister { pc: 1, index: 8 }));
        assert!(!emulator.halted);
    }

    #[test]
    fn test_program_counter_overflow() {
        let mut emulator = emulator(&[]);

        assert_eq!(emulator.run(), Err(EmulationError::ProgramCounterOverflow { pc: 255 }));
        assert_eq!(emulator.steps(), 256);
    }

    #[test]
    fn test_step_limit() {
        let mut emulator = emulator(&[LDI, 0, 3, JMP, 0]);

        assert_eq!(
            emulator.run_with_limit(100),
            Err(EmulationError::StepLimitExceeded { limit: 100 }),
        );
        assert_eq!(emulator.steps(), 100);
    }

    #[test]
    fn test_program_too_large() {
        let mut memory = Memory::new();

        assert_eq!(
            memory.load(&[0; 257]),
            Err(EmulationError::ProgramTooLarge { size: 257 }),
        );
        assert!(memory.load(&[1; 256]).is_ok());
    }

    #[test]
    fn test_trace() {
        let emulator = emulator(&[LDI, 0, 8, HLT]);

        assert_eq!(
            emulator.trace().to_string(),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4",
        );
    }

    #[test]
    fn test_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let mut emulator = emulator(&[LDI, 0, 5, PUSH, 0, PRN, 0, HLT]);
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));

        emulator.run().unwrap();

        assert_eq!(*events.borrow(), vec![
            Event::RegisterChange { register: Register::R0, data: 5 },
            Event::RegisterChange { register: Register::SP, data: STACK_BASE_ADDRESS - 1 },
            Event::MemoryChange { address: STACK_BASE_ADDRESS - 1, data: 5 },
            Event::Output { text: "5\n".to_string() },
            Event::Halt { pc: 7 },
        ]);
    }
}
