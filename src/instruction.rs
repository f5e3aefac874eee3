//! Types for representing instructions and their parts.
//!
//! An LS-8 instruction is one opcode byte followed by zero, one or two operand bytes. The two
//! highest bits of the opcode hold the operand count and bit 4 tells whether the instruction sets
//! the program counter by itself. See [Encoding::decode].

use std::fmt;
use std::str::FromStr;

use crate::alu::AluOp;

/// Describes the predicate for a (un)conditional jump instruction.
///
/// All conditions except [Always](JumpCondition::Always) test the
/// [flags](crate::emulator::Flags) set by the latest `CMP`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpCondition {
    /// Unconditional jump. (`JMP`)
    Always,

    /// Jump if the equal-flag is set. (`JEQ`)
    Equal,

    /// Jump if the equal-flag is not set. (`JNE`)
    NotEqual,

    /// Jump if the less-flag is set. (`JLT`)
    Less,

    /// Jump if either the less-flag or the equal-flag is set. (`JLE`)
    LessOrEqual,

    /// Jump if the greater-flag is set. (`JGT`)
    Greater,

    /// Jump if either the greater-flag or the equal-flag is set. (`JGE`)
    GreaterOrEqual,
}

/// Instructions of the LS-8 instruction architecture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpCode {
    /// Does nothing besides advancing the program counter.
    NoOperation,

    /// Stops the execution.
    Halt,

    /// Loads an immediate value into a register.
    LoadImmediate,

    /// Loads a register with the value at the memory address stored in another register.
    Load,

    /// Stores the value of a register at the memory address stored in another register.
    Store,

    /// Prints the decimal value of a register.
    PrintNumber,

    /// Prints a register as an ASCII character.
    PrintAscii,

    /// An arithmetic or logic operation on a register.
    Alu(AluOp),

    /// Compares two registers and stores the result in the [flags](crate::emulator::Flags).
    Compare,

    /// Moves the program counter to the address stored in a register if the condition holds.
    Jump(JumpCondition),

    /// Pushes the return address to the stack and jumps to the address stored in a register.
    Call,

    /// Pops the return address from the stack into the program counter.
    Return,

    /// Pushes the value of a register to the stack.
    Push,

    /// Pops the value at the top of the stack into a register.
    Pop,

    /// Issues a software interrupt. Recognized, but not supported.
    Interrupt,

    /// Returns from an interrupt handler. Recognized, but not supported.
    InterruptReturn,
}

/// How an operand byte of an instruction is interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandKind {
    /// The operand is the index of a register.
    Register,

    /// The operand is a literal value.
    Immediate,
}

const R: OperandKind = OperandKind::Register;
const I: OperandKind = OperandKind::Immediate;

impl OpCode {
    /// Every instruction of the architecture, in ascending opcode order.
    pub const ALL: [OpCode; 34] = [
        OpCode::NoOperation,
        OpCode::Halt,
        OpCode::Return,
        OpCode::InterruptReturn,
        OpCode::Push,
        OpCode::Pop,
        OpCode::PrintNumber,
        OpCode::PrintAscii,
        OpCode::Call,
        OpCode::Interrupt,
        OpCode::Jump(JumpCondition::Always),
        OpCode::Jump(JumpCondition::Equal),
        OpCode::Jump(JumpCondition::NotEqual),
        OpCode::Jump(JumpCondition::Greater),
        OpCode::Jump(JumpCondition::Less),
        OpCode::Jump(JumpCondition::LessOrEqual),
        OpCode::Jump(JumpCondition::GreaterOrEqual),
        OpCode::Alu(AluOp::Increment),
        OpCode::Alu(AluOp::Decrement),
        OpCode::Alu(AluOp::Not),
        OpCode::LoadImmediate,
        OpCode::Load,
        OpCode::Store,
        OpCode::Alu(AluOp::Add),
        OpCode::Alu(AluOp::Subtract),
        OpCode::Alu(AluOp::Multiply),
        OpCode::Alu(AluOp::Divide),
        OpCode::Alu(AluOp::Modulo),
        OpCode::Compare,
        OpCode::Alu(AluOp::And),
        OpCode::Alu(AluOp::Or),
        OpCode::Alu(AluOp::Xor),
        OpCode::Alu(AluOp::ShiftLeft),
        OpCode::Alu(AluOp::ShiftRight),
    ];

    pub fn as_byte(&self) -> u8 {
        match self {
            OpCode::NoOperation => 0b0000_0000,
            OpCode::Halt => 0b0000_0001,
            OpCode::Return => 0b0001_0001,
            OpCode::InterruptReturn => 0b0001_0011,

            OpCode::Push => 0b0100_0101,
            OpCode::Pop => 0b0100_0110,
            OpCode::PrintNumber => 0b0100_0111,
            OpCode::PrintAscii => 0b0100_1000,

            OpCode::Call => 0b0101_0000,
            OpCode::Interrupt => 0b0101_0010,

            OpCode::Jump(JumpCondition::Always) => 0b0101_0100,
            OpCode::Jump(JumpCondition::Equal) => 0b0101_0101,
            OpCode::Jump(JumpCondition::NotEqual) => 0b0101_0110,
            OpCode::Jump(JumpCondition::Greater) => 0b0101_0111,
            OpCode::Jump(JumpCondition::Less) => 0b0101_1000,
            OpCode::Jump(JumpCondition::LessOrEqual) => 0b0101_1001,
            OpCode::Jump(JumpCondition::GreaterOrEqual) => 0b0101_1010,

            OpCode::Alu(AluOp::Increment) => 0b0110_0101,
            OpCode::Alu(AluOp::Decrement) => 0b0110_0110,
            OpCode::Alu(AluOp::Not) => 0b0110_1001,

            OpCode::LoadImmediate => 0b1000_0010,
            OpCode::Load => 0b1000_0011,
            OpCode::Store => 0b1000_0100,

            OpCode::Alu(AluOp::Add) => 0b1010_0000,
            OpCode::Alu(AluOp::Subtract) => 0b1010_0001,
            OpCode::Alu(AluOp::Multiply) => 0b1010_0010,
            OpCode::Alu(AluOp::Divide) => 0b1010_0011,
            OpCode::Alu(AluOp::Modulo) => 0b1010_0100,
            OpCode::Compare => 0b1010_0111,

            OpCode::Alu(AluOp::And) => 0b1010_1000,
            OpCode::Alu(AluOp::Or) => 0b1010_1010,
            OpCode::Alu(AluOp::Xor) => 0b1010_1011,
            OpCode::Alu(AluOp::ShiftLeft) => 0b1010_1100,
            OpCode::Alu(AluOp::ShiftRight) => 0b1010_1101,
        }
    }

    /// Looks up the instruction for an opcode byte.
    ///
    /// Returns `None` for bytes that are not part of the instruction set.
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        let opcode = match byte {
            0b0000_0000 => OpCode::NoOperation,
            0b0000_0001 => OpCode::Halt,
            0b0001_0001 => OpCode::Return,
            0b0001_0011 => OpCode::InterruptReturn,

            0b0100_0101 => OpCode::Push,
            0b0100_0110 => OpCode::Pop,
            0b0100_0111 => OpCode::PrintNumber,
            0b0100_1000 => OpCode::PrintAscii,

            0b0101_0000 => OpCode::Call,
            0b0101_0010 => OpCode::Interrupt,

            0b0101_0100 => OpCode::Jump(JumpCondition::Always),
            0b0101_0101 => OpCode::Jump(JumpCondition::Equal),
            0b0101_0110 => OpCode::Jump(JumpCondition::NotEqual),
            0b0101_0111 => OpCode::Jump(JumpCondition::Greater),
            0b0101_1000 => OpCode::Jump(JumpCondition::Less),
            0b0101_1001 => OpCode::Jump(JumpCondition::LessOrEqual),
            0b0101_1010 => OpCode::Jump(JumpCondition::GreaterOrEqual),

            0b0110_0101 => OpCode::Alu(AluOp::Increment),
            0b0110_0110 => OpCode::Alu(AluOp::Decrement),
            0b0110_1001 => OpCode::Alu(AluOp::Not),

            0b1000_0010 => OpCode::LoadImmediate,
            0b1000_0011 => OpCode::Load,
            0b1000_0100 => OpCode::Store,

            0b1010_0000 => OpCode::Alu(AluOp::Add),
            0b1010_0001 => OpCode::Alu(AluOp::Subtract),
            0b1010_0010 => OpCode::Alu(AluOp::Multiply),
            0b1010_0011 => OpCode::Alu(AluOp::Divide),
            0b1010_0100 => OpCode::Alu(AluOp::Modulo),
            0b1010_0111 => OpCode::Compare,

            0b1010_1000 => OpCode::Alu(AluOp::And),
            0b1010_1010 => OpCode::Alu(AluOp::Or),
            0b1010_1011 => OpCode::Alu(AluOp::Xor),
            0b1010_1100 => OpCode::Alu(AluOp::ShiftLeft),
            0b1010_1101 => OpCode::Alu(AluOp::ShiftRight),

            _ => return None,
        };

        Some(opcode)
    }

    /// The assembly mnemonic of the instruction.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::NoOperation => "NOP",
            OpCode::Halt => "HLT",
            OpCode::LoadImmediate => "LDI",
            OpCode::Load => "LD",
            OpCode::Store => "ST",
            OpCode::PrintNumber => "PRN",
            OpCode::PrintAscii => "PRA",

            OpCode::Alu(AluOp::Add) => "ADD",
            OpCode::Alu(AluOp::Subtract) => "SUB",
            OpCode::Alu(AluOp::Multiply) => "MUL",
            OpCode::Alu(AluOp::Divide) => "DIV",
            OpCode::Alu(AluOp::Modulo) => "MOD",
            OpCode::Alu(AluOp::And) => "AND",
            OpCode::Alu(AluOp::Or) => "OR",
            OpCode::Alu(AluOp::Xor) => "XOR",
            OpCode::Alu(AluOp::Not) => "NOT",
            OpCode::Alu(AluOp::ShiftLeft) => "SHL",
            OpCode::Alu(AluOp::ShiftRight) => "SHR",
            OpCode::Alu(AluOp::Increment) => "INC",
            OpCode::Alu(AluOp::Decrement) => "DEC",

            OpCode::Compare => "CMP",

            OpCode::Jump(JumpCondition::Always) => "JMP",
            OpCode::Jump(JumpCondition::Equal) => "JEQ",
            OpCode::Jump(JumpCondition::NotEqual) => "JNE",
            OpCode::Jump(JumpCondition::Less) => "JLT",
            OpCode::Jump(JumpCondition::LessOrEqual) => "JLE",
            OpCode::Jump(JumpCondition::Greater) => "JGT",
            OpCode::Jump(JumpCondition::GreaterOrEqual) => "JGE",

            OpCode::Call => "CALL",
            OpCode::Return => "RET",
            OpCode::Push => "PUSH",
            OpCode::Pop => "POP",
            OpCode::Interrupt => "INT",
            OpCode::InterruptReturn => "IRET",
        }
    }

    /// Finds the instruction with the given mnemonic. The comparison ignores case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<OpCode> {
        OpCode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// The kinds of the operands the instruction expects, in order.
    ///
    /// The length of the returned slice always equals the operand count encoded in the opcode.
    pub fn operands(&self) -> &'static [OperandKind] {
        match self {
            OpCode::NoOperation | OpCode::Halt | OpCode::Return | OpCode::InterruptReturn => &[],

            OpCode::LoadImmediate => &[R, I],
            OpCode::Load | OpCode::Store | OpCode::Compare => &[R, R],

            OpCode::Alu(op) if op.is_unary() => &[R],
            OpCode::Alu(_) => &[R, R],

            OpCode::PrintNumber
            | OpCode::PrintAscii
            | OpCode::Jump(_)
            | OpCode::Call
            | OpCode::Push
            | OpCode::Pop
            | OpCode::Interrupt => &[R],
        }
    }

    pub fn encoding(&self) -> Encoding {
        Encoding::decode(self.as_byte())
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// The layout information encoded in the bits of an opcode byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Encoding {
    /// Number of operand bytes following the opcode. Bits 6-7 of the opcode.
    pub operand_count: u8,

    /// True if the instruction sets the program counter itself. Bit 4 of the opcode.
    pub sets_pc: bool,
}

impl Encoding {
    /// Decodes the layout of any byte, including bytes that are not valid opcodes.
    pub fn decode(opcode: u8) -> Encoding {
        Encoding {
            operand_count: opcode >> 6,
            sets_pc: (opcode >> 4) & 1 == 1,
        }
    }

    /// Total length of the instruction in bytes.
    pub fn length(&self) -> u8 {
        self.operand_count + 1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    /// Register 7 doubles as the stack pointer.
    pub const SP: Register = Register::R7;

    pub fn from_byte(byte: u8) -> Option<Register> {
        match byte {
            0 => Some(Register::R0),
            1 => Some(Register::R1),
            2 => Some(Register::R2),
            3 => Some(Register::R3),
            4 => Some(Register::R4),
            5 => Some(Register::R5),
            6 => Some(Register::R6),
            7 => Some(Register::R7),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Register::R0 => 0,
            Register::R1 => 1,
            Register::R2 => 2,
            Register::R3 => 3,
            Register::R4 => 4,
            Register::R5 => 5,
            Register::R6 => 6,
            Register::R7 => 7,
        }
    }
}

impl FromStr for Register {
    type Err = ();

    /// Parses `R0`-`R7` or `SP`, ignoring case.
    fn from_str(input: &str) -> Result<Register, ()> {
        if input.eq_ignore_ascii_case("SP") {
            return Ok(Register::SP);
        }

        match input.as_bytes() {
            [b'R', digit] | [b'r', digit] => Register::from_byte(digit.wrapping_sub(b'0')).ok_or(()),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// A decoded instruction with its raw operand bytes.
///
/// Operand bytes beyond the operand count of the opcode are kept as they were read from memory
/// but are not part of the instruction's encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operands: [u8; 2],
}

impl Instruction {
    pub fn new(opcode: OpCode, operands: [u8; 2]) -> Instruction {
        Instruction { opcode, operands }
    }

    /// The encoded bytes of the instruction: the opcode followed by its operands.
    pub fn to_bytes(&self) -> Vec<u8> {
        let count = self.opcode.encoding().operand_count as usize;

        std::iter::once(self.opcode.as_byte())
            .chain(self.operands.iter().copied().take(count))
            .collect()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.opcode)?;

        let kinds = self.opcode.operands();

        for (i, (kind, value)) in kinds.iter().zip(self.operands.iter()).enumerate() {
            let sep = if i == 0 { " " } else { ", " };

            match (kind, Register::from_byte(*value)) {
                (OperandKind::Register, Some(reg)) => write!(f, "{}{}", sep, reg)?,
                (OperandKind::Register, None) => write!(f, "{}R?{}", sep, value)?,
                (OperandKind::Immediate, _) => write!(f, "{}{}", sep, value)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table_is_complete() {
        assert_eq!(OpCode::ALL.len(), 34);

        for op in OpCode::ALL.iter() {
            assert_eq!(OpCode::from_byte(op.as_byte()), Some(*op), "{}", op);
        }

        let known = (0..=255u8).filter_map(OpCode::from_byte).count();
        assert_eq!(known, 34);
    }

    #[test]
    fn test_operand_count_matches_operand_kinds() {
        for op in OpCode::ALL.iter() {
            let encoding = op.encoding();
            assert_eq!(encoding.operand_count as usize, op.operands().len(), "{}", op);
            assert_eq!(encoding.length(), encoding.operand_count + 1);
        }
    }

    #[test]
    fn test_documented_operand_counts() {
        let cases = [
            ("HLT", 0), ("NOP", 0), ("RET", 0), ("IRET", 0),
            ("PRN", 1), ("PRA", 1), ("PUSH", 1), ("POP", 1), ("CALL", 1), ("INT", 1),
            ("JMP", 1), ("JEQ", 1), ("JNE", 1), ("INC", 1), ("DEC", 1), ("NOT", 1),
            ("LDI", 2), ("LD", 2), ("ST", 2), ("ADD", 2), ("CMP", 2), ("SHR", 2),
        ];

        for (mnemonic, count) in cases.iter() {
            let op = OpCode::from_mnemonic(mnemonic).expect("unknown mnemonic");
            assert_eq!(op.encoding().operand_count, *count, "{}", mnemonic);
        }
    }

    #[test]
    fn test_only_control_flow_sets_pc() {
        for op in OpCode::ALL.iter() {
            let expected = match op {
                OpCode::Jump(_)
                | OpCode::Call
                | OpCode::Return
                | OpCode::Interrupt
                | OpCode::InterruptReturn => true,
                _ => false,
            };

            assert_eq!(op.encoding().sets_pc, expected, "{}", op);
        }
    }

    #[test]
    fn test_decode_undefined_bytes() {
        assert_eq!(Encoding::decode(0xFF), Encoding { operand_count: 3, sets_pc: true });
        assert_eq!(Encoding::decode(0b0110_0000), Encoding { operand_count: 1, sets_pc: false });
        assert_eq!(OpCode::from_byte(0xFF), None);
    }

    #[test]
    fn test_mnemonic_lookup_ignores_case() {
        assert_eq!(OpCode::from_mnemonic("ldi"), Some(OpCode::LoadImmediate));
        assert_eq!(OpCode::from_mnemonic("Jge"), Some(OpCode::Jump(JumpCondition::GreaterOrEqual)));
        assert_eq!(OpCode::from_mnemonic("LDX"), None);
    }

    #[test]
    fn test_register_from_str() {
        assert_eq!("R0".parse::<Register>(), Ok(Register::R0));
        assert_eq!("r6".parse::<Register>(), Ok(Register::R6));
        assert_eq!("sp".parse::<Register>(), Ok(Register::R7));
        assert_eq!("R8".parse::<Register>(), Err(()));
        assert_eq!("R".parse::<Register>(), Err(()));
    }

    #[test]
    fn test_instruction_display_and_bytes() {
        let ldi = Instruction::new(OpCode::LoadImmediate, [0, 8]);
        assert_eq!(ldi.to_string(), "LDI R0, 8");
        assert_eq!(ldi.to_bytes(), vec![0b1000_0010, 0, 8]);

        let prn = Instruction::new(OpCode::PrintNumber, [1, 0xAA]);
        assert_eq!(prn.to_string(), "PRN R1");
        assert_eq!(prn.to_bytes(), vec![0b0100_0111, 1]);

        let hlt = Instruction::new(OpCode::Halt, [0, 0]);
        assert_eq!(hlt.to_string(), "HLT");
        assert_eq!(hlt.to_bytes(), vec![1]);

        let bad = Instruction::new(OpCode::Push, [9, 0]);
        assert_eq!(bad.to_string(), "PUSH R?9");
    }
}
