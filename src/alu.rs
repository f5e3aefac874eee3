//! The arithmetic/logic unit.
//!
//! All operations are pure functions on register values. Results wrap to eight bits the same way
//! the hardware registers do.

use std::cmp::Ordering;
use std::fmt;

/// Operations performed by the ALU.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    Xor,
    Not,
    ShiftLeft,
    ShiftRight,
    Increment,
    Decrement,
}

impl AluOp {
    /// True if the operation only reads its first operand.
    pub fn is_unary(&self) -> bool {
        match self {
            AluOp::Not | AluOp::Increment | AluOp::Decrement => true,
            _ => false,
        }
    }
}

/// The only fault the ALU can raise. Produced by `DIV` and `MOD` with a zero divisor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DivisionByZero;

impl fmt::Display for DivisionByZero {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "division by zero")
    }
}

/// Computes the new value of the destination register.
///
/// # Parameters
/// - `op`: The operation to perform.
/// - `a`: The value of the destination register.
/// - `b`: The value of the source register. Ignored by unary operations.
///
/// # Errors
/// Returns [DivisionByZero] if `op` is a division or modulo and `b` is zero.
pub fn execute(op: AluOp, a: u8, b: u8) -> Result<u8, DivisionByZero> {
    let result = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Subtract => a.wrapping_sub(b),
        AluOp::Multiply => a.wrapping_mul(b),
        AluOp::Divide => a.checked_div(b).ok_or(DivisionByZero)?,
        AluOp::Modulo => a.checked_rem(b).ok_or(DivisionByZero)?,

        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Not => !a,

        // Shifting an eight bit value by eight or more clears it.
        AluOp::ShiftLeft => a.checked_shl(b as u32).unwrap_or(0),
        AluOp::ShiftRight => a.checked_shr(b as u32).unwrap_or(0),

        AluOp::Increment => a.wrapping_add(1),
        AluOp::Decrement => a.wrapping_sub(1),
    };

    Ok(result)
}

/// Compares two register values as unsigned bytes.
pub fn compare(a: u8, b: u8) -> Ordering {
    a.cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(execute(AluOp::Add, 8, 9), Ok(17));
        assert_eq!(execute(AluOp::Subtract, 9, 8), Ok(1));
        assert_eq!(execute(AluOp::Multiply, 8, 9), Ok(72));
        assert_eq!(execute(AluOp::Divide, 72, 8), Ok(9));
        assert_eq!(execute(AluOp::Divide, 7, 2), Ok(3));
        assert_eq!(execute(AluOp::Modulo, 17, 5), Ok(2));
        assert_eq!(execute(AluOp::Increment, 41, 0), Ok(42));
        assert_eq!(execute(AluOp::Decrement, 43, 0), Ok(42));
    }

    #[test]
    fn test_wraparound() {
        assert_eq!(execute(AluOp::Add, 255, 1), Ok(0));
        assert_eq!(execute(AluOp::Add, 200, 100), Ok(44));
        assert_eq!(execute(AluOp::Subtract, 0, 1), Ok(255));
        assert_eq!(execute(AluOp::Multiply, 16, 16), Ok(0));
        assert_eq!(execute(AluOp::Multiply, 20, 13), Ok(4));
        assert_eq!(execute(AluOp::Increment, 255, 0), Ok(0));
        assert_eq!(execute(AluOp::Decrement, 0, 0), Ok(255));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(execute(AluOp::And, 0b1100_1010, 0b1010_1010), Ok(0b1000_1010));
        assert_eq!(execute(AluOp::Or, 0b1100_0000, 0b0000_0011), Ok(0b1100_0011));
        assert_eq!(execute(AluOp::Xor, 0b1111_0000, 0b1010_1010), Ok(0b0101_1010));
        assert_eq!(execute(AluOp::Not, 0b1111_0000, 0), Ok(0b0000_1111));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(execute(AluOp::ShiftLeft, 0b0000_0011, 2), Ok(0b0000_1100));
        assert_eq!(execute(AluOp::ShiftLeft, 0b1000_0001, 1), Ok(0b0000_0010));
        assert_eq!(execute(AluOp::ShiftRight, 0b1000_0000, 7), Ok(1));
        assert_eq!(execute(AluOp::ShiftLeft, 0xFF, 8), Ok(0));
        assert_eq!(execute(AluOp::ShiftRight, 0xFF, 200), Ok(0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(execute(AluOp::Divide, 10, 0), Err(DivisionByZero));
        assert_eq!(execute(AluOp::Modulo, 10, 0), Err(DivisionByZero));
        assert_eq!(DivisionByZero.to_string(), "division by zero");
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(1, 2), Ordering::Less);
        assert_eq!(compare(2, 2), Ordering::Equal);
        assert_eq!(compare(255, 0), Ordering::Greater);
    }
}
