use std::fmt;
use std::result::Result as StdResult;

use nom::{
    IResult,
    bytes::complete::take_while,
    character::complete::char,
    combinator::{all_consuming, opt, rest},
    error::context,
    sequence::{delimited, preceded, terminated},
};

use crate::emulator::MEMORY_SIZE;
use super::program::Program;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The binary number on the line has more than eight significant bits.
    WordOutOfRange,

    /// The program has more words than there are memory cells.
    ProgramTooLarge,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::WordOutOfRange => write!(f, "word does not fit into 8 bits"),
            ErrorKind::ProgramTooLarge => {
                write!(f, "program does not fit into {} bytes of memory", MEMORY_SIZE)
            }
        }
    }
}

pub type ParseError = crate::error::VerboseParseError<ErrorKind>;
type LineError = crate::error::ParseError<ErrorKind>;
type Result<'a, T> = IResult<&'a str, T, LineError>;

const SPACE_CHARACTERS: &'static str = " \t\r";

fn sp(input: &str) -> Result<&str> {
    take_while(|c| SPACE_CHARACTERS.contains(c))(input)
}

fn is_binary_digit(c: char) -> bool {
    c.is_digit(2)
}

fn comment(input: &str) -> Result<&str> {
    preceded(char('#'), rest)(input)
}

/// Takes an optional binary word. A word that does not fit into a byte is a hard error.
fn take_word(input: &str) -> Result<Option<u8>> {
    let (remaining, digits) = take_while::<_, _, LineError>(is_binary_digit)(input)?;

    if digits.is_empty() {
        return Ok((remaining, None));
    }

    match u8::from_str_radix(digits, 2) {
        Ok(word) => Ok((remaining, Some(word))),
        Err(_) => Err(nom::Err::Failure(LineError::from_kind(input, ErrorKind::WordOutOfRange))),
    }
}

fn parse_line(input: &str) -> Result<Option<u8>> {
    context(
        "program line",
        all_consuming(terminated(delimited(sp, take_word, sp), opt(comment))),
    )(input)
}

pub(crate) fn parse_program_file(input: &str) -> StdResult<Program, ParseError> {
    let mut words = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let word = match parse_line(line) {
            Ok((_, word)) => word,
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
                return Err(at_line(err.verbose(line), index));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(at_line(LineError::incomplete().verbose(line), index));
            }
        };

        if let Some(word) = word {
            if words.len() == MEMORY_SIZE {
                let err = LineError::from_kind(line, ErrorKind::ProgramTooLarge);
                return Err(at_line(err.verbose(line), index));
            }

            words.push(word);
        }
    }

    Ok(Program::from_words_unchecked(words))
}

fn at_line(mut err: ParseError, index: usize) -> ParseError {
    err.line = index + 1;
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("10000010").unwrap().1, Some(0b1000_0010));
        assert_eq!(parse_line("  00000001  # HLT").unwrap().1, Some(1));
        assert_eq!(parse_line("0\t#").unwrap().1, Some(0));
        assert_eq!(parse_line("# only a comment").unwrap().1, None);
        assert_eq!(parse_line("   ").unwrap().1, None);
        assert_eq!(parse_line("").unwrap().1, None);
        assert_eq!(parse_line("101\r").unwrap().1, Some(5));
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line("10000012").is_err());
        assert!(parse_line("1000 0010").is_err());
        assert!(parse_line("LDI").is_err());
    }

    #[test]
    fn test_word_out_of_range() {
        let err = parse_program_file("00000001\n\n100000000 # nine bits\n").unwrap_err();

        assert_eq!(err.line, 3);
        assert_eq!(err.column, 1);
        assert_eq!(err.kind(), Some(&ErrorKind::WordOutOfRange));
    }

    #[test]
    fn test_error_location() {
        let err = parse_program_file("# header\n  1010x010\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.column, 7);
        assert_eq!(err.kind(), None);
        assert_eq!(err.to_string(), "at line 2 col 7: unexpected input, at 'x010'");
    }

    #[test]
    fn test_program_too_large() {
        let source = "00000000\n".repeat(MEMORY_SIZE);
        assert_eq!(parse_program_file(&source).unwrap().words().len(), MEMORY_SIZE);

        let source = format!("{}# one more\n00000001\n", source);
        let err = parse_program_file(&source).unwrap_err();

        assert_eq!(err.line, MEMORY_SIZE + 2);
        assert_eq!(err.kind(), Some(&ErrorKind::ProgramTooLarge));
    }
}
