//! Content stream tokenizer.
//!
//! Content streams use postfix notation: operands come before the operator
//! they belong to. This tokenizer groups the stream into operations without
//! interpreting operators, keeping every atomic operand exactly as written.
//!
//! Inline images (`BI <dict> ID <data> EI`) are special: the bytes between
//! `ID` and `EI` are binary image data and are never tokenized.

use crate::error::{Error, Result};
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::char;
use nom::combinator::recognize;
use nom::sequence::{delimited, preceded};
use nom::IResult;

/// Maximum array/dictionary nesting inside one operand.
const MAX_NESTING: usize = 100;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'a> {
    /// Number, name, string, boolean or null, exactly as written
    Atom(&'a [u8]),
    /// Array operand
    Array(Vec<Operand<'a>>),
    /// Dictionary operand, keys and values alternating
    Dictionary(Vec<Operand<'a>>),
}

/// One unit of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<'a> {
    /// An operator with the operands preceding it
    Operation {
        /// Operands in stream order
        operands: Vec<Operand<'a>>,
        /// Operator keyword
        operator: &'a [u8],
    },
    /// An inline image
    InlineImage {
        /// Image dictionary entries, keys and values alternating
        dict: Vec<Operand<'a>>,
        /// Raw image data between `ID` and `EI`
        data: &'a [u8],
    },
    /// Operands at the end of the stream with no operator after them
    Trailing(Vec<Operand<'a>>),
}

/// Check if a byte is PDF whitespace.
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, 0x00 | b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

/// Check if a byte is a PDF delimiter.
fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(byte: u8) -> bool {
    !is_whitespace(byte) && !is_delimiter(byte)
}

/// Regular tokens that are operands rather than operators.
fn is_operand_keyword(token: &[u8]) -> bool {
    matches!(token, b"true" | b"false" | b"null")
        || (token.iter().any(u8::is_ascii_digit)
            && token.iter().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.')))
}

/// Skip whitespace and comments (% to end of line).
fn skip_filler(mut input: &[u8]) -> &[u8] {
    loop {
        let start = input.iter().position(|&b| !is_whitespace(b)).unwrap_or(input.len());
        input = &input[start..];
        if input.first() != Some(&b'%') {
            return input;
        }
        let end = input
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(input.len());
        input = &input[end..];
    }
}

fn regular_token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_regular)(input)
}

fn name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(preceded(char('/'), take_while(is_regular)))(input)
}

fn hex_string(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(delimited(char('<'), take_while(|b: u8| b != b'>'), char('>')))(input)
}

/// Literal string with balanced parentheses and backslash escapes.
fn literal_string(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (_, _) = char('(')(input)?;
    let mut depth = 0usize;
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[..i + 1]));
                }
            },
            _ => {},
        }
        i += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

fn tokenize_error(data: &[u8], at: &[u8], reason: impl Into<String>) -> Error {
    Error::ParseError {
        offset: data.len() - at.len(),
        reason: reason.into(),
    }
}

struct Tokenizer<'a> {
    data: &'a [u8],
}

impl<'a> Tokenizer<'a> {
    /// Parse a single operand starting at a non-filler byte.
    fn operand(&self, input: &'a [u8], depth: usize) -> Result<(&'a [u8], Operand<'a>)> {
        if depth > MAX_NESTING {
            return Err(tokenize_error(self.data, input, "operand nesting too deep"));
        }

        let parsed = match input.first() {
            Some(b'/') => name(input).map(|(rest, atom)| (rest, Operand::Atom(atom))),
            Some(b'(') => literal_string(input).map(|(rest, atom)| (rest, Operand::Atom(atom))),
            Some(b'[') => {
                return self
                    .collection(&input[1..], b"]", depth)
                    .map(|(rest, items)| (rest, Operand::Array(items)));
            },
            Some(b'<') if input.starts_with(b"<<") => {
                return self
                    .collection(&input[2..], b">>", depth)
                    .map(|(rest, items)| (rest, Operand::Dictionary(items)));
            },
            Some(b'<') => hex_string(input).map(|(rest, atom)| (rest, Operand::Atom(atom))),
            Some(&b) if is_regular(b) => {
                regular_token(input).map(|(rest, atom)| (rest, Operand::Atom(atom)))
            },
            _ => return Err(tokenize_error(self.data, input, "unexpected delimiter")),
        };

        parsed.map_err(|_| tokenize_error(self.data, input, "unterminated operand"))
    }

    /// Operands up to the closing delimiter of an array or dictionary.
    fn collection(
        &self,
        mut input: &'a [u8],
        close: &'static [u8],
        depth: usize,
    ) -> Result<(&'a [u8], Vec<Operand<'a>>)> {
        let mut items = Vec::new();
        loop {
            input = skip_filler(input);
            if input.is_empty() {
                return Err(tokenize_error(self.data, input, "unterminated array or dictionary"));
            }
            if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&[u8]>>(close)(input) {
                return Ok((rest, items));
            }
            let (rest, item) = self.operand(input, depth + 1)?;
            items.push(item);
            input = rest;
        }
    }

    /// Inline image after the `BI` operator.
    fn inline_image(&self, mut input: &'a [u8]) -> Result<(&'a [u8], Instruction<'a>)> {
        let mut dict = Vec::new();
        loop {
            input = skip_filler(input);
            if input.is_empty() {
                return Err(tokenize_error(self.data, input, "inline image without ID"));
            }
            if let Ok((rest, b"ID")) = regular_token(input) {
                input = rest;
                break;
            }
            let (rest, item) = self.operand(input, 0)?;
            dict.push(item);
            input = rest;
        }

        // One whitespace byte separates ID from the data
        if input.first().copied().is_some_and(is_whitespace) {
            input = &input[1..];
        }

        let end = (0..input.len().saturating_sub(1))
            .find(|&i| {
                &input[i..i + 2] == b"EI"
                    && input.get(i + 2).map_or(true, |&b| is_whitespace(b))
            })
            .ok_or_else(|| tokenize_error(self.data, input, "inline image without EI"))?;

        Ok((&input[end + 2..], Instruction::InlineImage { dict, data: &input[..end] }))
    }

    fn run(&self) -> Result<Vec<Instruction<'a>>> {
        let mut instructions = Vec::new();
        let mut operands = Vec::new();
        let mut input = self.data;

        loop {
            input = skip_filler(input);
            let Some(&first) = input.first() else {
                break;
            };

            if is_regular(first) {
                let (rest, token) = regular_token(input)
                    .map_err(|_| tokenize_error(self.data, input, "invalid token"))?;
                input = rest;

                if is_operand_keyword(token) {
                    operands.push(Operand::Atom(token));
                } else if token == b"BI" {
                    if !operands.is_empty() {
                        instructions.push(Instruction::Trailing(std::mem::take(&mut operands)));
                    }
                    let (rest, image) = self.inline_image(input)?;
                    instructions.push(image);
                    input = rest;
                } else {
                    instructions.push(Instruction::Operation {
                        operands: std::mem::take(&mut operands),
                        operator: token,
                    });
                }
            } else {
                let (rest, operand) = self.operand(input, 0)?;
                operands.push(operand);
                input = rest;
            }
        }

        if !operands.is_empty() {
            instructions.push(Instruction::Trailing(operands));
        }
        Ok(instructions)
    }
}

/// Split a decoded content stream into instructions.
///
/// # Errors
///
/// [`Error::ParseError`] for unterminated strings, arrays, dictionaries or
/// inline images, and for stray closing delimiters.
pub fn tokenize(data: &[u8]) -> Result<Vec<Instruction<'_>>> {
    Tokenizer { data }.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_with_operands() {
        let ops = tokenize(b"10 10 m").unwrap();
        assert_eq!(
            ops,
            vec![Instruction::Operation {
                operands: vec![Operand::Atom(b"10"), Operand::Atom(b"10")],
                operator: b"m",
            }]
        );
    }

    #[test]
    fn test_strings_names_and_arrays() {
        let ops = tokenize(b"/F1 12 Tf [(A\\) b) -20 <4142>] TJ").unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[1] {
            Instruction::Operation { operands, operator } => {
                assert_eq!(*operator, b"TJ");
                assert_eq!(
                    operands[0],
                    Operand::Array(vec![
                        Operand::Atom(b"(A\\) b)"),
                        Operand::Atom(b"-20"),
                        Operand::Atom(b"<4142>"),
                    ])
                );
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_parentheses() {
        let ops = tokenize(b"(a (b) c) Tj").unwrap();
        assert_eq!(
            ops[0],
            Instruction::Operation {
                operands: vec![Operand::Atom(b"(a (b) c)")],
                operator: b"Tj",
            }
        );
    }

    #[test]
    fn test_dictionary_operand() {
        let ops = tokenize(b"/OC << /MCID 3 >> BDC").unwrap();
        match &ops[0] {
            Instruction::Operation { operands, .. } => {
                assert_eq!(
                    operands[1],
                    Operand::Dictionary(vec![Operand::Atom(b"/MCID"), Operand::Atom(b"3")])
                );
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        let ops = tokenize(b"q % save\nQ").unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_inline_image_data_untouched() {
        let ops = tokenize(b"BI /W 2 /H 1 ID \x00EI\xffEI Q").unwrap();
        assert_eq!(
            ops[0],
            Instruction::InlineImage {
                dict: vec![
                    Operand::Atom(b"/W"),
                    Operand::Atom(b"2"),
                    Operand::Atom(b"/H"),
                    Operand::Atom(b"1"),
                ],
                data: b"\x00EI\xff",
            }
        );
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_trailing_operands() {
        let ops = tokenize(b"q 1 2").unwrap();
        assert_eq!(ops[1], Instruction::Trailing(vec![Operand::Atom(b"1"), Operand::Atom(b"2")]));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(tokenize(b"(open Tj"), Err(Error::ParseError { .. })));
        assert!(tokenize(b"[1 2").is_err());
        assert!(tokenize(b"] q").is_err());
        assert!(tokenize(b"BI /W 1 ID data").is_err());
    }
}
